//! N-up front end: frozen options, layout choice, spec construction, and
//! the rearrangement run.

use std::io::{Read, Seek, Write};

use crate::common::error::{Error, Result};
use crate::dsc::InputIndex;
use crate::io::LineReader;
use crate::layout::{LayoutRequest, choose_layout};
use crate::pagespec::{Traversal, build_nup_specs};
use crate::pstops::{Rearranger, Stats};

/// Run configuration, frozen before any I/O begins.
#[derive(Debug, Clone)]
pub struct Options {
    /// Pages per sheet.
    pub nup: u32,
    /// Output sheet size; defaults to the input size, then to the system
    /// paper (resolved by the caller).
    pub width: Option<f64>,
    pub height: Option<f64>,
    /// Input page size; defaults to the output size.
    pub iwidth: Option<f64>,
    pub iheight: Option<f64>,
    /// Margin around the whole sheet.
    pub margin: f64,
    /// Border around each placed page.
    pub border: f64,
    /// Stroke width for drawn page borders; 0 draws nothing.
    pub draw: f64,
    /// User scale override; zero or negative values are ignored.
    pub scale: Option<f64>,
    /// Layout waste tolerance.
    pub tolerance: f64,
    pub column: bool,
    pub leftright: bool,
    pub topbottom: bool,
    pub flip: bool,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            nup: 1,
            width: None,
            height: None,
            iwidth: None,
            iheight: None,
            margin: 0.0,
            border: 0.0,
            draw: 0.0,
            scale: None,
            tolerance: 100_000.0,
            column: false,
            leftright: true,
            topbottom: true,
            flip: false,
        }
    }
}

/// Impose `input` onto `output` according to `opts`.
pub fn run<R: Read + Seek, W: Write>(opts: &Options, input: R, output: W) -> Result<Stats> {
    if opts.nup < 1 {
        return Err(Error::BadNup);
    }
    let width = opts.width.or(opts.iwidth).ok_or(Error::PaperSizeNotSet)?;
    let height = opts.height.or(opts.iheight).ok_or(Error::PaperSizeNotSet)?;
    let ppwid = width - opts.margin * 2.0;
    let pphgt = height - opts.margin * 2.0;
    if ppwid <= 0.0 || pphgt <= 0.0 {
        return Err(Error::MarginsTooLarge);
    }
    let iwidth = opts.iwidth.unwrap_or(width);
    let iheight = opts.iheight.unwrap_or(height);

    let mut reader = LineReader::new(input)?;
    let index = InputIndex::scan(&mut reader)?;

    let layout = choose_layout(&LayoutRequest {
        nup: opts.nup,
        ppwid,
        pphgt,
        iwidth,
        iheight,
        border: opts.border,
        tolerance: opts.tolerance,
        flip: opts.flip,
    })?;

    // flip swaps the clipping dims; a rotated grid reorders the traversal
    let clip = if opts.flip {
        (height, width)
    } else {
        (width, height)
    };
    let mut traversal = Traversal {
        column: opts.column,
        leftright: opts.leftright,
        topbottom: opts.topbottom,
    };
    if layout.rotate {
        let tmp = traversal.topbottom;
        traversal.topbottom = !traversal.leftright;
        traversal.leftright = tmp;
        traversal.column = !traversal.column;
    }

    let specs = build_nup_specs(
        opts.nup,
        &layout,
        traversal,
        opts.margin,
        ppwid,
        pphgt,
        opts.scale,
    );

    let mut rearranger = Rearranger::new(&mut reader, output, &index, Some(clip));
    rearranger.rearrange(opts.nup, 1, false, &specs, opts.draw, index.size_headers())?;
    rearranger.finish()
}
