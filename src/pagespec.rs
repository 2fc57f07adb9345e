//! Per-cell placement specifications.

use bitflags::bitflags;

use crate::layout::Layout;

bitflags! {
    /// Transformations and chaining markers for one placement.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct PageFlags: u8 {
        /// More placements follow on the same output sheet.
        const ADD_NEXT = 0x01;
        const ROTATE = 0x02;
        const HFLIP = 0x04;
        const VFLIP = 0x08;
        const SCALE = 0x10;
        const OFFSET = 0x20;
        /// Walk the input pages of each sheet group in reverse.
        const REVERSED = 0x40;
        /// Mask of every flag that touches the transformation matrix.
        const GSAVE = Self::ROTATE.bits()
            | Self::HFLIP.bits()
            | Self::VFLIP.bits()
            | Self::SCALE.bits()
            | Self::OFFSET.bits();
    }
}

/// One input-page placement within an output sheet.
#[derive(Debug, Clone, Copy)]
pub struct PageSpec {
    /// Index within the current sheet group.
    pub pageno: u32,
    pub flags: PageFlags,
    pub xoff: f64,
    pub yoff: f64,
    /// Rotation in degrees.
    pub rotate: i32,
    pub scale: f64,
}

impl Default for PageSpec {
    fn default() -> Self {
        PageSpec {
            pageno: 0,
            flags: PageFlags::empty(),
            xoff: 0.0,
            yoff: 0.0,
            rotate: 0,
            scale: 1.0,
        }
    }
}

/// Order in which the grid cells are filled.
#[derive(Debug, Clone, Copy)]
pub struct Traversal {
    pub column: bool,
    pub leftright: bool,
    pub topbottom: bool,
}

/// Grid cell `(across, up)` receiving the `p`-th page of a sheet group.
fn cell(t: Traversal, horiz: i64, vert: i64, p: i64) -> (i64, i64) {
    if t.column {
        (
            if t.leftright { p / vert } else { horiz - 1 - p / vert },
            if t.topbottom { vert - 1 - p % vert } else { p % vert },
        )
    } else {
        (
            if t.leftright { p % horiz } else { horiz - 1 - p % horiz },
            if t.topbottom { vert - 1 - p / horiz } else { p / horiz },
        )
    }
}

/// Build the `nup` placements of one output sheet in page-index order.
///
/// `uscale` overrides the computed scale when positive, matching the `-s`
/// behavior of ignoring zero or negative overrides.
pub fn build_nup_specs(
    nup: u32,
    layout: &Layout,
    traversal: Traversal,
    margin: f64,
    ppwid: f64,
    pphgt: f64,
    uscale: Option<f64>,
) -> Vec<PageSpec> {
    let horiz = i64::from(layout.horiz);
    let vert = i64::from(layout.vert);
    let scale = match uscale {
        Some(s) if s > 0.0 => s,
        _ => layout.scale,
    };

    let mut specs = Vec::with_capacity(nup as usize);
    for p in 0..i64::from(nup) {
        let (across, up) = cell(traversal, horiz, vert, p);
        let mut spec = PageSpec {
            pageno: p as u32,
            flags: PageFlags::SCALE | PageFlags::OFFSET,
            yoff: margin + up as f64 * pphgt / vert as f64 + layout.vshift,
            scale,
            ..PageSpec::default()
        };
        if layout.rotate {
            spec.xoff = margin + (across + 1) as f64 * ppwid / horiz as f64 - layout.hshift;
            spec.rotate = 90;
            spec.flags |= PageFlags::ROTATE;
        } else {
            spec.xoff = margin + across as f64 * ppwid / horiz as f64 + layout.hshift;
        }
        if p + 1 < i64::from(nup) {
            spec.flags |= PageFlags::ADD_NEXT;
        }
        specs.push(spec);
    }
    specs
}
