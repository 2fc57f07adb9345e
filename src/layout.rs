//! Grid selection for N-up imposition.
//!
//! Finding the best grid is a small optimisation problem: try every
//! divisor pair of the page count in both normal and rotated orientation
//! and keep the one wasting the least sheet area.

use crate::common::error::{Error, Result};

/// Inputs to the grid search.
#[derive(Debug, Clone, Copy)]
pub struct LayoutRequest {
    pub nup: u32,
    /// Usable sheet area: output size minus margins.
    pub ppwid: f64,
    pub pphgt: f64,
    /// Input page size.
    pub iwidth: f64,
    pub iheight: f64,
    /// Border around each placed page, subtracted before scaling.
    pub border: f64,
    /// Upper bound on acceptable waste.
    pub tolerance: f64,
    pub flip: bool,
}

/// A chosen grid: cell counts, rotation, per-cell scale and centring shifts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Layout {
    pub horiz: u32,
    pub vert: u32,
    pub rotate: bool,
    pub scale: f64,
    pub hshift: f64,
    pub vshift: f64,
}

/// Next larger exact divisor of `m` after `n`, or `None`. The numbers
/// involved are small, so trial division is plenty.
fn next_divisor(n: u32, m: u32) -> Option<u32> {
    (n + 1..=m).find(|d| m % d == 0)
}

/// Pick the grid that wastes the least sheet area, or fail when nothing
/// beats the tolerance.
pub fn choose_layout(req: &LayoutRequest) -> Result<Layout> {
    let LayoutRequest {
        ppwid,
        pphgt,
        iwidth: iw,
        iheight: ih,
        border,
        ..
    } = *req;
    let mut best = req.tolerance;
    let mut chosen = None;

    let mut divisor = Some(1u32);
    while let Some(h) = divisor {
        let hor = f64::from(h);
        let v = req.nup / h;
        let ver = f64::from(v);

        // normal orientation
        let scl = (pphgt / (ih * ver)).min(ppwid / (iw * hor));
        let optim = (ppwid - scl * iw * hor).powi(2) + (pphgt - scl * ih * ver).powi(2);
        if optim < best {
            best = optim;
            // recalculate scale to allow for internal borders
            let scale = ((pphgt - 2.0 * border * ver) / (ih * ver))
                .min((ppwid - 2.0 * border * hor) / (iw * hor));
            chosen = Some(Layout {
                horiz: h,
                vert: v,
                rotate: req.flip,
                scale,
                hshift: (ppwid / hor - iw * scale) / 2.0,
                vshift: (pphgt / ver - ih * scale) / 2.0,
            });
        }

        // rotated orientation: input dims swapped against the grid
        let scl = (pphgt / (iw * hor)).min(ppwid / (ih * ver));
        let optim = (pphgt - scl * iw * hor).powi(2) + (ppwid - scl * ih * ver).powi(2);
        if optim < best {
            best = optim;
            let scale = ((pphgt - 2.0 * border * hor) / (iw * hor))
                .min((ppwid - 2.0 * border * ver) / (ih * ver));
            chosen = Some(Layout {
                horiz: v,
                vert: h,
                rotate: !req.flip,
                scale,
                hshift: (ppwid / ver - ih * scale) / 2.0,
                vshift: (pphgt / hor - iw * scale) / 2.0,
            });
        }

        divisor = next_divisor(h, req.nup);
    }

    chosen.ok_or(Error::NoLayout(req.nup))
}
