//! Paper name lookup.
//!
//! A built-in table of paper sizes in PostScript points, plus lazy
//! resolution of the system default paper name (`PAPERSIZE` environment
//! variable, then `/etc/papersize`, then `a4`).

use once_cell::sync::Lazy;
use phf::phf_map;

/// A sheet size in PostScript points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaperSize {
    pub width: f64,
    pub height: f64,
}

/// Known paper sizes, keyed by lowercase name.
static PAPER_SIZES: phf::Map<&'static str, (f64, f64)> = phf_map! {
    "letter" => (612.0, 792.0),
    "note" => (540.0, 720.0),
    "legal" => (612.0, 1008.0),
    "executive" => (522.0, 756.0),
    "halfletter" => (396.0, 612.0),
    "halfexecutive" => (378.0, 522.0),
    "11x17" => (792.0, 1224.0),
    "statement" => (396.0, 612.0),
    "folio" => (612.0, 936.0),
    "quarto" => (610.0, 780.0),
    "10x14" => (720.0, 1008.0),
    "ledger" => (1224.0, 792.0),
    "tabloid" => (792.0, 1224.0),
    "a0" => (2384.0, 3370.0),
    "a1" => (1684.0, 2384.0),
    "a2" => (1191.0, 1684.0),
    "a3" => (842.0, 1191.0),
    "a4" => (595.0, 842.0),
    "a5" => (420.0, 595.0),
    "a6" => (297.0, 420.0),
    "a7" => (210.0, 297.0),
    "a8" => (148.0, 210.0),
    "a9" => (105.0, 148.0),
    "a10" => (73.0, 105.0),
    "b0" => (2920.0, 4127.0),
    "b1" => (2064.0, 2920.0),
    "b2" => (1460.0, 2064.0),
    "b3" => (1032.0, 1460.0),
    "b4" => (729.0, 1032.0),
    "b5" => (516.0, 729.0),
    "c5" => (459.0, 649.0),
    "dl" => (312.0, 624.0),
    "comm10" => (297.0, 684.0),
    "monarch" => (279.0, 540.0),
    "archa" => (648.0, 864.0),
    "archb" => (864.0, 1296.0),
    "archc" => (1296.0, 1728.0),
    "archd" => (1728.0, 2592.0),
    "arche" => (2592.0, 3456.0),
    "flsa" => (612.0, 936.0),
    "flse" => (612.0, 936.0),
    "csheet" => (1224.0, 1584.0),
    "dsheet" => (1584.0, 2448.0),
    "esheet" => (2448.0, 3168.0),
};

/// Look up a paper name, case-insensitively.
pub fn paper_size(name: &str) -> Option<PaperSize> {
    let (width, height) = PAPER_SIZES.get(name.to_ascii_lowercase().as_str())?;
    Some(PaperSize {
        width: *width,
        height: *height,
    })
}

static SYSTEM_PAPER: Lazy<String> = Lazy::new(|| {
    if let Ok(name) = std::env::var("PAPERSIZE") {
        let name = name.trim();
        if !name.is_empty() {
            return name.to_string();
        }
    }
    if let Ok(contents) = std::fs::read_to_string("/etc/papersize") {
        for line in contents.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Some(word) = line.split_whitespace().next() {
                return word.to_string();
            }
        }
    }
    "a4".to_string()
});

/// The system default paper name, resolved once per process.
pub fn system_paper_name() -> &'static str {
    &SYSTEM_PAPER
}

/// The system default paper size, when the name is known to the table.
pub fn system_paper_size() -> Option<PaperSize> {
    paper_size(system_paper_name())
}
