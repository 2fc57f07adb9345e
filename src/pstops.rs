//! The `pstops` page rearrangement engine.
//!
//! Streams a rewritten document: header comments, the PStoPS procset, the
//! original prolog and setup, then one output page per group of placement
//! specs, each wrapping a seek-and-copy of an original page body in a
//! save/restore with matrix manipulations, and finally the trailer.

use std::io::{Read, Seek, Write};

use log::info;

use crate::common::error::{Error, Result};
use crate::dsc::{self, InputIndex};
use crate::io::{CountingWriter, LineReader};
use crate::pagespec::{PageFlags, PageSpec};

/// The PStoPS procset, emitted verbatim.
///
/// It wraps `showpage`/`erasepage`/`copypage` behind `PStoPSenablepage`,
/// neutralizes the paper-selection operators, captures the default matrix
/// and clip, and redefines `initmatrix`/`initclip`/`initgraphics` to
/// compose with the imposition transform.
pub const PROLOGUE: &str = r"userdict begin
[/showpage/erasepage/copypage]{dup where{pop dup load
 type/operatortype eq{ /PStoPSenablepage cvx 1 index
 load 1 array astore cvx {} bind /ifelse cvx 4 array
 astore cvx def}{pop}ifelse}{pop}ifelse}forall
 /PStoPSenablepage true def
[/letter/legal/executivepage/a4/a4small/b5/com10envelope%nullify
 /monarchenvelope/c5envelope/dlenvelope/lettersmall/note%paper
 /folio/quarto/a5]{dup where{dup wcheck{exch{}put}%operators
 {pop{}def}ifelse}{pop}ifelse}forall
/setpagedevice {pop}bind 1 index where{dup wcheck{3 1 roll put}
 {pop def}ifelse}{def}ifelse
/PStoPSmatrix matrix currentmatrix def
/PStoPSxform matrix def/PStoPSclip{clippath}def
/defaultmatrix{PStoPSmatrix exch PStoPSxform exch concatmatrix}bind def
/initmatrix{matrix defaultmatrix setmatrix}bind def
/initclip[{matrix currentmatrix PStoPSmatrix setmatrix
 [{currentpoint}stopped{$error/newerror false put{newpath}}
 {/newpath cvx 3 1 roll/moveto cvx 4 array astore cvx}ifelse]
 {[/newpath cvx{/moveto cvx}{/lineto cvx}
 {/curveto cvx}{/closepath cvx}pathforall]cvx exch pop}
 stopped{$error/errorname get/invalidaccess eq{cleartomark
 $error/newerror false put cvx exec}{stop}ifelse}if}bind aload pop
 /initclip dup load dup type dup/operatortype eq{pop exch pop}
 {dup/arraytype eq exch/packedarraytype eq or
  {dup xcheck{exch pop aload pop}{pop cvx}ifelse}
  {pop cvx}ifelse}ifelse
 {newpath PStoPSclip clip newpath exec setmatrix} bind aload pop]cvx def
/initgraphics{initmatrix newpath initclip 1 setlinewidth
 0 setlinecap 0 setlinejoin []0 setdash 0 setgray
 10 setmiterlimit}bind def
end
";

/// Composes the replacement transform with whatever an earlier imposition
/// run left in the matrix, so chained invocations stack.
const XFORM_CHAIN: &str = "userdict/PStoPSxform PStoPSmatrix matrix currentmatrix \
matrix invertmatrix matrix concatmatrix matrix invertmatrix put\n";

/// Totals reported after a run.
#[derive(Debug, Clone, Copy)]
pub struct Stats {
    pub pages: u32,
    pub bytes: u64,
}

/// Emitter context: owns the input cursor, the counted output, and the page
/// counters for one rearrangement run.
pub struct Rearranger<'a, R, W: Write> {
    input: &'a mut LineReader<R>,
    output: CountingWriter<W>,
    index: &'a InputIndex,
    /// Output sheet size for media comments and clipping, when known.
    size: Option<(f64, f64)>,
    outputpage: u32,
    line: Vec<u8>,
}

impl<'a, R: Read + Seek, W: Write> Rearranger<'a, R, W> {
    pub fn new(
        input: &'a mut LineReader<R>,
        output: W,
        index: &'a InputIndex,
        size: Option<(f64, f64)>,
    ) -> Self {
        Rearranger {
            input,
            output: CountingWriter::new(output),
            index,
            size,
            outputpage: 0,
            line: Vec::with_capacity(256),
        }
    }

    /// Flush the output and report totals.
    pub fn finish(mut self) -> Result<Stats> {
        self.output.flush()?;
        Ok(Stats {
            pages: self.outputpage,
            bytes: self.output.bytes_written(),
        })
    }

    /// Rearrange all pages: `modulo` input pages are consumed per sheet
    /// group, `specs` places each of them, and short trailing groups are
    /// padded with blank pages. `pps` scales the `%%Pages:` rewrite for
    /// multi-sheet groups; `ignores` lists header lines to drop.
    pub fn rearrange(
        &mut self,
        modulo: u32,
        pps: u32,
        nobind: bool,
        specs: &[PageSpec],
        draw: f64,
        ignores: &[u64],
    ) -> Result<()> {
        let pages = self.index.pages() as u32;
        let maxpage = pages.div_ceil(modulo) * modulo;

        self.write_header((maxpage / modulo) * pps, ignores)?;
        self.write_procset(nobind)?;
        if self.write_part_prolog()? {
            self.write_str(XFORM_CHAIN)?;
        }
        self.write_setup()?;

        let mut pageindex = 0;
        let mut label = String::new();
        for thispg in (0..maxpage).step_by(modulo as usize) {
            let mut add_last = false;
            for (at, ps) in specs.iter().enumerate() {
                let page_of = |spec: &PageSpec| {
                    if spec.flags.contains(PageFlags::REVERSED) {
                        maxpage - thispg - modulo + spec.pageno
                    } else {
                        thispg + spec.pageno
                    }
                };
                let actualpg = page_of(ps);
                if actualpg < pages {
                    self.seek_page(actualpg as usize)?;
                }
                if !add_last {
                    // the output page label lists the original pages
                    label.clear();
                    label.push('(');
                    for (i, np) in specs[at..].iter().enumerate() {
                        if i > 0 {
                            label.push(',');
                        }
                        label.push_str(&page_of(np).to_string());
                        if !np.flags.contains(PageFlags::ADD_NEXT) {
                            break;
                        }
                    }
                    label.push(')');
                    pageindex += 1;
                    self.write_page_header(&label, pageindex)?;
                }
                self.write_str("userdict/PStoPSsaved save put\n")?;
                if ps.flags.intersects(PageFlags::GSAVE) {
                    self.write_transform(ps, draw)?;
                }
                add_last = ps.flags.contains(PageFlags::ADD_NEXT);
                if add_last {
                    self.write_str("/PStoPSenablepage false def\n")?;
                }
                if actualpg < pages {
                    self.write_page_setup()?;
                    self.write_str("PStoPSxform concat\n")?;
                    let upto = self.index.page_offsets()[actualpg as usize + 1];
                    self.copy_plain(upto, "page body")?;
                } else {
                    self.write_str("PStoPSxform concat\nshowpage\n")?;
                }
                self.write_str("PStoPSsaved restore\n")?;
            }
        }
        self.write_trailer()
    }

    fn write_str(&mut self, s: &str) -> Result<()> {
        self.output.write_all(s.as_bytes())?;
        Ok(())
    }

    /// Copy from the cursor up to `upto`, failing on early EOF.
    fn copy_plain(&mut self, upto: u64, section: &'static str) -> Result<()> {
        while self.input.position() < upto {
            let left = (upto - self.input.position()) as usize;
            let chunk = self.input.fill()?;
            if chunk.is_empty() {
                return Err(Error::Truncated(section));
            }
            let n = chunk.len().min(left);
            self.output.write_all(&chunk[..n])?;
            self.input.consume(n);
        }
        Ok(())
    }

    /// Copy from the cursor up to `upto`, dropping the whole line at each
    /// offset of `ignores` (sorted ascending) that falls inside the range.
    fn copy_range(&mut self, upto: u64, ignores: &[u64], section: &'static str) -> Result<()> {
        let mut rest = ignores;
        loop {
            let here = self.input.position();
            while let Some((&first, tail)) = rest.split_first() {
                if first < here {
                    rest = tail;
                } else {
                    break;
                }
            }
            match rest.first() {
                Some(&off) if off < upto => {
                    self.copy_plain(off, section)?;
                    if self.input.read_line(&mut self.line)? == 0 {
                        return Err(Error::Truncated(section));
                    }
                }
                _ => break,
            }
        }
        self.copy_plain(upto, section)
    }

    /// Copy the header comments, rewriting `%%Pages:` and, when the output
    /// size is known, replacing the size-describing headers.
    fn write_header(&mut self, total: u32, ignores: &[u64]) -> Result<()> {
        self.input.seek(0)?;
        if self.index.pages_comment != 0 {
            self.copy_range(self.index.pages_comment, ignores, "header")?;
            if self.input.read_line(&mut self.line)? == 0 {
                return Err(Error::Truncated("header"));
            }
            if let Some((width, height)) = self.size {
                write!(
                    self.output,
                    "%%DocumentMedia: plain {} {} 0 () ()\n",
                    width as i32, height as i32
                )?;
                write!(
                    self.output,
                    "%%BoundingBox: 0 0 {} {}\n",
                    width as i32, height as i32
                )?;
            }
            write!(self.output, "%%Pages: {} 0\n", total)?;
        }
        self.copy_range(self.index.header_end, ignores, "header")
    }

    fn write_procset(&mut self, nobind: bool) -> Result<()> {
        self.write_str("%%BeginProcSet: PStoPS")?;
        if nobind {
            self.write_str("-nobind")?;
        }
        self.write_str(" 1 15\n")?;
        self.write_str(PROLOGUE)?;
        if nobind {
            self.write_str("/bind{}def\n")?;
        }
        self.write_str("%%EndProcSet\n")
    }

    /// Copy the prolog, skipping any pre-existing PStoPS procset. Returns
    /// true when one was skipped.
    fn write_part_prolog(&mut self) -> Result<bool> {
        if self.index.procset_begin != 0 {
            self.copy_plain(self.index.procset_begin, "prologue")?;
        }
        if self.index.procset_end != 0 {
            self.input.seek(self.index.procset_end)?;
        }
        self.copy_plain(self.index.setup_end, "prologue")?;
        Ok(self.index.procset_begin != 0)
    }

    fn write_setup(&mut self) -> Result<()> {
        self.copy_plain(self.index.page_offsets()[0], "prologue")
    }

    /// Position the cursor on page `p` and consume its `%%Page:` line.
    fn seek_page(&mut self, p: usize) -> Result<dsc::PageComment> {
        self.input.seek(self.index.page_offsets()[p])?;
        if self.input.read_line(&mut self.line)? == 0 {
            return Err(Error::PageSeek(p));
        }
        dsc::parse_page_comment(&self.line, p)
    }

    fn write_page_header(&mut self, label: &str, page: u32) -> Result<()> {
        info!("[{page}]");
        self.outputpage += 1;
        write!(self.output, "%%Page: {} {}\n", label, self.outputpage)?;
        Ok(())
    }

    /// Matrix setup for one placement. The operation order is load-bearing:
    /// setmatrix, translate, rotate, hflip, vflip, scale, then the matrix
    /// save; clip and border stroke follow the save.
    fn write_transform(&mut self, ps: &PageSpec, draw: f64) -> Result<()> {
        self.write_str("PStoPSmatrix setmatrix\n")?;
        if ps.flags.contains(PageFlags::OFFSET) {
            write!(self.output, "{:.6} {:.6} translate\n", ps.xoff, ps.yoff)?;
        }
        if ps.flags.contains(PageFlags::ROTATE) {
            write!(self.output, "{} rotate\n", ps.rotate)?;
        }
        if ps.flags.contains(PageFlags::HFLIP) {
            let width = self.size.map_or(0.0, |(w, _)| w);
            write!(
                self.output,
                "[ -1 0 0 1 {:.6} 0 ] concat\n",
                width * ps.scale
            )?;
        }
        if ps.flags.contains(PageFlags::VFLIP) {
            let height = self.size.map_or(0.0, |(_, h)| h);
            write!(
                self.output,
                "[ 1 0 0 -1 0 {:.6} ] concat\n",
                height * ps.scale
            )?;
        }
        if ps.flags.contains(PageFlags::SCALE) {
            write!(self.output, "{:.6} dup scale\n", ps.scale)?;
        }
        self.write_str("userdict/PStoPSmatrix matrix currentmatrix put\n")?;
        if let Some((width, height)) = self.size {
            if width > 0.0 && height > 0.0 {
                write!(
                    self.output,
                    "userdict/PStoPSclip{{0 0 moveto {:.6} 0 rlineto 0 {:.6} rlineto -{:.6} 0 rlineto closepath}}put initclip\n",
                    width, height, width
                )?;
                if draw > 0.0 {
                    write!(
                        self.output,
                        "gsave clippath 0 setgray {:.6} setlinewidth stroke grestore\n",
                        draw
                    )?;
                }
            }
        }
        Ok(())
    }

    /// When a previous imposition pass left a procset in the input, its
    /// per-page setup lines are passed through up to (and excluding) the
    /// old transform concat.
    fn write_page_setup(&mut self) -> Result<()> {
        if self.index.procset_begin == 0 {
            return Ok(());
        }
        loop {
            if self.input.read_line(&mut self.line)? == 0 {
                return Err(Error::Truncated("page setup"));
            }
            if self.line.starts_with(b"PStoPSxform") {
                return Ok(());
            }
            self.output.write_all(&self.line)?;
        }
    }

    fn write_trailer(&mut self) -> Result<()> {
        self.input.seek(self.index.page_offsets()[self.index.pages()])?;
        loop {
            let chunk = self.input.fill()?;
            if chunk.is_empty() {
                break;
            }
            let n = chunk.len();
            self.output.write_all(chunk)?;
            self.input.consume(n);
        }
        info!(
            "Wrote {} pages, {} bytes",
            self.outputpage,
            self.output.bytes_written()
        );
        Ok(())
    }
}
