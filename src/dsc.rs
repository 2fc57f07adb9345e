//! DSC comment scanning and the page offset index.
//!
//! One forward pass over the input records where the structural landmarks
//! of a DSC-conformant document start; every later emission step is a seek
//! back to one of these offsets.

use std::io::{Read, Seek};

use smallvec::SmallVec;

use crate::common::error::{Error, Result};
use crate::io::LineReader;

/// Cap on remembered size-affecting header comments.
const MAX_SIZE_HEADERS: usize = 19;

/// Byte offsets gathered in one forward pass over a DSC document.
///
/// Offsets of value 0 mean "not seen" (offset 0 is always the magic line,
/// never a landmark).
#[derive(Debug, Default, Clone)]
pub struct InputIndex {
    page_offsets: Vec<u64>,
    /// First byte after the initial header comments.
    pub header_end: u64,
    /// Offset of the `%%Pages:` header line, or 0 if absent.
    pub pages_comment: u64,
    /// First byte after `%%EndSetup`, clamped to the first page offset.
    pub setup_end: u64,
    /// Byte range of a pre-existing `PStoPS` procset, else both 0.
    pub procset_begin: u64,
    pub procset_end: u64,
    size_headers: SmallVec<[u64; 20]>,
}

impl InputIndex {
    /// Number of pages found.
    pub fn pages(&self) -> usize {
        self.page_offsets.len() - 1
    }

    /// Offsets of each `%%Page:` line, plus the trailer start as sentinel.
    pub fn page_offsets(&self) -> &[u64] {
        &self.page_offsets
    }

    /// Header comment lines that describe the paper size, sorted ascending.
    pub fn size_headers(&self) -> &[u64] {
        &self.size_headers
    }

    /// Scan the document from the start, leaving the cursor at the trailer.
    pub fn scan<R: Read + Seek>(input: &mut LineReader<R>) -> Result<InputIndex> {
        let mut index = InputIndex::default();
        let mut nesting = 0i32;
        let mut line = Vec::with_capacity(256);

        input.seek(0)?;
        loop {
            let record = input.position();
            if input.read_line(&mut line)? == 0 {
                break;
            }
            if line[0] != b'%' {
                if index.header_end == 0 {
                    index.header_end = record;
                }
                continue;
            }
            if line.get(1) != Some(&b'%') {
                // a `%` line other than the `%!` magic ends the header
                if index.header_end == 0 && line.get(1) != Some(&b'!') {
                    index.header_end = record;
                }
                continue;
            }
            let comment = &line[2..];
            if nesting == 0 && comment.starts_with(b"Page:") {
                index.page_offsets.push(record);
            } else if index.header_end == 0
                && (comment.starts_with(b"BoundingBox:")
                    || comment.starts_with(b"HiResBoundingBox:")
                    || comment.starts_with(b"DocumentPaperSizes:")
                    || comment.starts_with(b"DocumentMedia:"))
            {
                if index.size_headers.len() < MAX_SIZE_HEADERS {
                    index.size_headers.push(record);
                }
            } else if index.header_end == 0 && comment.starts_with(b"Pages:") {
                index.pages_comment = record;
            } else if index.header_end == 0 && comment.starts_with(b"EndComments") {
                index.header_end = input.position();
            } else if comment.starts_with(b"BeginDocument")
                || comment.starts_with(b"BeginBinary")
                || comment.starts_with(b"BeginFile")
            {
                nesting += 1;
            } else if comment.starts_with(b"EndDocument")
                || comment.starts_with(b"EndBinary")
                || comment.starts_with(b"EndFile")
            {
                nesting -= 1;
            } else if nesting == 0 && comment.starts_with(b"EndSetup") {
                index.setup_end = record;
            } else if nesting == 0 && comment.starts_with(b"BeginProlog") {
                index.header_end = input.position();
            } else if nesting == 0 && comment.starts_with(b"BeginProcSet: PStoPS") {
                index.procset_begin = record;
            } else if index.procset_begin != 0
                && index.procset_end == 0
                && comment.starts_with(b"EndProcSet")
            {
                index.procset_end = input.position();
            } else if nesting == 0
                && (comment.starts_with(b"Trailer") || comment.starts_with(b"EOF"))
            {
                input.seek(record)?;
                break;
            }
        }
        index.page_offsets.push(input.position());
        if index.setup_end == 0 || index.setup_end > index.page_offsets[0] {
            index.setup_end = index.page_offsets[0];
        }
        Ok(index)
    }
}

/// Parsed `%%Page: <label> <ordinal>` comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageComment {
    pub label: String,
    pub ordinal: i32,
}

/// Parse a `%%Page:` line; `page` only feeds the diagnostics.
///
/// Parenthesized labels keep their parentheses and may nest; an
/// unterminated one is fatal, matching the DSC requirement that the label
/// fits on the comment line.
pub fn parse_page_comment(line: &[u8], page: usize) -> Result<PageComment> {
    let rest = line.strip_prefix(b"%%Page:").ok_or(Error::PageSeek(page))?;
    let mut start = 0;
    while start < rest.len() && rest[start].is_ascii_whitespace() {
        start += 1;
    }
    let end = if rest.get(start) == Some(&b'(') {
        let mut paren = 1u32;
        let mut at = start + 1;
        loop {
            match rest.get(at) {
                None => return Err(Error::BadPageLabel(page)),
                Some(b'(') => paren += 1,
                Some(b')') => paren -= 1,
                Some(_) => {}
            }
            at += 1;
            if paren == 0 {
                break;
            }
        }
        at
    } else {
        let mut at = start;
        while at < rest.len() && !rest[at].is_ascii_whitespace() {
            at += 1;
        }
        at
    };
    Ok(PageComment {
        label: String::from_utf8_lossy(&rest[start..end]).into_owned(),
        ordinal: atoi(&rest[end..]),
    })
}

/// C `atoi` semantics: skip whitespace, optional sign, then digits; 0 when
/// no digits follow.
fn atoi(bytes: &[u8]) -> i32 {
    let mut at = 0;
    while at < bytes.len() && bytes[at].is_ascii_whitespace() {
        at += 1;
    }
    let neg = match bytes.get(at) {
        Some(b'-') => {
            at += 1;
            true
        }
        Some(b'+') => {
            at += 1;
            false
        }
        _ => false,
    };
    let mut value = 0i64;
    while at < bytes.len() && bytes[at].is_ascii_digit() {
        value = value * 10 + i64::from(bytes[at] - b'0');
        if value > i64::from(i32::MAX) {
            value = i64::from(i32::MAX);
            break;
        }
        at += 1;
    }
    let value = if neg { -value } else { value };
    value.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn scan(doc: &str) -> InputIndex {
        let mut reader = LineReader::new(Cursor::new(doc.as_bytes().to_vec())).unwrap();
        InputIndex::scan(&mut reader).unwrap()
    }

    fn offset_of(doc: &str, needle: &str) -> u64 {
        doc.find(needle).unwrap() as u64
    }

    const DOC: &str = "%!PS-Adobe-3.0\n\
%%BoundingBox: 0 0 595 842\n\
%%Pages: 2\n\
%%EndComments\n\
%%BeginProlog\n\
/box { 0 0 100 100 rectstroke } def\n\
%%EndProlog\n\
%%BeginSetup\n\
<< /PageSize [595 842] >> setpagedevice\n\
%%EndSetup\n\
%%Page: 1 1\n\
box showpage\n\
%%Page: 2 2\n\
box showpage\n\
%%Trailer\n\
%%EOF\n";

    #[test]
    fn indexes_the_landmarks() {
        let index = scan(DOC);
        assert_eq!(index.pages(), 2);
        assert_eq!(index.page_offsets()[0], offset_of(DOC, "%%Page: 1"));
        assert_eq!(index.page_offsets()[1], offset_of(DOC, "%%Page: 2"));
        assert_eq!(index.page_offsets()[2], offset_of(DOC, "%%Trailer"));
        assert_eq!(index.pages_comment, offset_of(DOC, "%%Pages:"));
        assert_eq!(index.size_headers(), &[offset_of(DOC, "%%BoundingBox:")]);
        // %%EndComments ends the header, then %%BeginProlog advances it
        // past itself
        assert_eq!(index.header_end, offset_of(DOC, "/box"));
        assert_eq!(index.setup_end, offset_of(DOC, "%%EndSetup"));
        assert_eq!(index.procset_begin, 0);
        assert_eq!(index.procset_end, 0);
    }

    #[test]
    fn nested_documents_hide_page_comments() {
        let doc = "%!PS\n\
%%EndComments\n\
%%Page: 1 1\n\
%%BeginDocument: inner.eps\n\
%%Page: 9 9\n\
%%EndDocument\n\
body\n\
%%Trailer\n";
        let index = scan(doc);
        assert_eq!(index.pages(), 1);
        assert_eq!(index.page_offsets()[0], offset_of(doc, "%%Page: 1"));
    }

    #[test]
    fn missing_setup_clamps_to_first_page() {
        let doc = "%!PS\n%%EndComments\n%%Page: 1 1\nshowpage\n%%Trailer\n";
        let index = scan(doc);
        assert_eq!(index.setup_end, index.page_offsets()[0]);
    }

    #[test]
    fn plain_line_ends_the_header() {
        let doc = "%!PS\n%%Pages: 1\ngsave\n%%BoundingBox: 0 0 1 1\n%%Page: 1 1\n";
        let index = scan(doc);
        assert_eq!(index.header_end, offset_of(doc, "gsave"));
        // size headers past the header end are not collected
        assert!(index.size_headers().is_empty());
        assert_eq!(index.pages_comment, offset_of(doc, "%%Pages:"));
    }

    #[test]
    fn single_percent_comment_ends_the_header() {
        let doc = "%!PS\n% hand-written\n%%Pages: 1\n%%Page: 1 1\n";
        let index = scan(doc);
        assert_eq!(index.header_end, offset_of(doc, "% hand-written"));
        assert_eq!(index.pages_comment, 0);
    }

    #[test]
    fn records_existing_procset() {
        let doc = "%!PS\n\
%%EndComments\n\
%%BeginProcSet: PStoPS 1 15\n\
userdict begin\n\
end\n\
%%EndProcSet\n\
%%Page: (0) 1\n\
showpage\n\
%%Trailer\n";
        let index = scan(doc);
        assert_eq!(index.procset_begin, offset_of(doc, "%%BeginProcSet:"));
        assert_eq!(index.procset_end, offset_of(doc, "%%Page: (0)"));
    }

    #[test]
    fn trailer_stops_the_scan() {
        let doc = "%!PS\n%%EndComments\n%%Page: 1 1\n%%Trailer\n%%Page: 2 2\n";
        let index = scan(doc);
        assert_eq!(index.pages(), 1);
        assert_eq!(index.page_offsets()[1], offset_of(doc, "%%Trailer"));
    }

    #[test]
    fn page_comment_plain_label() {
        let pc = parse_page_comment(b"%%Page: iv 4\n", 0).unwrap();
        assert_eq!(pc.label, "iv");
        assert_eq!(pc.ordinal, 4);
    }

    #[test]
    fn page_comment_paren_label() {
        let pc = parse_page_comment(b"%%Page: (2,3) 2\n", 0).unwrap();
        assert_eq!(pc.label, "(2,3)");
        assert_eq!(pc.ordinal, 2);

        let pc = parse_page_comment(b"%%Page: (a(b)c) 7\n", 0).unwrap();
        assert_eq!(pc.label, "(a(b)c)");
        assert_eq!(pc.ordinal, 7);
    }

    #[test]
    fn page_comment_errors() {
        assert!(matches!(
            parse_page_comment(b"showpage\n", 3),
            Err(Error::PageSeek(3))
        ));
        assert!(matches!(
            parse_page_comment(b"%%Page: (open 1\n", 5),
            Err(Error::BadPageLabel(5))
        ));
    }
}
