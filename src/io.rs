//! Stream plumbing: spooled input, offset-aware line reads, counted writes.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom, Write};

/// Line buffer size; longer lines are handed out in chunks of this size.
pub const LINE_BUF: usize = 8192;

/// Drain a non-seekable stream into an anonymous temp file and rewind it.
///
/// The file is unlinked on creation, so it is reclaimed on every exit path
/// once the handle drops.
pub fn spool_to_temp<R: Read>(mut reader: R) -> io::Result<File> {
    let mut spool = tempfile::tempfile()?;
    io::copy(&mut reader, &mut spool)?;
    spool.seek(SeekFrom::Start(0))?;
    Ok(spool)
}

/// Buffered reader over a seekable stream that tracks absolute offsets.
///
/// The scanner records byte offsets during its forward pass and the emitter
/// later seeks back to them, so the cursor position must stay exact across
/// buffered reads.
pub struct LineReader<R> {
    inner: R,
    buf: Vec<u8>,
    /// Absolute offset of `buf[0]` in the stream.
    start: u64,
    pos: usize,
    len: usize,
}

impl<R: Read + Seek> LineReader<R> {
    pub fn new(mut inner: R) -> io::Result<Self> {
        inner.seek(SeekFrom::Start(0))?;
        Ok(LineReader {
            inner,
            buf: vec![0; LINE_BUF],
            start: 0,
            pos: 0,
            len: 0,
        })
    }

    /// Absolute offset of the next byte to be read.
    pub fn position(&self) -> u64 {
        self.start + self.pos as u64
    }

    /// Reposition to an absolute offset.
    pub fn seek(&mut self, to: u64) -> io::Result<()> {
        let end = self.start + self.len as u64;
        if to >= self.start && to <= end {
            self.pos = (to - self.start) as usize;
        } else {
            self.inner.seek(SeekFrom::Start(to))?;
            self.start = to;
            self.pos = 0;
            self.len = 0;
        }
        Ok(())
    }

    /// Buffered bytes at the cursor, refilling if drained. Empty at EOF.
    pub fn fill(&mut self) -> io::Result<&[u8]> {
        if self.pos >= self.len {
            self.start += self.len as u64;
            self.pos = 0;
            self.len = self.inner.read(&mut self.buf)?;
        }
        Ok(&self.buf[self.pos..self.len])
    }

    /// Advance the cursor over `n` buffered bytes.
    pub fn consume(&mut self, n: usize) {
        debug_assert!(self.pos + n <= self.len);
        self.pos += n;
    }

    /// Read one line into `line`, up to and including `\n`, capped at
    /// [`LINE_BUF`] bytes. Returns the number of bytes read; 0 at EOF.
    pub fn read_line(&mut self, line: &mut Vec<u8>) -> io::Result<usize> {
        line.clear();
        while line.len() < LINE_BUF {
            let avail = self.fill()?;
            if avail.is_empty() {
                break;
            }
            let cap = LINE_BUF - line.len();
            let scan = &avail[..avail.len().min(cap)];
            match memchr::memchr(b'\n', scan) {
                Some(i) => {
                    line.extend_from_slice(&scan[..=i]);
                    self.consume(i + 1);
                    break;
                }
                None => {
                    let n = scan.len();
                    line.extend_from_slice(scan);
                    self.consume(n);
                }
            }
        }
        Ok(line.len())
    }
}

/// Byte-counting wrapper over an output stream.
pub struct CountingWriter<W> {
    inner: W,
    written: u64,
}

impl<W: Write> CountingWriter<W> {
    pub fn new(inner: W) -> Self {
        CountingWriter { inner, written: 0 }
    }

    /// Total bytes written so far.
    pub fn bytes_written(&self) -> u64 {
        self.written
    }
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn reads_lines_and_tracks_offsets() {
        let mut r = LineReader::new(Cursor::new(b"abc\nde\nf".to_vec())).unwrap();
        let mut line = Vec::new();

        assert_eq!(r.position(), 0);
        assert_eq!(r.read_line(&mut line).unwrap(), 4);
        assert_eq!(line, b"abc\n");
        assert_eq!(r.position(), 4);

        assert_eq!(r.read_line(&mut line).unwrap(), 3);
        assert_eq!(line, b"de\n");

        // final line has no newline
        assert_eq!(r.read_line(&mut line).unwrap(), 1);
        assert_eq!(line, b"f");
        assert_eq!(r.read_line(&mut line).unwrap(), 0);
    }

    #[test]
    fn seek_within_and_before_buffer() {
        let mut r = LineReader::new(Cursor::new(b"abc\ndef\n".to_vec())).unwrap();
        let mut line = Vec::new();
        r.read_line(&mut line).unwrap();
        r.read_line(&mut line).unwrap();

        r.seek(4).unwrap();
        r.read_line(&mut line).unwrap();
        assert_eq!(line, b"def\n");

        r.seek(0).unwrap();
        assert_eq!(r.position(), 0);
        r.read_line(&mut line).unwrap();
        assert_eq!(line, b"abc\n");
    }

    #[test]
    fn fill_and_consume_copy_raw_bytes() {
        let mut r = LineReader::new(Cursor::new(b"0123456789".to_vec())).unwrap();
        r.seek(2).unwrap();
        let chunk = r.fill().unwrap();
        assert_eq!(&chunk[..3], b"234");
        r.consume(3);
        assert_eq!(r.position(), 5);
    }

    #[test]
    fn spool_rewinds_to_start() {
        let data = b"not seekable".to_vec();
        let mut spool = spool_to_temp(Cursor::new(data.clone())).unwrap();
        assert_eq!(spool.stream_position().unwrap(), 0);
        let mut back = Vec::new();
        spool.read_to_end(&mut back).unwrap();
        assert_eq!(back, data);
    }

    #[test]
    fn counting_writer_counts() {
        let mut out = CountingWriter::new(Vec::new());
        out.write_all(b"hello ").unwrap();
        write!(out, "{}", 42).unwrap();
        assert_eq!(out.bytes_written(), 8);
    }
}
