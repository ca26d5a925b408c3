use std::io::{BufRead, BufReader, Read, Result};

use tracing::debug;

/// IANA names and aliases of ISO-8859-1.
const LATIN1_NAMES: &[&str] = &[
    "ISO_8859-1:1987",
    "ISO-8859-1",
    "iso-ir-100",
    "ISO_8859-1",
    "latin1",
    "l1",
    "IBM819",
    "CP819",
    "csISOLatin1",
];

const CHUNK_SIZE: usize = 4096;

pub fn is_latin1(charset: &str) -> bool {
    LATIN1_NAMES
        .iter()
        .any(|name| name.eq_ignore_ascii_case(charset))
}

/// Wraps a Latin-1 byte stream, yielding UTF-8 where every byte becomes the code
/// point of the same value.
pub struct Latin1Reader<R> {
    inner: R,
    raw: Box<[u8; CHUNK_SIZE]>,
    pending: Vec<u8>,
    pos: usize,
}

impl<R: Read> Latin1Reader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            raw: Box::new([0u8; CHUNK_SIZE]),
            pending: Vec::with_capacity(CHUNK_SIZE * 2),
            pos: 0,
        }
    }
}

impl<R: Read> Read for Latin1Reader<R> {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        if self.pos == self.pending.len() {
            let len = self.inner.read(&mut self.raw[..])?;
            if len == 0 {
                return Ok(0);
            }

            self.pending.resize(len * 2, 0);
            let written =
                encoding_rs::mem::convert_latin1_to_utf8(&self.raw[..len], &mut self.pending);
            self.pending.truncate(written);
            self.pos = 0;
        }

        let len = buf.len().min(self.pending.len() - self.pos);
        buf[..len].copy_from_slice(&self.pending[self.pos..self.pos + len]);
        self.pos += len;

        Ok(len)
    }
}

/// Extracts the `encoding` pseudo-attribute of an XML declaration at the head of `head`.
fn declared_encoding(head: &[u8]) -> Option<&str> {
    let head = head.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(head);
    let start = head.iter().position(|b| !b.is_ascii_whitespace())?;
    let head = head[start..].strip_prefix(b"<?xml")?;
    let end = head.windows(2).position(|w| w == b"?>")?;
    let declaration = std::str::from_utf8(&head[..end]).ok()?;

    let (_, rest) = declaration.split_once("encoding")?;
    let rest = rest.trim_start().strip_prefix('=')?.trim_start();
    let quote = rest.chars().next().filter(|c| *c == '"' || *c == '\'')?;
    let rest = &rest[1..];
    let end = rest.find(quote)?;

    Some(&rest[..end])
}

/// Normalizes the character encoding of a guide before it reaches the tokenizer.
///
/// Documents declaring an ISO-8859-1 charset are converted to UTF-8, anything else is
/// passed through unchanged.
pub fn transcode<R: BufRead + Send + 'static>(mut source: R) -> Result<Box<dyn BufRead + Send>> {
    let encoding = declared_encoding(source.fill_buf()?).map(str::to_string);

    match encoding {
        Some(encoding) if is_latin1(&encoding) => {
            debug!(encoding, "Transcoding Latin-1 guide to UTF-8");
            Ok(Box::new(BufReader::new(Latin1Reader::new(source))))
        }
        _ => Ok(Box::new(source)),
    }
}
