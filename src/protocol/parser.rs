//! Inline Command Parser
//!
//! Requests are plain text lines: a command verb followed by arguments,
//! separated by whitespace and terminated by `\n` (optionally `\r\n`).
//!
//! ```text
//! SET foo bar PX 100\r\n
//! ```
//!
//! There is no quoting. A value containing whitespace cannot be expressed;
//! it is split into several tokens like any other whitespace.
//!
//! ## How the Parser Works
//!
//! [`parse_line`] reads from a buffer and returns either:
//! - `Ok(Some((tokens, consumed)))` - A full line was found, `consumed` bytes were used
//! - `Ok(None)` - Need more data, no newline buffered yet
//! - `Err(ParseError)` - The buffered line can never become valid
//!
//! This lets the caller append network data to a buffer, call `parse_line`
//! until it returns `None`, and advance the buffer by `consumed` each time.

use bytes::Bytes;
use thiserror::Error;

/// Maximum length of a single request line, terminator included (64 KB)
pub const MAX_LINE_LENGTH: usize = 64 * 1024;

/// Errors that can occur while framing request lines.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// No newline within the allowed line length
    #[error("line too long: more than {max} bytes without a newline")]
    LineTooLong { max: usize },
}

/// Result type for parsing operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// Attempts to take one request line from the front of `buf`.
///
/// A blank line yields an empty token list.
///
/// # Example
///
/// ```
/// use linekv::protocol::parse_line;
/// use bytes::Bytes;
///
/// let (tokens, consumed) = parse_line(b"GET  foo\r\nPING\r\n").unwrap().unwrap();
/// assert_eq!(tokens, vec![Bytes::from("GET"), Bytes::from("foo")]);
/// assert_eq!(consumed, 10);
/// ```
pub fn parse_line(buf: &[u8]) -> ParseResult<Option<(Vec<Bytes>, usize)>> {
    let newline = match find_newline(buf) {
        Some(pos) => pos,
        None if buf.len() >= MAX_LINE_LENGTH => {
            return Err(ParseError::LineTooLong {
                max: MAX_LINE_LENGTH,
            })
        }
        None => return Ok(None),
    };

    if newline + 1 > MAX_LINE_LENGTH {
        return Err(ParseError::LineTooLong {
            max: MAX_LINE_LENGTH,
        });
    }

    let line = &buf[..newline];
    let line = line.strip_suffix(b"\r").unwrap_or(line);

    Ok(Some((tokenize(line), newline + 1)))
}

/// Splits a line on ASCII whitespace, dropping empty tokens.
pub fn tokenize(line: &[u8]) -> Vec<Bytes> {
    line.split(|b| b.is_ascii_whitespace())
        .filter(|token| !token.is_empty())
        .map(Bytes::copy_from_slice)
        .collect()
}

#[inline]
fn find_newline(buf: &[u8]) -> Option<usize> {
    buf.iter().position(|&b| b == b'\n')
}
