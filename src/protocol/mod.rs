//! Wire Protocol
//!
//! Requests arrive as whitespace-separated inline text lines; replies go out
//! in RESP framing (`+`, `-`, `$`, `*`).
//!
//! ## Modules
//!
//! - `types`: Defines the `RespValue` reply enum and serialization
//! - `parser`: Line framing and tokenization for incoming requests
//!
//! ## Example
//!
//! ```
//! use linekv::protocol::{parse_line, RespValue};
//! use bytes::Bytes;
//!
//! let (tokens, _consumed) = parse_line(b"GET name\r\n").unwrap().unwrap();
//! assert_eq!(tokens.len(), 2);
//!
//! let response = RespValue::bulk_string(Bytes::from("linekv"));
//! assert_eq!(response.serialize(), b"$6\r\nlinekv\r\n");
//! ```

pub mod parser;
pub mod types;

pub use parser::{parse_line, ParseError, ParseResult, MAX_LINE_LENGTH};
pub use types::RespValue;
