//! Incremental request parser.
//!
//! [`Request::parse`] is called after every read. The buffer may end anywhere:
//! inside the method token, the path, a header line or the body. In that case
//! the parser reports [`Progress::Incomplete`] and picks up where it left off on
//! the next call. Only fully received units (method, path, whole header lines)
//! are committed to the request, so feeding a request in pieces gives the same
//! result as feeding it at once.

use memchr::memchr;
use thiserror::Error;

use crate::http::request::{Method, Request, Span};
use crate::http::response::StatusCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("unrecognized request method")]
    InvalidMethod,

    #[error("invalid request target")]
    InvalidPath,

    #[error("line not terminated by CRLF")]
    InvalidLineEnding,

    #[error("malformed Content-Length header")]
    InvalidContentLength,

    #[error("POST without a non-zero Content-Length")]
    LengthRequired,

    #[error("body exceeds Content-Length: expected {expected} bytes, received {received}")]
    BodyTooLong { expected: u64, received: u64 },
}

impl ParseError {
    /// Status code to answer the request with.
    pub fn status(&self) -> StatusCode {
        match self {
            ParseError::LengthRequired => StatusCode::LengthRequired,
            _ => StatusCode::BadRequest,
        }
    }
}

/// Outcome of a parse call that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    /// More bytes are needed.
    Incomplete,
    /// No error. This does not imply completion: always check
    /// [`Request::is_complete`].
    Parsed,
}

const METHODS: [(&[u8], Method); 7] = [
    (b"GET ", Method::GET),
    (b"PUT ", Method::PUT),
    (b"POST", Method::POST),
    (b"HEAD", Method::HEAD),
    (b"DELETE", Method::DELETE),
    (b"TRACE", Method::TRACE),
    (b"OPTIONS ", Method::OPTIONS),
];

const CONTENT_LENGTH: &[u8] = b"Content-Length:";

enum Field {
    /// The line may still turn out to be `Content-Length`.
    Pending,
    /// Some other header.
    Other,
    /// Parsed value and the offset of the terminating CR within the line.
    ContentLength(u64, usize),
}

impl Request {
    /// Parses as much of the buffer as possible.
    ///
    /// Sets the buffer's completion flag when the whole request, including a
    /// POST body, has arrived. If the request turns out to be incomplete while
    /// the flag is set, the flag is cleared and [`Progress::Parsed`] is still
    /// returned.
    pub fn parse(&mut self) -> Result<Progress, ParseError> {
        if self.advance()? {
            self.buf.mark_complete();
            return Ok(Progress::Parsed);
        }

        if self.buf.is_complete() {
            self.buf.clear_complete();
            return Ok(Progress::Parsed);
        }

        Ok(Progress::Incomplete)
    }

    fn advance(&mut self) -> Result<bool, ParseError> {
        let Some(method) = self.detect_method()? else {
            return Ok(false);
        };
        let Some(path) = self.extract_path(method)? else {
            return Ok(false);
        };
        let Some(header_end) = self.locate_header_end(path)? else {
            return Ok(false);
        };

        if method != Method::POST {
            return Ok(true);
        }

        let expected = match self.content_length {
            Some(n) if n > 0 => n,
            _ => return Err(ParseError::LengthRequired),
        };
        let received = (self.buf.len() - header_end) as u64;

        if received < expected {
            Ok(false)
        } else if received > expected {
            Err(ParseError::BodyTooLong { expected, received })
        } else {
            Ok(true)
        }
    }

    fn detect_method(&mut self) -> Result<Option<Method>, ParseError> {
        if let Some(method) = self.method {
            return Ok(Some(method));
        }

        let data = self.buf.as_slice();
        let mut pending = false;
        for (literal, method) in METHODS {
            if data.starts_with(literal) {
                self.method = Some(method);
                return Ok(Some(method));
            }
            pending |= literal.starts_with(data);
        }

        if pending {
            Ok(None)
        } else {
            Err(ParseError::InvalidMethod)
        }
    }

    fn extract_path(&mut self, method: Method) -> Result<Option<Span>, ParseError> {
        if let Some(span) = self.path {
            return Ok(Some(span));
        }

        let data = self.buf.as_slice();
        let start = method.as_str().len();
        match data.get(start) {
            None => return Ok(None),
            Some(b' ') => {}
            Some(_) => return Err(ParseError::InvalidPath),
        }

        let offset = start + 1;
        let Some(len) = data[offset..]
            .iter()
            .position(|b| !(33..=126).contains(b))
        else {
            return Ok(None);
        };

        if len == 0 || data[offset + len] != b' ' {
            return Err(ParseError::InvalidPath);
        }

        let span = Span { offset, len };
        self.path = Some(span);
        Ok(Some(span))
    }

    fn locate_header_end(&mut self, path: Span) -> Result<Option<usize>, ParseError> {
        if let Some(end) = self.header_end {
            return Ok(Some(end));
        }

        let data = self.buf.as_slice();
        let mut pos = match self.next_line {
            Some(pos) => pos,
            // skip the rest of the request line
            None => match skip_line(data, path.end() + 1)? {
                Some(pos) => pos,
                None => return Ok(None),
            },
        };
        self.next_line = Some(pos);

        loop {
            let line = &data[pos..];
            if line.len() < 2 {
                return Ok(None);
            }
            if line.starts_with(b"\r\n") {
                let end = pos + 2;
                self.header_end = Some(end);
                return Ok(Some(end));
            }

            let field = content_length_field(line)?;
            let scan_from = match field {
                Field::Pending => return Ok(None),
                Field::Other => pos,
                Field::ContentLength(_, cr) => pos + cr,
            };
            let Some(next) = skip_line(data, scan_from)? else {
                return Ok(None);
            };

            if let Field::ContentLength(value, _) = field {
                self.content_length = Some(value);
            }
            pos = next;
            self.next_line = Some(next);
        }
    }
}

/// Returns the offset just past the next CRLF at or after `from`.
fn skip_line(data: &[u8], from: usize) -> Result<Option<usize>, ParseError> {
    let Some(i) = memchr(b'\r', &data[from..]) else {
        return Ok(None);
    };
    let cr = from + i;
    match data.get(cr + 1) {
        None => Ok(None),
        Some(b'\n') => Ok(Some(cr + 2)),
        Some(_) => Err(ParseError::InvalidLineEnding),
    }
}

/// Matches `Content-Length: <digits>\r` at the start of `line`.
fn content_length_field(line: &[u8]) -> Result<Field, ParseError> {
    if line.len() < CONTENT_LENGTH.len() {
        return Ok(if CONTENT_LENGTH.starts_with(line) {
            Field::Pending
        } else {
            Field::Other
        });
    }
    if !line.starts_with(CONTENT_LENGTH) {
        return Ok(Field::Other);
    }

    let mut i = CONTENT_LENGTH.len();
    match line.get(i) {
        None => return Ok(Field::Pending),
        Some(b' ') => i += 1,
        Some(_) => return Err(ParseError::InvalidContentLength),
    }
    match line.get(i) {
        None => return Ok(Field::Pending),
        Some(b) if b.is_ascii_digit() => {}
        Some(_) => return Err(ParseError::InvalidContentLength),
    }

    let mut value: u64 = 0;
    while let Some(&b) = line.get(i) {
        if !b.is_ascii_digit() {
            break;
        }
        value = value
            .checked_mul(10)
            .and_then(|v| v.checked_add(u64::from(b - b'0')))
            .ok_or(ParseError::InvalidContentLength)?;
        i += 1;
    }

    match line.get(i) {
        None => Ok(Field::Pending),
        Some(b'\r') => Ok(Field::ContentLength(value, i)),
        Some(_) => Err(ParseError::InvalidContentLength),
    }
}
