use std::collections::TryReserveError;

use crate::http::buffer::{BufferLimits, RequestBuffer};
use crate::http::response::StatusCode;

/// HTTP request methods recognized by the parser.
///
/// Only `POST` carries a body; every other method completes at the end of
/// its headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// GET - Retrieve a resource
    GET,
    /// PUT - Replace a resource
    PUT,
    /// POST - Submit data, framed by `Content-Length`
    POST,
    /// HEAD - Like GET but without the response body
    HEAD,
    /// DELETE - Delete a resource
    DELETE,
    /// OPTIONS - Describe communication options
    OPTIONS,
    /// TRACE - Loop-back test
    TRACE,
}

impl Method {
    /// The method token as it appears on the request line.
    ///
    /// ```
    /// # use wicket::http::request::Method;
    /// assert_eq!(Method::DELETE.as_str(), "DELETE");
    /// ```
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::GET => "GET",
            Method::PUT => "PUT",
            Method::POST => "POST",
            Method::HEAD => "HEAD",
            Method::DELETE => "DELETE",
            Method::OPTIONS => "OPTIONS",
            Method::TRACE => "TRACE",
        }
    }
}

/// A byte range inside the request buffer.
///
/// Stored as offsets so that growing the buffer never invalidates it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub offset: usize,
    pub len: usize,
}

impl Span {
    pub fn end(&self) -> usize {
        self.offset + self.len
    }

    pub fn slice<'a>(&self, data: &'a [u8]) -> &'a [u8] {
        &data[self.offset..self.end()]
    }
}

/// One in-flight request: the raw bytes plus everything the parser has
/// learned about them so far.
///
/// The parser fills the fields in over many calls (see
/// [`Request::parse`](crate::http::request::Request::parse)); nothing here is
/// final until [`is_complete`](Self::is_complete) returns `true`.
#[derive(Debug)]
pub struct Request {
    pub(crate) buf: RequestBuffer,
    pub(crate) method: Option<Method>,
    pub(crate) path: Option<Span>,
    /// Start of the next header line not yet scanned.
    pub(crate) next_line: Option<usize>,
    pub(crate) content_length: Option<u64>,
    pub(crate) header_end: Option<usize>,
    pub(crate) status: Option<StatusCode>,
}

impl Request {
    pub fn new(limits: BufferLimits) -> Self {
        Self {
            buf: RequestBuffer::new(limits),
            method: None,
            path: None,
            next_line: None,
            content_length: None,
            header_end: None,
            status: None,
        }
    }

    /// Unbounded request holding `bytes`, not yet parsed.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TryReserveError> {
        let mut req = Self::new(BufferLimits {
            max_size: None,
            ..BufferLimits::default()
        });
        req.buf.append(bytes)?;
        Ok(req)
    }

    pub fn buffer(&self) -> &RequestBuffer {
        &self.buf
    }

    pub fn buffer_mut(&mut self) -> &mut RequestBuffer {
        &mut self.buf
    }

    pub fn method(&self) -> Option<Method> {
        self.method
    }

    pub fn path_span(&self) -> Option<Span> {
        self.path
    }

    /// The raw request target, query string included.
    pub fn path(&self) -> Option<&[u8]> {
        self.path.map(|span| span.slice(self.buf.as_slice()))
    }

    /// The request target as text. Always valid, the parser only accepts
    /// printable ASCII.
    pub fn path_str(&self) -> Option<&str> {
        self.path().and_then(|p| std::str::from_utf8(p).ok())
    }

    pub fn content_length(&self) -> Option<u64> {
        self.content_length
    }

    /// Offset of the first byte after the blank line, once located.
    pub fn header_end(&self) -> Option<usize> {
        self.header_end
    }

    /// Body bytes received so far, bounded by `Content-Length`.
    pub fn body(&self) -> Option<&[u8]> {
        let start = self.header_end?;
        let data = self.buf.as_slice();
        let declared = self.content_length.unwrap_or(0);
        let available = (data.len() - start) as u64;
        let len = declared.min(available) as usize;
        Some(&data[start..start + len])
    }

    /// Status recorded by a failed parse, answered once the request completes.
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    pub fn set_status(&mut self, status: StatusCode) {
        self.status = Some(status);
    }

    pub fn is_complete(&self) -> bool {
        self.buf.is_complete()
    }

    /// Returns the request to its freshly accepted state.
    pub fn reset(&mut self) {
        self.buf.reset();
        self.method = None;
        self.path = None;
        self.next_line = None;
        self.content_length = None;
        self.header_end = None;
        self.status = None;
    }
}
