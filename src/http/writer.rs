use std::io::{self, Write};

use bytes::Bytes;

use crate::http::response::Response;

const HTTP_VERSION: &str = "HTTP/1.1";

fn serialize_head(resp: &Response) -> Vec<u8> {
    let mut buf = Vec::with_capacity(128);

    // Status line
    let status_line = format!(
        "{} {} {}\r\n",
        HTTP_VERSION,
        resp.status.as_u16(),
        resp.status.reason_phrase()
    );
    buf.extend_from_slice(status_line.as_bytes());

    for (k, v) in &resp.headers {
        buf.extend_from_slice(k.as_bytes());
        buf.extend_from_slice(b": ");
        buf.extend_from_slice(v.as_bytes());
        buf.extend_from_slice(b"\r\n");
    }

    // Header/body separator
    buf.extend_from_slice(b"\r\n");

    buf
}

/// Result of one [`ResponseWriter::write_to`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flush {
    /// Everything was written.
    Done,
    /// The socket would block; call again when it is writable.
    Pending,
}

/// A response being written to a non-blocking socket.
///
/// The header block and the body are written as two segments, in order.
/// Progress survives `WouldBlock`, so a partial send resumes on the next
/// writable event.
pub struct ResponseWriter {
    head: Vec<u8>,
    body: Bytes,
    written: usize,
}

impl ResponseWriter {
    pub fn new(response: &Response) -> Self {
        Self {
            head: serialize_head(response),
            body: response.body.clone(),
            written: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.head.len() + self.body.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn remaining(&self) -> usize {
        self.len() - self.written
    }

    fn unsent(&self) -> &[u8] {
        if self.written < self.head.len() {
            &self.head[self.written..]
        } else {
            &self.body[self.written - self.head.len()..]
        }
    }

    pub fn write_to<W: Write>(&mut self, dst: &mut W) -> io::Result<Flush> {
        while self.remaining() > 0 {
            match dst.write(self.unsent()) {
                Ok(0) => {
                    return Err(io::Error::new(
                        io::ErrorKind::WriteZero,
                        "connection closed while writing",
                    ));
                }
                Ok(n) => self.written += n,
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(Flush::Pending),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }

        Ok(Flush::Done)
    }
}
