use std::io::{self, Read, Write};
use std::net::SocketAddr;

use mio::event::Source;
use mio::{Interest, Registry, Token};

use crate::http::buffer::BufferLimits;
use crate::http::request::{Method, Request};
use crate::http::response::{Response, ResponseBuilder, StatusCode};
use crate::http::writer::{Flush, ResponseWriter};
use crate::resource::ResourceStore;

/// The single I/O direction a connection is registered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Read,
    Write,
}

impl Direction {
    pub fn interest(self) -> Interest {
        match self {
            Direction::Read => Interest::READABLE,
            Direction::Write => Interest::WRITABLE,
        }
    }
}

/// One accepted client socket and the request it is working on.
///
/// `direction` always names the interest the socket is registered with. The
/// event handlers return `Some(direction)` when it changed so the reactor can
/// re-register the socket.
pub struct Connection<S> {
    stream: S,
    peer: SocketAddr,
    request: Request,
    writer: Option<ResponseWriter>,
    direction: Direction,
}

impl<S: Read + Write> Connection<S> {
    pub fn new(stream: S, peer: SocketAddr, limits: BufferLimits) -> Self {
        Self {
            stream,
            peer,
            request: Request::new(limits),
            writer: None,
            direction: Direction::Read,
        }
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    pub fn stream(&self) -> &S {
        &self.stream
    }

    pub fn stream_mut(&mut self) -> &mut S {
        &mut self.stream
    }

    /// Handles a readable event.
    ///
    /// Reads until the socket would block or the request is complete, running
    /// the parser after every read. Parse failures are kept as the request's
    /// status; reading goes on until the request completes. An `Err` means the
    /// connection must be closed.
    pub fn on_readable(&mut self) -> io::Result<Option<Direction>> {
        if self.direction != Direction::Read {
            return Ok(None);
        }

        while !self.request.is_complete() {
            if !self.read_once()? {
                return Ok(None);
            }
        }

        tracing::trace!(
            peer = %self.peer,
            bytes = self.request.buffer().len(),
            "Request complete"
        );
        self.direction = Direction::Write;
        Ok(Some(Direction::Write))
    }

    /// Returns `false` when the socket would block.
    fn read_once(&mut self) -> io::Result<bool> {
        let spare = match self.request.buffer_mut().spare_mut() {
            Ok(spare) => spare,
            Err(e) => {
                tracing::error!(
                    peer = %self.peer,
                    error = %e,
                    "Ran out of memory for request buffer"
                );
                return Err(io::Error::new(io::ErrorKind::OutOfMemory, e));
            }
        };

        let n = match self.stream.read(spare) {
            Ok(0) => {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "peer closed the connection",
                ));
            }
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(false),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => return Ok(true),
            Err(e) => return Err(e),
        };

        self.request.buffer_mut().commit(n);
        self.parse_received();
        Ok(true)
    }

    fn parse_received(&mut self) {
        if let Err(e) = self.request.parse() {
            let status = e.status();
            if self.request.status() != Some(status) {
                tracing::warn!(
                    peer = %self.peer,
                    status = status.as_u16(),
                    error = %e,
                    "Malformed request"
                );
            }
            self.request.set_status(status);
        }

        if self.request.buffer().at_limit() && !self.request.is_complete() {
            tracing::warn!(
                peer = %self.peer,
                bytes = self.request.buffer().len(),
                "Request buffer limit reached"
            );
            if self.request.status().is_none() {
                self.request.set_status(StatusCode::BadRequest);
            }
            self.request.buffer_mut().mark_complete();
        }
    }

    /// Handles a writable event: builds the response on first call, writes as
    /// much as the socket accepts and, once flushed, resets the request for
    /// the next one on the same socket.
    pub fn on_writable<R>(
        &mut self,
        resources: &R,
        server_name: &str,
    ) -> io::Result<Option<Direction>>
    where
        R: ResourceStore + ?Sized,
    {
        if self.direction != Direction::Write {
            return Ok(None);
        }

        if self.writer.is_none() {
            let response = respond(&self.request, resources, server_name);
            tracing::debug!(
                peer = %self.peer,
                status = response.status.as_u16(),
                path = self.request.path_str().unwrap_or("-"),
                "Sending response"
            );
            self.writer = Some(ResponseWriter::new(&response));
        }

        let flush = match self.writer.as_mut() {
            Some(writer) => writer.write_to(&mut self.stream)?,
            None => Flush::Done,
        };
        if flush == Flush::Pending {
            return Ok(None);
        }

        self.writer = None;
        self.request.reset();
        self.direction = Direction::Read;
        Ok(Some(Direction::Read))
    }
}

impl<S: Source> Connection<S> {
    pub fn register(&mut self, registry: &Registry, token: Token) -> io::Result<()> {
        registry.register(&mut self.stream, token, self.direction.interest())
    }

    pub fn reregister(&mut self, registry: &Registry, token: Token) -> io::Result<()> {
        registry.reregister(&mut self.stream, token, self.direction.interest())
    }

    pub fn deregister(&mut self, registry: &Registry) -> io::Result<()> {
        registry.deregister(&mut self.stream)
    }
}

/// Decides the response for a complete request.
///
/// A status recorded while parsing wins. Otherwise GET and HEAD resolve the
/// path against `resources` and every other method gets 405.
pub fn respond<R>(req: &Request, resources: &R, server_name: &str) -> Response
where
    R: ResourceStore + ?Sized,
{
    let builder = match (req.status(), req.method()) {
        (Some(status), _) => ResponseBuilder::new(status),
        (None, Some(Method::GET)) => serve(req, resources, true),
        (None, Some(Method::HEAD)) => serve(req, resources, false),
        (None, Some(_)) => ResponseBuilder::new(StatusCode::MethodNotAllowed),
        (None, None) => ResponseBuilder::new(StatusCode::BadRequest),
    };

    builder
        .header("Connection", "Keep-Alive")
        .header("Server", server_name)
        .build()
}

fn serve<R>(req: &Request, resources: &R, with_body: bool) -> ResponseBuilder
where
    R: ResourceStore + ?Sized,
{
    let target = req.path().unwrap_or_default();
    let Some(resource) = resources.lookup(target) else {
        return ResponseBuilder::new(StatusCode::NotFound);
    };

    match resources.read(resource) {
        Ok(contents) => {
            let builder = ResponseBuilder::new(StatusCode::Ok)
                .header("Content-Length", contents.len().to_string())
                .header("Content-Type", resource.media_type);
            if with_body {
                builder.body(contents)
            } else {
                builder
            }
        }
        Err(e) => {
            tracing::warn!(path = %resource.path.display(), error = %e, "Failed to read resource");
            ResponseBuilder::new(StatusCode::NotFound)
        }
    }
}
