use std::collections::HashMap;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Context;
use mio::event::Event;
use mio::net::{TcpListener, TcpStream};
use mio::{Events, Interest, Poll, Token, Waker};
use tracing::{debug, error, info, warn};

use crate::config::ServerConfig;
use crate::http::buffer::BufferLimits;
use crate::http::connection::{Connection, Direction};
use crate::resource::ResourceStore;
use crate::server::listener;

const LISTENER: Token = Token(0);
const WAKER: Token = Token(1);
const FIRST_CONNECTION: usize = 2;

/// Stops a running [`Reactor`] from another thread.
#[derive(Clone)]
pub struct ShutdownHandle {
    requested: Arc<AtomicBool>,
    waker: Arc<Waker>,
}

impl ShutdownHandle {
    pub fn shutdown(&self) -> io::Result<()> {
        self.requested.store(true, Ordering::SeqCst);
        self.waker.wake()
    }
}

/// Single-threaded readiness loop owning the listener and every connection.
///
/// Each connection is registered for exactly one direction at a time: read
/// while its request is incomplete, write while its response is pending.
pub struct Reactor<R> {
    poll: Poll,
    listener: TcpListener,
    connections: HashMap<Token, Connection<TcpStream>>,
    next_token: usize,
    max_events: usize,
    limits: BufferLimits,
    server_name: String,
    resources: R,
    requested: Arc<AtomicBool>,
    waker: Arc<Waker>,
}

impl<R: ResourceStore> Reactor<R> {
    pub fn bind(cfg: &ServerConfig, resources: R) -> anyhow::Result<Self> {
        let mut listener = listener::bind(&cfg.listen_addr)?;
        let poll = Poll::new().context("failed to create event queue")?;
        poll.registry()
            .register(&mut listener, LISTENER, Interest::READABLE)
            .context("failed to register listening socket")?;
        let waker = Waker::new(poll.registry(), WAKER).context("failed to create waker")?;

        info!("Listening on {}", listener.local_addr()?);

        Ok(Self {
            poll,
            listener,
            connections: HashMap::new(),
            next_token: FIRST_CONNECTION,
            max_events: cfg.max_events.max(1),
            limits: cfg.buffer,
            server_name: cfg.server_name.clone(),
            resources,
            requested: Arc::new(AtomicBool::new(false)),
            waker: Arc::new(waker),
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            requested: Arc::clone(&self.requested),
            waker: Arc::clone(&self.waker),
        }
    }

    /// Runs until [`ShutdownHandle::shutdown`] is called.
    pub fn run(&mut self) -> anyhow::Result<()> {
        let mut events = Events::with_capacity(self.max_events);

        while !self.requested.load(Ordering::SeqCst) {
            if let Err(e) = self.poll.poll(&mut events, None) {
                if e.kind() != io::ErrorKind::Interrupted {
                    error!(error = %e, "Failed to wait for events");
                }
                continue;
            }

            for event in events.iter() {
                match event.token() {
                    LISTENER => self.accept(),
                    WAKER => {}
                    token => self.dispatch(token, event),
                }
            }
        }

        info!(open = self.connections.len(), "Reactor stopped");
        self.connections.clear();
        Ok(())
    }

    fn accept(&mut self) {
        loop {
            match self.listener.accept() {
                Ok((stream, peer)) => {
                    let token = Token(self.next_token);
                    self.next_token += 1;

                    let mut conn = Connection::new(stream, peer, self.limits);
                    if let Err(e) = conn.register(self.poll.registry(), token) {
                        error!(%peer, error = %e, "Failed to register connection");
                        continue;
                    }

                    debug!(%peer, token = token.0, "Accepted connection");
                    self.connections.insert(token, conn);
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    error!(error = %e, "accept() failed");
                    break;
                }
            }
        }
    }

    fn dispatch(&mut self, token: Token, event: &Event) {
        let Some(conn) = self.connections.get_mut(&token) else {
            return;
        };

        let result = match conn.direction() {
            Direction::Read
                if event.is_readable() || event.is_read_closed() || event.is_error() =>
            {
                conn.on_readable()
            }
            Direction::Write if event.is_writable() || event.is_error() => {
                conn.on_writable(&self.resources, &self.server_name)
            }
            _ => Ok(None),
        };

        let result = result.and_then(|changed| match changed {
            Some(_) => conn.reregister(self.poll.registry(), token),
            None => Ok(()),
        });

        if let Err(e) = result {
            self.close(token, e);
        }
    }

    fn close(&mut self, token: Token, cause: io::Error) {
        let Some(mut conn) = self.connections.remove(&token) else {
            return;
        };
        let peer = conn.peer();

        if let Err(e) = conn.deregister(self.poll.registry()) {
            debug!(%peer, error = %e, "Failed to deregister connection");
        }

        match cause.kind() {
            io::ErrorKind::UnexpectedEof => debug!(%peer, "Connection closed by peer"),
            _ => warn!(%peer, error = %cause, "Connection error"),
        }
    }
}
