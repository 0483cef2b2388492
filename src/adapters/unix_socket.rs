//! Unix stream socket transport for the control protocol.
//!
//! ```text
//!  listener (non-blocking) ──accept ≤1/poll──▶ slot table [max_clients]
//!                                               │
//!            ┌──────────────────────────────────┘
//!            ▼
//!  Client { stream, LineDecoder, Outbox(1024 B) }
//!     read ≤ MAX_READS_PER_POLL chunks ─▶ lines ─▶ handler ─▶ Outbox ─▶ flush
//! ```
//!
//! Nothing here blocks: reads and writes stop at `WouldBlock`.  Replies that
//! cannot be written yet stay in the client's bounded outbox; a client whose
//! outbox would overflow is disconnected rather than stalling the frame loop.

use std::fs::{self, Permissions};
use std::io::{self, ErrorKind, Read, Write};
use std::os::unix::fs::PermissionsExt;
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use crate::error::{Error, Result};
use crate::protocol::codec::{Line, LineDecoder};
use crate::protocol::response::{MAX_RESPONSE_LEN, Response};
use crate::protocol::transport::{ClientId, ControlTransport};

/// Per-client outbound queue capacity (bytes).
pub const OUTBOX_CAPACITY: usize = 1024;
/// Bytes requested per `read` call.
pub const READ_CHUNK: usize = 256;
/// Upper bound on reads per client per poll, so one chatty client cannot
/// hold up the next frame.
pub const MAX_READS_PER_POLL: usize = 8;

// ═══════════════════════════════════════════════════════════════
//  Outbox
// ═══════════════════════════════════════════════════════════════

/// Bounded FIFO of reply bytes awaiting a non-blocking write.
#[derive(Debug, Default)]
pub struct Outbox {
    queue: heapless::Deque<u8, OUTBOX_CAPACITY>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `bytes` whole.  Returns `false` (queuing nothing) if they do not fit.
    pub fn push(&mut self, bytes: &[u8]) -> bool {
        if self.room() < bytes.len() {
            return false;
        }
        for &b in bytes {
            // Capacity was checked above.
            let _ = self.queue.push_back(b);
        }
        true
    }

    /// Write as much as the sink accepts without blocking.
    ///
    /// Returns the number of bytes written.  `WouldBlock` ends the flush
    /// quietly; any other error is returned.
    pub fn flush(&mut self, sink: &mut impl Write) -> io::Result<usize> {
        let mut written = 0;
        while !self.queue.is_empty() {
            let (front, _) = self.queue.as_slices();
            match sink.write(front) {
                Ok(0) => return Err(ErrorKind::WriteZero.into()),
                Ok(n) => {
                    for _ in 0..n {
                        self.queue.pop_front();
                    }
                    written += n;
                }
                Err(e) if e.kind() == ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
        Ok(written)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Free space in bytes.
    pub fn room(&self) -> usize {
        OUTBOX_CAPACITY - self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

/// Decode `data` and queue one reply per complete line.
///
/// A line is only handed to `handler` while the outbox can hold the
/// longest possible reply, so every applied command is answered.  Returns
/// `false` once a line had to be left unapplied.
fn dispatch_chunk<F>(
    slot: ClientId,
    decoder: &mut LineDecoder,
    outbox: &mut Outbox,
    data: &[u8],
    handler: &mut F,
) -> bool
where
    F: FnMut(ClientId, Line<'_>) -> Response,
{
    let mut answered = true;
    decoder.feed(data, |line| {
        if !answered || outbox.room() < MAX_RESPONSE_LEN {
            answered = false;
            return;
        }
        let reply = handler(slot, line).render();
        answered = outbox.push(reply.as_bytes());
    });
    answered
}

// ═══════════════════════════════════════════════════════════════
//  Server
// ═══════════════════════════════════════════════════════════════

struct Client {
    stream: UnixStream,
    decoder: LineDecoder,
    outbox: Outbox,
}

/// Why a client is being dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Hangup {
    Eof,
    ReadError,
    WriteError,
    Backpressure,
}

/// Listening socket plus a fixed table of client slots.
pub struct UnixSocketServer {
    listener: Option<UnixListener>,
    path: PathBuf,
    clients: Vec<Option<Client>>,
}

impl UnixSocketServer {
    /// Bind `path` (replacing a stale socket file) and open it to `mode`.
    pub fn bind(path: &Path, mode: u32, max_clients: usize) -> Result<Self> {
        match fs::remove_file(path) {
            Ok(()) => debug!("unix_socket: removed stale {}", path.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(Error::from_io("unlink socket path", &e)),
        }

        let listener = UnixListener::bind(path).map_err(|e| Error::from_io("bind", &e))?;
        listener
            .set_nonblocking(true)
            .map_err(|e| Error::from_io("set_nonblocking", &e))?;
        if let Err(e) = fs::set_permissions(path, Permissions::from_mode(mode)) {
            let _ = fs::remove_file(path);
            return Err(Error::from_io("chmod socket", &e));
        }

        info!(
            "unix_socket: listening on {} (mode {:o}, {} slots)",
            path.display(),
            mode,
            max_clients
        );
        Ok(Self {
            listener: Some(listener),
            path: path.to_path_buf(),
            clients: (0..max_clients).map(|_| None).collect(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn accept_one(&mut self) {
        let Some(listener) = &self.listener else {
            return;
        };
        let stream = match listener.accept() {
            Ok((stream, _)) => stream,
            Err(e) if e.kind() == ErrorKind::WouldBlock => return,
            Err(e) => {
                warn!("unix_socket: accept failed: {}", e);
                return;
            }
        };

        let Some(slot) = self.clients.iter().position(Option::is_none) else {
            warn!("CLIENT | too many clients, rejecting connection");
            return;
        };
        if let Err(e) = stream.set_nonblocking(true) {
            warn!("CLIENT | could not make connection non-blocking: {}", e);
            return;
        }
        self.clients[slot] = Some(Client {
            stream,
            decoder: LineDecoder::new(),
            outbox: Outbox::new(),
        });
        info!("CLIENT | connected (slot {})", slot);
    }

    /// Drain readable bytes, dispatch lines, and flush replies for one client.
    fn service_client<F>(slot: ClientId, client: &mut Client, handler: &mut F) -> Option<Hangup>
    where
        F: FnMut(ClientId, Line<'_>) -> Response,
    {
        let mut buf = [0_u8; READ_CHUNK];
        let mut hangup = None;

        for _ in 0..MAX_READS_PER_POLL {
            match client.stream.read(&mut buf) {
                Ok(0) => {
                    hangup = Some(Hangup::Eof);
                    break;
                }
                Ok(n) => {
                    let Client {
                        stream,
                        decoder,
                        outbox,
                    } = &mut *client;
                    if !dispatch_chunk(slot, decoder, outbox, &buf[..n], handler) {
                        return Some(Hangup::Backpressure);
                    }
                    if let Err(e) = outbox.flush(stream) {
                        debug!("CLIENT | slot {} write error: {}", slot, e);
                        return Some(Hangup::WriteError);
                    }
                }
                Err(e) if e.kind() == ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => {
                    debug!("CLIENT | slot {} read error: {}", slot, e);
                    hangup = Some(Hangup::ReadError);
                    break;
                }
            }
        }

        if let Err(e) = client.outbox.flush(&mut client.stream) {
            debug!("CLIENT | slot {} write error: {}", slot, e);
            return Some(Hangup::WriteError);
        }
        hangup
    }

    fn disconnect(&mut self, slot: ClientId, why: Hangup) {
        if self.clients[slot].take().is_some() {
            match why {
                Hangup::Backpressure => {
                    warn!("CLIENT | slot {} not reading replies, disconnected", slot);
                }
                _ => info!("CLIENT | disconnected (slot {}, {:?})", slot, why),
            }
        }
    }
}

impl ControlTransport for UnixSocketServer {
    fn poll<F>(&mut self, mut handler: F)
    where
        F: FnMut(ClientId, Line<'_>) -> Response,
    {
        self.accept_one();

        for slot in 0..self.clients.len() {
            let Some(client) = self.clients[slot].as_mut() else {
                continue;
            };
            if let Some(why) = Self::service_client(slot, client, &mut handler) {
                self.disconnect(slot, why);
            }
        }
    }

    fn connected(&self) -> usize {
        self.clients.iter().filter(|c| c.is_some()).count()
    }

    fn close_all(&mut self) {
        for slot in &mut self.clients {
            *slot = None;
        }
        if self.listener.take().is_some() {
            match fs::remove_file(&self.path) {
                Ok(()) => info!("unix_socket: removed {}", self.path.display()),
                Err(e) => warn!("unix_socket: could not remove {}: {}", self.path.display(), e),
            }
        }
    }
}

impl Drop for UnixSocketServer {
    fn drop(&mut self) {
        self.close_all();
    }
}
