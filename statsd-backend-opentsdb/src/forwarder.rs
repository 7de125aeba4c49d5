use std::collections::HashMap;
use std::io::{self, Write};
use std::net::SocketAddr;
use std::sync::Arc;
use std::thread;
use std::time::{SystemTime, UNIX_EPOCH};

use bytes::Bytes;
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use mio::{net::TcpStream, Events, Interest, Poll, Registry, Token, Waker};
use tracing::{debug, error, trace};

use crate::health::DeliveryHealth;
use crate::namespace::Namespaces;

const WAKER: Token = Token(0);
const START_TOKEN: Token = Token(1);

// One payload per flush; a few slots absorb scheduling jitter without
// turning into a cross-cycle buffer.
const PENDING_PAYLOADS: usize = 8;

/// Keys for the delivery-health trailer lines appended once a connection is
/// established.
#[derive(Clone, Debug)]
pub(crate) struct TrailerKeys {
    last_exception: String,
    last_flush: String,
}

impl TrailerKeys {
    pub fn from_namespaces(namespaces: &Namespaces) -> TrailerKeys {
        let summary = namespaces.summary_key();
        TrailerKeys {
            last_exception: format!("{}.opentsdbStats.last_exception", summary),
            last_flush: format!("{}.opentsdbStats.last_flush", summary),
        }
    }
}

/// Handle used by the backend to hand one payload per flush to the delivery
/// thread.
pub(crate) struct ForwarderHandle {
    tx: Sender<String>,
    waker: Arc<Waker>,
    health: Arc<DeliveryHealth>,
}

impl ForwarderHandle {
    /// Hands a payload off without blocking.
    ///
    /// There is no cross-cycle buffering: if the delivery thread has fallen
    /// this far behind, the payload is dropped and the drop is recorded as a
    /// failed attempt.
    pub fn deliver(&self, payload: String) {
        match self.tx.try_send(payload) {
            Ok(()) => {
                let _ = self.waker.wake();
            }
            Err(TrySendError::Full(_)) => {
                self.health.record_failure(unix_now());
                debug!("delivery queue full, dropping payload");
            }
            Err(TrySendError::Disconnected(_)) => {
                self.health.record_failure(unix_now());
                debug!("delivery thread gone, dropping payload");
            }
        }
    }
}

/// Spawns the background delivery thread.
pub(crate) fn spawn(
    addr: SocketAddr,
    trailer: TrailerKeys,
    health: Arc<DeliveryHealth>,
) -> io::Result<ForwarderHandle> {
    let poll = Poll::new()?;
    let waker = Arc::new(Waker::new(poll.registry(), WAKER)?);
    let (tx, rx) = bounded(PENDING_PAYLOADS);

    let handle = ForwarderHandle { tx, waker, health: Arc::clone(&health) };
    let forwarder =
        Forwarder { addr, trailer, health, attempts: HashMap::new(), next_token: START_TOKEN };

    thread::Builder::new()
        .name("statsd-backend-opentsdb-forwarder".to_string())
        .spawn(move || forwarder.run(poll, rx))?;

    Ok(handle)
}

enum AttemptState {
    // Intermediate state while an attempt is being driven.
    Inconsistent,

    // Connection initiated, waiting for the socket to become ready.
    Connecting(String),

    // Connected; remaining bytes to write.
    Writing(Bytes),
}

struct Attempt {
    conn: TcpStream,
    state: AttemptState,
}

struct Forwarder {
    addr: SocketAddr,
    trailer: TrailerKeys,
    health: Arc<DeliveryHealth>,
    attempts: HashMap<Token, Attempt>,
    next_token: Token,
}

impl Forwarder {
    fn run(mut self, mut poll: Poll, rx: Receiver<String>) {
        let mut events = Events::with_capacity(64);

        loop {
            if let Err(e) = poll.poll(&mut events, None) {
                if interrupted(&e) {
                    continue;
                }
                error!(error = %e, "error during poll");
                continue;
            }

            for event in events.iter() {
                match event.token() {
                    WAKER => {
                        // Drain pending payloads; each gets its own
                        // single-shot connection.
                        loop {
                            match rx.try_recv() {
                                Ok(payload) => self.start_attempt(poll.registry(), payload),
                                Err(e) if e.is_empty() => break,
                                // Sender gone: the backend was dropped.
                                Err(_) => return,
                            }
                        }
                    }
                    token => {
                        if let Some(mut attempt) = self.attempts.remove(&token) {
                            if self.drive_attempt(&mut attempt) {
                                // Done, delivered or failed; dropping the
                                // stream closes the connection.
                                let _ = poll.registry().deregister(&mut attempt.conn);
                            } else {
                                self.attempts.insert(token, attempt);
                            }
                        }
                    }
                }
            }
        }
    }

    fn start_attempt(&mut self, registry: &Registry, payload: String) {
        match TcpStream::connect(self.addr) {
            Ok(mut conn) => {
                let token = next(&mut self.next_token);
                if let Err(e) = registry.register(&mut conn, token, Interest::WRITABLE) {
                    self.health.record_failure(unix_now());
                    debug!(error = %e, "failed to register connection attempt");
                    return;
                }
                trace!(?token, "connection attempt started");
                self.attempts.insert(token, Attempt { conn, state: AttemptState::Connecting(payload) });
            }
            Err(e) => {
                self.health.record_failure(unix_now());
                debug!(error = %e, "failed to initiate connection");
            }
        }
    }

    // Returns `true` once the attempt is finished, delivered or failed.
    fn drive_attempt(&self, attempt: &mut Attempt) -> bool {
        loop {
            match std::mem::replace(&mut attempt.state, AttemptState::Inconsistent) {
                AttemptState::Inconsistent => {
                    unreachable!("transitioned _from_ inconsistent state")
                }
                AttemptState::Connecting(payload) => {
                    // A failed nonblocking connect surfaces through
                    // `take_error` once the socket becomes ready.
                    match attempt.conn.take_error() {
                        Ok(None) => {}
                        Ok(Some(e)) | Err(e) => return self.fail(e),
                    }
                    match attempt.conn.peer_addr() {
                        Ok(_) => {
                            let buf = self.finish_payload(payload);
                            attempt.state = AttemptState::Writing(buf);
                        }
                        Err(ref e) if e.kind() == io::ErrorKind::NotConnected => {
                            // Still connecting; wait for the next event.
                            attempt.state = AttemptState::Connecting(payload);
                            return false;
                        }
                        Err(ref e) if would_block(e) => {
                            attempt.state = AttemptState::Connecting(payload);
                            return false;
                        }
                        Err(e) => return self.fail(e),
                    }
                }
                AttemptState::Writing(mut buf) => loop {
                    match attempt.conn.write(&buf) {
                        Ok(0) => {
                            let e = io::Error::new(
                                io::ErrorKind::WriteZero,
                                "connection closed during write",
                            );
                            return self.fail(e);
                        }
                        Ok(n) if n < buf.len() => {
                            // Keep writing the remainder until told to back
                            // off; the next writable event resumes us.
                            buf = buf.split_off(n);
                            trace!(written = n, remaining = buf.len(), "partial write");
                        }
                        Ok(_) => {
                            self.health.record_success(unix_now());
                            trace!("payload delivered");
                            return true;
                        }
                        Err(ref e) if would_block(e) => {
                            attempt.state = AttemptState::Writing(buf);
                            return false;
                        }
                        Err(ref e) if interrupted(e) => continue,
                        Err(e) => return self.fail(e),
                    }
                },
            }
        }
    }

    // The trailer reports the health timestamps from *before* this attempt.
    fn finish_payload(&self, payload: String) -> Bytes {
        let now = unix_now();
        let mut text = payload;
        text.push_str(&format!(
            "put {} {} {}\n",
            self.trailer.last_exception,
            now,
            self.health.last_exception()
        ));
        text.push_str(&format!(
            "put {} {} {}\n",
            self.trailer.last_flush,
            now,
            self.health.last_flush()
        ));
        Bytes::from(text)
    }

    fn fail(&self, error: io::Error) -> bool {
        self.health.record_failure(unix_now());
        debug!(error = %error, "delivery attempt failed");
        true
    }
}

fn next(current: &mut Token) -> Token {
    let next = current.0;
    current.0 += 1;
    Token(next)
}

fn unix_now() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or(0)
}

fn would_block(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::WouldBlock
}

fn interrupted(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::Interrupted
}
