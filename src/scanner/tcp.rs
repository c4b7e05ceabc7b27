//! TCP connect probe.
//!
//! Starts a non-blocking connect and polls the socket every `tick` until the
//! handshake completes, fails, or the timeout budget runs out. No payload is
//! sent or read; the socket is dropped (closed) on every exit path.

use crate::config::ProbeTiming;
use crate::scanner::traits::{ProbeOutcome, ProbeState, Prober};
use crate::types::ScanTarget;
use async_trait::async_trait;
use socket2::{Domain, Protocol, SockAddr, Socket, Type};
use std::io;
use std::net::SocketAddr;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, trace};

/// TCP connect liveness probe.
///
/// Does not require elevated privileges.
#[derive(Debug, Clone, Copy)]
pub struct ConnectProbe {
    timing: ProbeTiming,
}

impl ConnectProbe {
    /// Create a new probe with the given timing.
    pub fn new(timing: ProbeTiming) -> Self {
        Self { timing }
    }

    /// Drive one connection attempt to a terminal state.
    async fn run(&self, addr: SocketAddr) -> ProbeState {
        let mut state = ProbeState::Idle;
        trace!("{} {}", addr, state);

        let socket = match start_connect(addr) {
            Ok(socket) => socket,
            Err(e) => {
                debug!("connect to {} failed to start: {}", addr, e);
                return ProbeState::Errored;
            }
        };
        state = ProbeState::Connecting;
        trace!("{} {}", addr, state);

        let tick = self.timing.tick();
        let budget = self.timing.timeout();
        let mut waited = Duration::ZERO;

        while waited < budget {
            sleep(tick).await;
            waited += tick;

            match poll_connect(&socket) {
                Ok(true) => {
                    state = ProbeState::Connected;
                    break;
                }
                Ok(false) => {}
                Err(e) => {
                    debug!("connect to {} failed: {}", addr, e);
                    state = ProbeState::Errored;
                    break;
                }
            }
        }

        if state == ProbeState::Connecting {
            state = ProbeState::TimedOut;
        }

        debug_assert!(state.is_terminal());
        drop(socket);
        trace!("{} {} -> {}", addr, state, ProbeState::Done);
        state
    }
}

#[async_trait]
impl Prober for ConnectProbe {
    async fn probe(&self, target: ScanTarget) -> ProbeOutcome {
        let start = Instant::now();
        let state = self.run(target.socket_addr()).await;
        ProbeOutcome::new(target, state, start.elapsed())
    }
}

/// Open a non-blocking socket and initiate the handshake.
fn start_connect(addr: SocketAddr) -> io::Result<Socket> {
    let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))?;
    socket.set_nonblocking(true)?;

    match socket.connect(&SockAddr::from(addr)) {
        Ok(()) => Ok(socket),
        Err(e) if connect_in_progress(&e) => Ok(socket),
        Err(e) => Err(e),
    }
}

/// Check a pending connect: `Ok(true)` once established, `Ok(false)` while
/// still in progress.
fn poll_connect(socket: &Socket) -> io::Result<bool> {
    if let Some(e) = socket.take_error()? {
        return Err(e);
    }

    match socket.peer_addr() {
        Ok(_) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotConnected => Ok(false),
        Err(e) => Err(e),
    }
}

fn connect_in_progress(e: &io::Error) -> bool {
    if e.kind() == io::ErrorKind::WouldBlock {
        return true;
    }
    #[cfg(unix)]
    {
        e.raw_os_error() == Some(libc::EINPROGRESS)
    }
    #[cfg(not(unix))]
    {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{Ipv4Addr, TcpListener};

    fn timing() -> ProbeTiming {
        ProbeTiming::normalize(500, 10)
    }

    #[tokio::test]
    async fn test_listening_port_is_reachable() {
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).unwrap();
        let target = ScanTarget::from(listener.local_addr().unwrap());

        let outcome = ConnectProbe::new(timing()).probe(target).await;

        assert!(outcome.reachable);
        assert_eq!(outcome.state, ProbeState::Connected);
        assert!(outcome.elapsed < timing().timeout());
    }

    #[tokio::test]
    async fn test_closed_port_is_unreachable_within_budget() {
        let port = {
            let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).unwrap();
            listener.local_addr().unwrap().port()
        };
        let target = ScanTarget::new(Ipv4Addr::LOCALHOST.into(), port);

        let outcome = ConnectProbe::new(timing()).probe(target).await;

        assert!(!outcome.reachable);
        assert!(matches!(
            outcome.state,
            ProbeState::Errored | ProbeState::TimedOut
        ));
        // Scheduling slack on busy CI machines on top of timeout + tick.
        assert!(outcome.elapsed <= timing().timeout() + timing().tick() + Duration::from_millis(200));
    }

    #[tokio::test]
    async fn test_port_zero_errors_out() {
        let target = ScanTarget::new(Ipv4Addr::LOCALHOST.into(), 0);
        let outcome = ConnectProbe::new(ProbeTiming::normalize(50, 10)).probe(target).await;
        assert!(!outcome.reachable);
    }
}
