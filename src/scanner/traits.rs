//! Prober trait abstraction.
//!
//! Defines the interface the scheduler dispatches to, enabling alternative
//! probers and easier testing.

use crate::types::ScanTarget;
use async_trait::async_trait;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use std::time::Duration;

/// Lifecycle of a single connect probe.
///
/// `Idle -> Connecting -> {TimedOut, Connected, Errored} -> Done`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeState {
    /// Created, no socket yet.
    Idle,
    /// Connection attempt in flight.
    Connecting,
    /// Budget exhausted without a completed connection.
    TimedOut,
    /// Handshake completed.
    Connected,
    /// Socket setup, connect or poll failed.
    Errored,
    /// Socket released.
    Done,
}

impl ProbeState {
    /// Whether the state ends the connection attempt.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::TimedOut | Self::Connected | Self::Errored)
    }
}

impl fmt::Display for ProbeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Connecting => write!(f, "connecting"),
            Self::TimedOut => write!(f, "timed out"),
            Self::Connected => write!(f, "connected"),
            Self::Errored => write!(f, "errored"),
            Self::Done => write!(f, "done"),
        }
    }
}

/// Result of probing one target.
#[derive(Debug, Clone, Serialize)]
pub struct ProbeOutcome {
    /// The probed target.
    pub target: ScanTarget,
    /// Whether the handshake completed.
    pub reachable: bool,
    /// Terminal state the probe reached.
    pub state: ProbeState,
    /// Time from dispatch to outcome.
    pub elapsed: Duration,
}

impl ProbeOutcome {
    /// Build an outcome from the terminal state of a probe.
    pub fn new(target: ScanTarget, state: ProbeState, elapsed: Duration) -> Self {
        Self {
            target,
            reachable: state == ProbeState::Connected,
            state,
            elapsed,
        }
    }
}

/// Trait for liveness probe implementations.
#[async_trait]
pub trait Prober: Send + Sync {
    /// Probe one target. Never fails; errors map to an unreachable outcome.
    async fn probe(&self, target: ScanTarget) -> ProbeOutcome;
}

/// Prober that reports a fixed set of targets as reachable.
///
/// Useful for dry runs and for exercising the scheduler without a network.
#[derive(Debug, Clone, Default)]
pub struct FixedProber {
    reachable: HashSet<ScanTarget>,
}

impl FixedProber {
    /// Create a prober answering `reachable` for exactly these targets.
    pub fn new(reachable: impl IntoIterator<Item = ScanTarget>) -> Self {
        Self {
            reachable: reachable.into_iter().collect(),
        }
    }
}

#[async_trait]
impl Prober for FixedProber {
    async fn probe(&self, target: ScanTarget) -> ProbeOutcome {
        let state = if self.reachable.contains(&target) {
            ProbeState::Connected
        } else {
            ProbeState::TimedOut
        };
        ProbeOutcome::new(target, state, Duration::ZERO)
    }
}
