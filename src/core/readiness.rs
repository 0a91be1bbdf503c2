//! One-shot readiness signal for late-arriving dependencies.
//!
//! Content sub-forms load their library-specific fields asynchronously after a
//! content type is chosen. Consumers hold a [`Readiness`] and either check it
//! without blocking ([`Readiness::poll`]) on every dialog open, or wait with an
//! explicit deadline ([`Readiness::wait`]). The producer resolves it exactly
//! once by consuming its [`ReadySender`]; dropping the sender unresolved turns
//! every later check into [`ReadinessError::Abandoned`].

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::time::Duration;

/// Readiness failures
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadinessError {
    /// Deadline passed without the dependency arriving
    Timeout(Duration),
    /// Producer went away without resolving
    Abandoned,
}

impl std::fmt::Display for ReadinessError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReadinessError::Timeout(d) => {
                write!(f, "Dependency not ready after {} ms", d.as_millis())
            }
            ReadinessError::Abandoned => write!(f, "Dependency was dropped before becoming ready"),
        }
    }
}

impl std::error::Error for ReadinessError {}

/// Producer half. Consumed by [`ReadySender::resolve`].
#[derive(Debug)]
pub struct ReadySender<T> {
    tx: Sender<T>,
}

impl<T> ReadySender<T> {
    /// Resolve the signal. Returns false if the consumer is already gone.
    pub fn resolve(self, value: T) -> bool {
        self.tx.send(value).is_ok()
    }
}

/// Consumer half. Caches the value once received.
#[derive(Debug)]
pub struct Readiness<T> {
    rx: Option<Receiver<T>>,
    value: Option<T>,
}

/// Create a linked sender/readiness pair.
pub fn readiness<T>() -> (ReadySender<T>, Readiness<T>) {
    let (tx, rx) = bounded(1);
    (
        ReadySender { tx },
        Readiness {
            rx: Some(rx),
            value: None,
        },
    )
}

impl<T> Readiness<T> {
    /// Already-resolved signal (dependency was present synchronously).
    pub fn resolved(value: T) -> Self {
        Self {
            rx: None,
            value: Some(value),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.value.is_some()
    }

    /// Non-blocking check. `Ok(None)` means not ready yet.
    pub fn poll(&mut self) -> Result<Option<&T>, ReadinessError> {
        if self.value.is_none() {
            let Some(rx) = self.rx.as_ref() else {
                return Err(ReadinessError::Abandoned);
            };
            match rx.try_recv() {
                Ok(v) => {
                    self.value = Some(v);
                    self.rx = None;
                }
                Err(TryRecvError::Empty) => return Ok(None),
                Err(TryRecvError::Disconnected) => return Err(ReadinessError::Abandoned),
            }
        }
        Ok(self.value.as_ref())
    }

    /// Block until ready or until `timeout` elapses.
    pub fn wait(&mut self, timeout: Duration) -> Result<&T, ReadinessError> {
        if self.value.is_none() {
            let rx = self.rx.as_ref().ok_or(ReadinessError::Abandoned)?;
            let v = rx.recv_timeout(timeout).map_err(|e| match e {
                RecvTimeoutError::Timeout => ReadinessError::Timeout(timeout),
                RecvTimeoutError::Disconnected => ReadinessError::Abandoned,
            })?;
            self.value = Some(v);
            self.rx = None;
        }
        self.value.as_ref().ok_or(ReadinessError::Abandoned)
    }

    pub fn get(&self) -> Option<&T> {
        self.value.as_ref()
    }
}
