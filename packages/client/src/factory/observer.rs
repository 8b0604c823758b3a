//! Handshake observer

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use crate::connect::types::SessionMetadata;

type Callback = dyn Fn(&SessionMetadata) + Send + Sync;

/// Callback run once per established connection.
///
/// A panicking callback is caught and logged; it never reaches the caller
/// that requested the socket.
#[derive(Clone)]
pub struct HandshakeObserver {
    callback: Arc<Callback>,
}

impl HandshakeObserver {
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(&SessionMetadata) + Send + Sync + 'static,
    {
        Self {
            callback: Arc::new(callback),
        }
    }

    /// Observer that logs every completed handshake at info level.
    #[must_use]
    pub fn logging() -> Self {
        Self::new(|session| {
            tracing::info!(
                "Handshake completed with {} using {}",
                session.peer_host,
                session.protocol
            );
        })
    }

    pub(crate) fn notify(&self, session: &SessionMetadata) {
        let callback = &*self.callback;
        if panic::catch_unwind(AssertUnwindSafe(|| callback(session))).is_err() {
            tracing::warn!("Handshake observer panicked for {}", session.peer_host);
        }
    }
}

impl fmt::Debug for HandshakeObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandshakeObserver").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn session() -> SessionMetadata {
        SessionMetadata::new("vtov.studio", "TLSv1.2", "TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256")
    }

    #[test]
    fn notify_runs_callback() {
        let calls = Arc::new(AtomicUsize::new(0));
        let observer = {
            let calls = Arc::clone(&calls);
            HandshakeObserver::new(move |s| {
                assert_eq!(s.peer_host, "vtov.studio");
                calls.fetch_add(1, Ordering::SeqCst);
            })
        };

        observer.notify(&session());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn panicking_callback_is_contained() {
        let observer = HandshakeObserver::new(|_| panic!("observer failure"));
        observer.notify(&session());
        HandshakeObserver::logging().notify(&session());
    }
}
