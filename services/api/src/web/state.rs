//! services/api/src/web/state.rs
//!
//! Defines the application's shared state and the per-connection glue that
//! pushes session changes to the socket.

use crate::config::Config;
use palazzo_core::orchestrator::DesignServices;
use palazzo_core::ports::SessionObserver;
use palazzo_core::session::SessionSnapshot;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

//=========================================================================================
// AppState (Shared Across All Connections)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    /// The generation ports. Each connection builds its own session on top of them.
    pub services: DesignServices,
}

//=========================================================================================
// SnapshotRelay (Specific to One WebSocket Connection)
//=========================================================================================

/// Hands every session change to the connection's forwarder task.
///
/// The orchestrator calls this while holding its session lock, so it only
/// enqueues; the forwarder does the encoding and the socket write.
pub struct SnapshotRelay {
    tx: UnboundedSender<SessionSnapshot>,
}

impl SnapshotRelay {
    pub fn new(tx: UnboundedSender<SessionSnapshot>) -> Self {
        Self { tx }
    }
}

impl SessionObserver for SnapshotRelay {
    fn session_changed(&self, snapshot: &SessionSnapshot) {
        if self.tx.send(snapshot.clone()).is_err() {
            debug!("Snapshot dropped; the connection is closing.");
        }
    }
}
