use std::time::Duration;

use async_trait::async_trait;

use crate::errors::{ConnectionError, TransportError};
use crate::types::ConnectionDescriptor;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

/// Opens remote sessions. One session per batch.
pub trait RemoteTransport: Send + Sync {
    fn name(&self) -> &str;

    fn open_session(&self) -> Box<dyn RemoteSession>;
}

/// A single remote session. `exec` takes `&self` so one connected session can
/// serve several commands of a group concurrently.
#[async_trait]
pub trait RemoteSession: Send + Sync {
    async fn connect(&mut self, connection: &ConnectionDescriptor) -> Result<(), ConnectionError>;

    async fn exec(&self, command: &str, timeout: Duration) -> Result<CommandOutput, TransportError>;

    /// Tears the session down. Must be safe to call on a session that never
    /// connected.
    async fn dispose(&mut self);
}

/// Owns a session for the duration of a batch and guarantees `dispose` runs
/// exactly once, either through [`SessionGuard::release`] or, if the batch
/// future is dropped, from `Drop` on the current runtime.
pub(crate) struct SessionGuard {
    session: Option<Box<dyn RemoteSession>>,
}

impl SessionGuard {
    pub(crate) fn new(session: Box<dyn RemoteSession>) -> Self {
        Self {
            session: Some(session),
        }
    }

    pub(crate) fn session(&self) -> Option<&dyn RemoteSession> {
        self.session.as_deref()
    }

    pub(crate) fn session_mut(&mut self) -> Option<&mut (dyn RemoteSession + 'static)> {
        self.session.as_deref_mut()
    }

    pub(crate) async fn release(mut self) {
        if let Some(mut session) = self.session.take() {
            session.dispose().await;
        }
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        let Some(mut session) = self.session.take() else {
            return;
        };
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    session.dispose().await;
                });
            }
            Err(_) => tracing::warn!(
                target: "sshprobe.executor",
                "session dropped outside a runtime; dispose skipped"
            ),
        }
    }
}
