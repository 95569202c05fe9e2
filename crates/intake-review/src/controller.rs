//! Drives the transport between a session's `begin_*` and `finish_*` steps,
//! bounding every call with a per-operation timeout.

use std::future::Future;
use std::time::Duration;

use intake_transport::{Operation, Transport, TransportError};
use tracing::{info, warn};

use crate::ReviewError;
use crate::session::Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerConfig {
    pub upload_timeout: Duration,
    pub confirm_timeout: Duration,
    pub delete_timeout: Duration,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            upload_timeout: Duration::from_secs(120),
            confirm_timeout: Duration::from_secs(60),
            delete_timeout: Duration::from_secs(30),
        }
    }
}

/// Owns the session and the transport for one operator.
pub struct Controller<T> {
    session: Session,
    transport: T,
    config: ControllerConfig,
}

impl<T: Transport> Controller<T> {
    pub fn new(transport: T) -> Self {
        Self {
            session: Session::new(),
            transport,
            config: ControllerConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ControllerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Local (non-network) operations go straight to the session.
    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Upload the selected file. Local refusals are returned as errors; a
    /// transport failure settles the session back to idle with a notice.
    pub async fn upload(&mut self) -> Result<(), ReviewError> {
        let file = self.session.begin_upload()?;
        info!(file = %file.file_name, bytes = file.size_bytes(), "upload dispatched");
        let settlement = Settlement::new(&mut self.session, Operation::Upload);
        let result = bounded(
            Operation::Upload,
            self.config.upload_timeout,
            self.transport.upload(&file),
        )
        .await;
        settlement.finish(|session| session.finish_upload(result))
    }

    /// Submit the entered PIN and commit the record.
    pub async fn submit_pin(&mut self) -> Result<(), ReviewError> {
        let pending = self.session.submit_pin()?;
        let settlement = Settlement::new(&mut self.session, Operation::Confirm);
        let result = bounded(
            Operation::Confirm,
            self.config.confirm_timeout,
            pending.dispatch(&self.transport),
        )
        .await;
        settlement.finish(|session| session.finish_confirm(result))
    }

    /// Answer yes to the delete-all prompt.
    pub async fn confirm_delete(&mut self) -> Result<(), ReviewError> {
        self.session.begin_delete()?;
        info!("delete-all dispatched");
        let settlement = Settlement::new(&mut self.session, Operation::Delete);
        let result = bounded(
            Operation::Delete,
            self.config.delete_timeout,
            self.transport.delete_all(),
        )
        .await;
        settlement.finish(|session| session.finish_delete(result))
    }
}

/// Holds the session while a call is in flight. Dropped unsettled (the
/// caller dropped the future), it settles the operation as cancelled.
struct Settlement<'a> {
    session: &'a mut Session,
    operation: Operation,
    settled: bool,
}

impl<'a> Settlement<'a> {
    fn new(session: &'a mut Session, operation: Operation) -> Self {
        Self {
            session,
            operation,
            settled: false,
        }
    }

    fn finish<R>(mut self, settle: impl FnOnce(&mut Session) -> R) -> R {
        self.settled = true;
        settle(&mut *self.session)
    }
}

impl Drop for Settlement<'_> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        if let Err(e) = self.session.abandon(self.operation) {
            warn!(operation = %self.operation, error = %e, "could not settle dropped call");
        }
    }
}

async fn bounded<R>(
    operation: Operation,
    limit: Duration,
    call: impl Future<Output = Result<R, TransportError>>,
) -> Result<R, TransportError> {
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => {
            warn!(operation = %operation, ?limit, "transport call timed out");
            Err(TransportError::TimedOut { operation, limit })
        }
    }
}
