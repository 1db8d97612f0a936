use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::oneshot;
use tracing::{debug, info, instrument, trace, warn};

use crate::config::ShimConfig;
use crate::ops::u2f::{RegisterCall, SignCall};
use crate::pending::{Callback, OperationKind, PendingOperation, PendingSlot};
use crate::proto::envelope::OutboundEnvelope;
use crate::proto::model::{ApiVersion, RegisterResponse, SignResponse, U2fError, U2fResponse};
use crate::transport::error::{Error, PlatformError};
use crate::transport::Channel;

/// The page-facing U2F object.
///
/// At most one operation is in flight. A `register` or `sign` issued while
/// another one is pending is dropped: nothing is sent and its callback never
/// runs. Completion arrives through [`U2fApi::handle_message`](crate::dispatch).
pub struct U2fApi<C: Channel> {
    pub(crate) channel: C,
    pub(crate) pending: PendingSlot,
    config: ShimConfig,
}

impl<C: Channel> U2fApi<C> {
    pub fn new(channel: C, config: ShimConfig) -> Self {
        info!(
            version = %config.extension_version,
            build = %config.extension_build,
            "FIDO U2F loaded"
        );
        Self {
            channel,
            pending: PendingSlot::new(),
            config,
        }
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    pub fn extension_version(&self) -> &str {
        &self.config.extension_version
    }

    pub fn extension_build(&self) -> &str {
        &self.config.extension_build
    }

    pub fn pending_kind(&self) -> Option<OperationKind> {
        self.pending.pending_kind()
    }

    /// `timeout` is accepted for compatibility and has no effect.
    #[instrument(skip_all, fields(channel = %self.channel, app_id = call.explicit_app_id()))]
    pub fn register(&self, call: RegisterCall, callback: Callback, timeout: Option<Duration>) {
        debug!("Registering");
        self.start(OperationKind::Register, || call.build_envelope(), callback, timeout)
    }

    /// `timeout` is accepted for compatibility and has no effect.
    #[instrument(skip_all, fields(channel = %self.channel, app_id = call.explicit_app_id()))]
    pub fn sign(&self, call: SignCall, callback: Callback, timeout: Option<Duration>) {
        debug!("Signing");
        self.start(OperationKind::Sign, || call.build_envelope(), callback, timeout)
    }

    /// Identifies this implementation to feature-detecting pages.
    pub fn is_safari(&self) -> bool {
        true
    }

    pub fn get_api_version<F>(&self, callback: F, _timeout: Option<Duration>)
    where
        F: FnOnce(ApiVersion),
    {
        callback(ApiVersion::default())
    }

    fn start<F>(&self, kind: OperationKind, build: F, callback: Callback, timeout: Option<Duration>)
    where
        F: FnOnce() -> Result<OutboundEnvelope, Error>,
    {
        if let Some(pending) = self.pending.pending_kind() {
            debug!(?pending, "Pending action exists, exit");
            return;
        }
        if let Some(timeout) = timeout {
            trace!(?timeout, "Ignoring requested timeout");
        }

        let data = match build().and_then(|envelope| envelope.encode()) {
            Ok(data) => data,
            Err(err) => {
                debug!(%err, "Request rejected locally");
                callback(U2fResponse::from(U2fError::other()));
                return;
            }
        };

        if let Err(busy) = self.pending.claim(PendingOperation::new(kind, callback)) {
            debug!(pending = ?busy.pending, "Pending action exists, exit");
            return;
        }

        if let Err(err) = self.channel.post_message(&data, self.channel.origin()) {
            warn!(%err, "Failed to post envelope, releasing pending slot");
            if let Some(operation) = self.pending.release() {
                operation.complete(U2fResponse::from(U2fError::with_message(err.to_string())));
            }
        }
    }
}

/// Awaitable form of the page API. Each call resolves once.
///
/// A call dropped because another operation is pending resolves to
/// `PlatformError::Busy`; a host that never replies leaves the future pending.
#[async_trait]
pub trait U2F {
    async fn u2f_register(&self, call: RegisterCall) -> Result<RegisterResponse, Error>;
    async fn u2f_sign(&self, call: SignCall) -> Result<SignResponse, Error>;
}

fn one_shot() -> (Callback, oneshot::Receiver<U2fResponse>) {
    let (sender, receiver) = oneshot::channel();
    let callback: Callback = Box::new(move |response| {
        let _ = sender.send(response);
    });
    (callback, receiver)
}

#[async_trait]
impl<C> U2F for U2fApi<C>
where
    C: Channel,
{
    #[instrument(skip_all)]
    async fn u2f_register(&self, call: RegisterCall) -> Result<RegisterResponse, Error> {
        let (callback, receiver) = one_shot();
        self.register(call, callback, None);
        match receiver.await {
            Ok(U2fResponse::Register(response)) => Ok(response),
            Ok(U2fResponse::Error(error)) => Err(Error::U2f(error)),
            Ok(U2fResponse::Sign(_)) => Err(Error::Platform(PlatformError::InvalidResult)),
            Err(_) => Err(Error::Platform(PlatformError::Busy)),
        }
    }

    #[instrument(skip_all)]
    async fn u2f_sign(&self, call: SignCall) -> Result<SignResponse, Error> {
        let (callback, receiver) = one_shot();
        self.sign(call, callback, None);
        match receiver.await {
            Ok(U2fResponse::Sign(response)) => Ok(response),
            Ok(U2fResponse::Error(error)) => Err(Error::U2f(error)),
            Ok(U2fResponse::Register(_)) => Err(Error::Platform(PlatformError::InvalidResult)),
            Err(_) => Err(Error::Platform(PlatformError::Busy)),
        }
    }
}
