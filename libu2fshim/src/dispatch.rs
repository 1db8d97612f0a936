use tokio::sync::mpsc;
use tracing::{debug, instrument, trace};

use crate::ops::u2f::response_for;
use crate::pending::OperationKind;
use crate::proto::envelope::{InboundEnvelope, Noise};
use crate::transport::{Channel, MessageEvent};
use crate::u2f::U2fApi;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    ForeignOrigin,
    NotText,
    Noise(Noise),
    /// A well-formed reply arrived with nothing pending to correlate it to.
    Uncorrelated,
    Delivered(OperationKind),
}

impl<C: Channel> U2fApi<C> {
    /// Handles one message seen on the page channel.
    ///
    /// There is no correlation id: a same-origin, correctly tagged reply is
    /// taken to answer whatever operation is pending. The slot is released
    /// before the callback runs, so the callback may start a new operation.
    #[instrument(skip_all, fields(channel = %self.channel))]
    pub fn handle_message(&self, event: &MessageEvent) -> DispatchOutcome {
        if event.origin != self.channel.origin() {
            trace!(origin = %event.origin, "Ignoring message from foreign origin");
            return DispatchOutcome::ForeignOrigin;
        }

        let Some(data) = event.data.as_text() else {
            trace!("Ignoring structured message");
            return DispatchOutcome::NotText;
        };

        let envelope = match InboundEnvelope::decode(data) {
            Ok(envelope) => envelope,
            Err(noise) => {
                trace!(%noise, "Ignoring channel traffic");
                return DispatchOutcome::Noise(noise);
            }
        };
        debug!(error = %envelope.message.error, "Got response");

        let Some(operation) = self.pending.release() else {
            debug!("No pending operation, ignoring response");
            return DispatchOutcome::Uncorrelated;
        };

        let kind = operation.kind;
        operation.complete(response_for(kind, &envelope.message));
        DispatchOutcome::Delivered(kind)
    }

    /// Dispatches every event until the sending side of the channel goes away.
    pub async fn listen(&self, mut events: mpsc::Receiver<MessageEvent>) {
        while let Some(event) = events.recv().await {
            self.handle_message(&event);
        }
        debug!("Message channel closed, listener exiting");
    }
}
