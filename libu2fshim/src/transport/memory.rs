use std::collections::VecDeque;
use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use tracing::{instrument, trace};

use crate::transport::channel::{Channel, MessageEvent};
use crate::transport::error::{Error, TransportError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostedMessage {
    pub data: String,
    pub target_origin: String,
}

/// In-process channel that records everything posted to it.
#[derive(Debug)]
pub struct MemoryChannel {
    origin: String,
    outbox: Mutex<VecDeque<PostedMessage>>,
    closed: AtomicBool,
}

impl MemoryChannel {
    pub fn new(origin: &str) -> Self {
        Self {
            origin: String::from(origin),
            outbox: Mutex::new(VecDeque::new()),
            closed: AtomicBool::new(false),
        }
    }

    /// Further posts fail with `ChannelClosed`.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    pub fn take_posted(&self) -> Vec<PostedMessage> {
        let mut outbox = self.outbox.lock().unwrap_or_else(PoisonError::into_inner);
        outbox.drain(..).collect()
    }

    pub fn posted_count(&self) -> usize {
        self.outbox
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// A text message as delivered back to this page, from its own origin.
    pub fn event(&self, data: &str) -> MessageEvent {
        MessageEvent::text(&self.origin, data)
    }
}

impl Display for MemoryChannel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "memory:{}", self.origin)
    }
}

impl Channel for MemoryChannel {
    fn origin(&self) -> &str {
        &self.origin
    }

    #[instrument(skip_all, fields(channel = %self))]
    fn post_message(&self, data: &str, target_origin: &str) -> Result<(), Error> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(Error::Transport(TransportError::ChannelClosed));
        }
        let mut outbox = self
            .outbox
            .lock()
            .or(Err(Error::Transport(TransportError::PostFailed)))?;
        trace!(len = data.len(), %target_origin, "Posting message");
        outbox.push_back(PostedMessage {
            data: String::from(data),
            target_origin: String::from(target_origin),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::MemoryChannel;
    use crate::transport::error::{Error, TransportError};
    use crate::transport::{Channel, MessageData};

    #[test]
    fn records_posted_messages_in_order() {
        let channel = MemoryChannel::new("https://example.org");
        channel.post_message("one", "https://example.org").unwrap();
        channel.post_message("two", "https://example.org").unwrap();
        assert_eq!(channel.posted_count(), 2);

        let posted = channel.take_posted();
        assert_eq!(posted[0].data, "one");
        assert_eq!(posted[1].data, "two");
        assert_eq!(channel.posted_count(), 0);
    }

    #[test]
    fn closed_channel_rejects_posts() {
        let channel = MemoryChannel::new("https://example.org");
        channel.close();
        assert_eq!(
            channel.post_message("one", "https://example.org"),
            Err(Error::Transport(TransportError::ChannelClosed))
        );
        assert_eq!(channel.posted_count(), 0);
    }

    #[test]
    fn events_come_from_own_origin() {
        let channel = MemoryChannel::new("https://example.org");
        let event = channel.event("payload");
        assert_eq!(event.origin, "https://example.org");
        assert_eq!(event.data, MessageData::Text(String::from("payload")));
    }
}
