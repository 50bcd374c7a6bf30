//! One direction of the cross-context message channel.

use std::sync::Arc;

use tokio::sync::mpsc;

/// Posts serialized envelopes to the other side of the trust boundary.
///
/// Hosts implement this over their embedding primitive, for example
/// `postMessage` into the embedded frame. Delivery within one port must be
/// first-in-first-out.
#[uniffi::export(with_foreign)]
pub trait MessagePort: Send + Sync {
    /// Posts one JSON-encoded envelope.
    fn post_message(&self, message: String);
}

/// In-process [`MessagePort`] backed by an unbounded tokio channel.
#[derive(Debug, Clone)]
pub struct ChannelPort {
    sender: mpsc::UnboundedSender<String>,
}

impl ChannelPort {
    /// Creates a port and the receiver draining it.
    #[must_use]
    pub fn pair() -> (Arc<Self>, mpsc::UnboundedReceiver<String>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Arc::new(Self { sender }), receiver)
    }
}

impl MessagePort for ChannelPort {
    fn post_message(&self, message: String) {
        if self.sender.send(message).is_err() {
            log::debug!("message dropped: receiving side is closed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_delivers_in_order() {
        let (port, mut receiver) = ChannelPort::pair();
        port.post_message("first".to_string());
        port.post_message("second".to_string());

        assert_eq!(receiver.recv().await.as_deref(), Some("first"));
        assert_eq!(receiver.recv().await.as_deref(), Some("second"));
    }

    #[test]
    fn test_closed_receiver_is_not_an_error() {
        let (port, receiver) = ChannelPort::pair();
        drop(receiver);
        port.post_message("lost".to_string());
    }
}
