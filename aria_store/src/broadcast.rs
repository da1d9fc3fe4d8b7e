use aria_core::{Broadcast, Outbound};
use async_trait::async_trait;
use tokio::sync::mpsc;

/// Prints outbound messages to the terminal, tagged with their destination.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutBroadcast;

#[async_trait]
impl Broadcast for StdoutBroadcast {
    async fn send(&self, message: Outbound) -> anyhow::Result<()> {
        println!("[{}] {}", message.destination.as_str(), message.text);
        Ok(())
    }
}

/// Forwards outbound messages into a channel.
#[derive(Debug, Clone)]
pub struct ChannelBroadcast {
    tx: mpsc::UnboundedSender<Outbound>,
}

impl ChannelBroadcast {
    #[must_use]
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Outbound>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl Broadcast for ChannelBroadcast {
    async fn send(&self, message: Outbound) -> anyhow::Result<()> {
        self.tx
            .send(message)
            .map_err(|_| anyhow::anyhow!("broadcast receiver dropped"))
    }
}
