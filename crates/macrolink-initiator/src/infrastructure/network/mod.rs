//! Network side of the initiator.
//!
//! [`MessageChannel`] is the production [`CommandSink`]: the firing and
//! replication use cases write straight into the framed TCP channel.

pub mod session;

use async_trait::async_trait;
use macrolink_core::{ChannelError, MessageChannel, WireMessage};
use tokio::io::{AsyncRead, AsyncWrite};

use crate::application::fire_macros::CommandSink;

#[async_trait]
impl<S> CommandSink for MessageChannel<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn send(&mut self, message: &WireMessage) -> Result<(), ChannelError> {
        MessageChannel::send(self, message).await
    }
}
