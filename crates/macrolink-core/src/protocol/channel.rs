//! Framed, typed message channel over any async byte stream.
//!
//! [`MessageChannel`] owns one connected stream (a `TcpStream` in production,
//! `tokio::io::duplex` or a `tokio_test` mock in tests) and exposes:
//!
//! - `send` / `receive` for JSON [`WireMessage`]s, and
//! - `send_text` / `receive_text` for the plaintext handshake tokens,
//!
//! both over the same 4-byte length-prefixed framing.  `receive` keeps
//! reading `buffer_size`-byte chunks into a [`FrameBuffer`] until a whole
//! frame is available, so partial and coalesced reads are both handled.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::trace;

use crate::protocol::codec::{
    decode_message, encode_frame, encode_message, CodecError, FrameBuffer,
};
use crate::protocol::messages::WireMessage;

/// Errors surfaced by [`MessageChannel`].
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    /// The peer closed the connection (zero-length read or reset).
    #[error("connection closed by peer")]
    Closed,

    /// Any other I/O failure on the stream.
    #[error("channel I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The peer announced a frame larger than we accept.
    #[error("frame of {declared} bytes exceeds the {limit}-byte limit")]
    FrameTooLarge { declared: usize, limit: usize },

    /// A complete frame arrived but its payload could not be decoded.
    ///
    /// The frame has been consumed; the channel remains usable.
    #[error("could not decode message: {0}")]
    Decode(CodecError),

    /// An outbound message could not be serialised.
    #[error("could not encode message: {0}")]
    Encode(CodecError),

    /// A handshake frame was not valid UTF-8.
    #[error("handshake frame is not valid UTF-8")]
    NotText,
}

impl ChannelError {
    /// `true` for errors after which the stream must be abandoned.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ChannelError::Decode(_))
    }

    fn from_io(err: std::io::Error) -> Self {
        use std::io::ErrorKind;
        match err.kind() {
            ErrorKind::UnexpectedEof
            | ErrorKind::BrokenPipe
            | ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted => ChannelError::Closed,
            _ => ChannelError::Io(err),
        }
    }

    fn from_codec(err: CodecError) -> Self {
        match err {
            CodecError::FrameTooLarge { declared, limit } => {
                ChannelError::FrameTooLarge { declared, limit }
            }
            CodecError::Encode(_) => ChannelError::Encode(err),
            other => ChannelError::Decode(other),
        }
    }
}

/// A framed message channel over a single connected stream.
pub struct MessageChannel<S> {
    stream: S,
    frames: FrameBuffer,
    read_chunk: Vec<u8>,
    max_frame_len: usize,
}

impl<S> MessageChannel<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    /// Wraps `stream`.
    ///
    /// `buffer_size` is the size of each individual read; it does not bound
    /// message size.  `max_frame_len` bounds a single frame's payload.
    pub fn new(stream: S, buffer_size: usize, max_frame_len: usize) -> Self {
        Self {
            stream,
            frames: FrameBuffer::new(max_frame_len),
            read_chunk: vec![0u8; buffer_size.max(1)],
            max_frame_len,
        }
    }

    /// Encodes and writes one message.
    ///
    /// # Errors
    ///
    /// [`ChannelError::Closed`] if the peer has gone away, [`ChannelError::Io`]
    /// for other write failures, [`ChannelError::Encode`] /
    /// [`ChannelError::FrameTooLarge`] if the message cannot be framed.
    pub async fn send(&mut self, msg: &WireMessage) -> Result<(), ChannelError> {
        let payload = encode_message(msg).map_err(ChannelError::Encode)?;
        trace!(msg_type = msg.type_name(), bytes = payload.len(), "sending message");
        self.write_frame(&payload).await
    }

    /// Waits for and decodes the next message.
    ///
    /// # Errors
    ///
    /// [`ChannelError::Closed`] on EOF, [`ChannelError::Decode`] for a
    /// malformed or unknown payload (non-terminal), other variants for
    /// stream failures.
    pub async fn receive(&mut self) -> Result<WireMessage, ChannelError> {
        let payload = self.read_frame().await?;
        decode_message(&payload).map_err(ChannelError::Decode)
    }

    /// Writes a plaintext handshake token as one frame.
    ///
    /// # Errors
    ///
    /// Same as [`MessageChannel::send`].
    pub async fn send_text(&mut self, text: &str) -> Result<(), ChannelError> {
        self.write_frame(text.as_bytes()).await
    }

    /// Reads one frame and returns it as text.
    ///
    /// # Errors
    ///
    /// [`ChannelError::NotText`] if the frame is not UTF-8, otherwise the
    /// same as [`MessageChannel::receive`].
    pub async fn receive_text(&mut self) -> Result<String, ChannelError> {
        let payload = self.read_frame().await?;
        String::from_utf8(payload).map_err(|_| ChannelError::NotText)
    }

    /// Shuts down the write half so the peer observes EOF.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::Io`] if the shutdown itself fails.
    pub async fn close(&mut self) -> Result<(), ChannelError> {
        match self.stream.shutdown().await {
            Ok(()) => Ok(()),
            Err(e) => match ChannelError::from_io(e) {
                ChannelError::Closed => Ok(()),
                other => Err(other),
            },
        }
    }

    /// Returns the underlying stream.
    pub fn into_inner(self) -> S {
        self.stream
    }

    async fn write_frame(&mut self, payload: &[u8]) -> Result<(), ChannelError> {
        let frame = encode_frame(payload, self.max_frame_len).map_err(ChannelError::from_codec)?;
        self.stream
            .write_all(&frame)
            .await
            .map_err(ChannelError::from_io)?;
        self.stream.flush().await.map_err(ChannelError::from_io)
    }

    async fn read_frame(&mut self) -> Result<Vec<u8>, ChannelError> {
        loop {
            if let Some(frame) = self.frames.next_frame().map_err(ChannelError::from_codec)? {
                return Ok(frame);
            }

            let n = self
                .stream
                .read(&mut self.read_chunk)
                .await
                .map_err(ChannelError::from_io)?;
            if n == 0 {
                return Err(ChannelError::Closed);
            }
            self.frames.extend(&self.read_chunk[..n]);
        }
    }
}
