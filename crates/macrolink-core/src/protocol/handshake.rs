//! Both halves of the challenge/response handshake.
//!
//! The handshake runs over the same framed channel as the session but
//! exchanges bare text tokens instead of JSON.  Each side bounds the whole
//! exchange with a timeout; any failure is terminal for the connection.

use std::time::Duration;

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, warn};

use crate::protocol::challenge::{
    generate_challenge, hash_challenge, is_well_formed_challenge, validate_response,
    AUTH_FAILED, AUTH_SUCCESS,
};
use crate::protocol::channel::{ChannelError, MessageChannel};

/// Errors that end a handshake.
#[derive(Debug, Error)]
pub enum HandshakeError {
    /// The digest did not match (responder) or the responder said so (initiator).
    #[error("authentication failed")]
    AuthenticationFailed,

    /// The peer closed the connection mid-handshake.
    #[error("connection lost during handshake")]
    ConnectionLost,

    /// The initiator received something that is not a numeric challenge.
    #[error("malformed challenge: {0:?}")]
    MalformedChallenge(String),

    /// The responder's status token was neither success nor failure.
    #[error("unexpected handshake status: {0:?}")]
    UnexpectedStatus(String),

    /// The exchange did not complete within the configured time.
    #[error("handshake timed out after {0:?}")]
    Timeout(Duration),

    /// Any other channel failure.
    #[error("handshake channel error: {0}")]
    Channel(ChannelError),
}

impl From<ChannelError> for HandshakeError {
    fn from(err: ChannelError) -> Self {
        match err {
            ChannelError::Closed => HandshakeError::ConnectionLost,
            other => HandshakeError::Channel(other),
        }
    }
}

/// Responder side: issue a challenge, check the digest, report the verdict.
///
/// On a digest mismatch `AUTH_FAILED` is sent (best effort) before
/// returning [`HandshakeError::AuthenticationFailed`].
///
/// # Errors
///
/// See [`HandshakeError`].
pub async fn respond<S>(
    channel: &mut MessageChannel<S>,
    secret: &str,
    timeout: Duration,
) -> Result<(), HandshakeError>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    tokio::time::timeout(timeout, respond_inner(channel, secret))
        .await
        .map_err(|_| HandshakeError::Timeout(timeout))?
}

async fn respond_inner<S>(channel: &mut MessageChannel<S>, secret: &str) -> Result<(), HandshakeError>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    let challenge = generate_challenge();
    channel.send_text(&challenge).await?;
    debug!("challenge sent");

    let response = match channel.receive_text().await {
        Ok(response) => response,
        Err(ChannelError::NotText) => String::new(),
        Err(e) => return Err(e.into()),
    };

    if validate_response(response.trim(), &challenge, secret) {
        channel.send_text(AUTH_SUCCESS).await?;
        debug!("challenge response accepted");
        Ok(())
    } else {
        warn!("challenge response rejected");
        if let Err(e) = channel.send_text(AUTH_FAILED).await {
            debug!(error = %e, "could not deliver AUTH_FAILED");
        }
        Err(HandshakeError::AuthenticationFailed)
    }
}

/// Initiator side: answer the challenge and wait for the verdict.
///
/// # Errors
///
/// See [`HandshakeError`].
pub async fn initiate<S>(
    channel: &mut MessageChannel<S>,
    secret: &str,
    timeout: Duration,
) -> Result<(), HandshakeError>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    tokio::time::timeout(timeout, initiate_inner(channel, secret))
        .await
        .map_err(|_| HandshakeError::Timeout(timeout))?
}

async fn initiate_inner<S>(channel: &mut MessageChannel<S>, secret: &str) -> Result<(), HandshakeError>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    let challenge = channel.receive_text().await?;
    let challenge = challenge.trim();
    if !is_well_formed_challenge(challenge) {
        return Err(HandshakeError::MalformedChallenge(challenge.to_string()));
    }

    channel.send_text(&hash_challenge(challenge, secret)).await?;

    let status = channel.receive_text().await?;
    match status.trim() {
        AUTH_SUCCESS => Ok(()),
        AUTH_FAILED => Err(HandshakeError::AuthenticationFailed),
        other => Err(HandshakeError::UnexpectedStatus(other.to_string())),
    }
}
