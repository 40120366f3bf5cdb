//! ResponderSession: serves one initiator connection.
//!
//! ```text
//! Disconnected ─► Authenticating ─► Ready ─► Active ─► Closing ─► Closed
//!                       │                       │
//!                       └── AUTH_FAILED ────────┴──► Closed
//! ```
//!
//! The dispatch loop reads one message at a time and hands it to the
//! [`ExecuteCommandUseCase`].  Messages that fail to decode are logged and
//! dropped; injector failures are logged and the loop keeps going.  End of
//! stream ends the session with [`SessionError::ConnectionLost`].

use std::sync::Arc;

use macrolink_core::protocol::handshake;
use macrolink_core::{
    session_pair, ChannelError, CodecError, HandshakeError, MessageChannel, PeerConfig,
    SessionControl, SessionHandle, SessionState,
};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpListener;
use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::application::execute_command::{CommandOutcome, ExecuteCommandUseCase};

/// Errors that end a responder session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Binding the listening socket failed.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
    /// Accepting a connection failed.
    #[error("failed to accept connection: {0}")]
    Accept(#[source] std::io::Error),
    /// The initiator's digest did not match.
    #[error("authentication failed")]
    AuthenticationFailed,
    /// The initiator closed the connection.
    #[error("connection to initiator lost")]
    ConnectionLost,
    /// Any other handshake failure.
    #[error("handshake failed: {0}")]
    Handshake(HandshakeError),
    /// Any other channel failure.
    #[error("channel error: {0}")]
    Channel(ChannelError),
}

impl From<HandshakeError> for SessionError {
    fn from(err: HandshakeError) -> Self {
        match err {
            HandshakeError::AuthenticationFailed => SessionError::AuthenticationFailed,
            HandshakeError::ConnectionLost => SessionError::ConnectionLost,
            other => SessionError::Handshake(other),
        }
    }
}

impl From<ChannelError> for SessionError {
    fn from(err: ChannelError) -> Self {
        match err {
            ChannelError::Closed => SessionError::ConnectionLost,
            other => SessionError::Channel(other),
        }
    }
}

/// How a session that did not fail came to an end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    /// The initiator sent `exit`.
    ExitReceived,
    /// [`SessionHandle::close`] was called.
    ClosedByUser,
}

/// Binds the configured `network.host:network.port`.
///
/// # Errors
///
/// Returns [`SessionError::Bind`] if the address is unavailable.
pub async fn bind(config: &PeerConfig) -> Result<TcpListener, SessionError> {
    let addr = config.network.address();
    TcpListener::bind(&addr)
        .await
        .map_err(|source| SessionError::Bind { addr, source })
}

/// Drives one responder connection.
pub struct ResponderSession {
    config: Arc<PeerConfig>,
    executor: Arc<ExecuteCommandUseCase>,
    control: SessionControl,
}

impl ResponderSession {
    /// Creates a session and the handle used to observe and close it.
    pub fn new(
        config: Arc<PeerConfig>,
        executor: Arc<ExecuteCommandUseCase>,
    ) -> (Self, SessionHandle) {
        let (handle, control) = session_pair();
        (
            Self {
                config,
                executor,
                control,
            },
            handle,
        )
    }

    /// Waits for one initiator on `listener` and serves it.
    ///
    /// # Errors
    ///
    /// See [`SessionError`].  The session is `Closed` when this returns.
    pub async fn serve(mut self, listener: &TcpListener) -> Result<SessionOutcome, SessionError> {
        let span = info_span!("responder_session", session = %self.control.id());

        let accepted = async {
            debug!("waiting for initiator");
            tokio::select! {
                _ = self.control.shutdown_requested() => None,
                result = listener.accept() => Some(result),
            }
        }
        .instrument(span.clone())
        .await;

        match accepted {
            None => {
                self.control.set_state(SessionState::Closed);
                Ok(SessionOutcome::ClosedByUser)
            }
            Some(Err(source)) => {
                self.control.set_state(SessionState::Closed);
                let err = SessionError::Accept(source);
                span.in_scope(|| error!(error = %err, "session failed"));
                Err(err)
            }
            Some(Ok((stream, peer))) => {
                span.in_scope(|| info!(%peer, "initiator connected"));
                if let Err(e) = stream.set_nodelay(true) {
                    span.in_scope(|| debug!(error = %e, "could not set TCP_NODELAY"));
                }
                self.run_on(stream).instrument(span).await
            }
        }
    }

    /// Runs the session over an already accepted stream.
    ///
    /// # Errors
    ///
    /// See [`SessionError`].  The session is `Closed` when this returns.
    pub async fn run_on<S>(mut self, stream: S) -> Result<SessionOutcome, SessionError>
    where
        S: AsyncRead + AsyncWrite + Unpin + Send,
    {
        let net = &self.config.network;
        let mut channel = MessageChannel::new(stream, net.buffer_size, net.max_frame_len);

        let result = self.drive(&mut channel).await;

        // A failed handshake never entered the loop; go straight to Closed.
        if !matches!(result, Err(SessionError::AuthenticationFailed)) {
            self.control.set_state(SessionState::Closing);
        }
        if let Err(e) = channel.close().await {
            debug!(error = %e, "error while closing channel");
        }
        self.control.set_state(SessionState::Closed);

        match &result {
            Ok(outcome) => info!(?outcome, "session ended"),
            Err(e) => error!(error = %e, "session failed"),
        }
        result
    }

    async fn drive<S>(
        &mut self,
        channel: &mut MessageChannel<S>,
    ) -> Result<SessionOutcome, SessionError>
    where
        S: AsyncRead + AsyncWrite + Unpin + Send,
    {
        // ── Authenticating ────────────────────────────────────────────────────
        self.control.set_state(SessionState::Authenticating);
        let secret = self.config.auth.shared_secret.clone();
        let timeout = self.config.network.handshake_timeout();
        tokio::select! {
            _ = self.control.shutdown_requested() => return Ok(SessionOutcome::ClosedByUser),
            result = handshake::respond(channel, &secret, timeout) => result?,
        }
        info!("initiator authenticated");
        self.control.set_state(SessionState::Ready);
        self.control.set_state(SessionState::Active);

        // ── Dispatch loop ─────────────────────────────────────────────────────
        loop {
            let message = tokio::select! {
                biased;
                _ = self.control.shutdown_requested() => return Ok(SessionOutcome::ClosedByUser),
                inbound = channel.receive() => inbound,
            };

            let message = match message {
                Ok(message) => message,
                Err(ChannelError::Decode(CodecError::UnknownType(kind))) => {
                    warn!(msg_type = %kind, "dropping message of unknown type");
                    continue;
                }
                Err(ChannelError::Decode(e)) => {
                    warn!(error = %e, "dropping malformed message");
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            match self.executor.execute(&message) {
                Ok(CommandOutcome::Exit) => {
                    info!("exit received");
                    return Ok(SessionOutcome::ExitReceived);
                }
                Ok(CommandOutcome::Injected | CommandOutcome::Synced(_)) => {}
                Err(e) => warn!(msg_type = message.type_name(), error = %e, "injection failed"),
            }
        }
    }
}
