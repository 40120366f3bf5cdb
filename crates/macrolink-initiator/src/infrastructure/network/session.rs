//! InitiatorSession: one connection to the responder, from connect to close.
//!
//! ```text
//! Disconnected ─► Connecting ─► Authenticating ─► Ready ─► Active ─► Closing ─► Closed
//!                     │               │              │        │
//!                     └───────────────┴──────────────┴────────┴──► (on error) Closing ─► Closed
//! ```
//!
//! After authentication the pending transaction log is pushed once, then the
//! active loop runs every `trigger.poll_interval`:
//!
//! 1. wait for the poll interval, a shutdown request or inbound bytes,
//! 2. push the pending log if it is non-empty,
//! 3. run one [`MacroFiringUseCase`] cycle, abandoning it (and any
//!    cooldown pause) if the session is closed meanwhile.
//!
//! The responder never sends anything after the handshake; reading during
//! the idle wait only serves to notice promptly when it disconnects.

use std::sync::Arc;

use macrolink_core::protocol::handshake;
use macrolink_core::{
    session_pair, ChannelError, HandshakeError, HotkeyTrigger, MacroRegistry, MessageChannel,
    PeerConfig, SessionControl, SessionHandle, SessionState,
};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::application::fire_macros::MacroFiringUseCase;
use crate::application::replicate::push_pending;

/// Errors that end an initiator session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// TCP connection to the responder failed.
    #[error("failed to connect to responder at {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },
    /// The responder rejected our digest.
    #[error("authentication failed")]
    AuthenticationFailed,
    /// The responder closed the connection.
    #[error("connection to responder lost")]
    ConnectionLost,
    /// Any other handshake failure (timeout, malformed challenge, ...).
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
    /// A macro sent `exit`.
    ExitSent,
    /// [`SessionHandle::close`] was called.
    ClosedByUser,
}

/// Drives one initiator connection.
pub struct InitiatorSession {
    config: Arc<PeerConfig>,
    registry: Arc<MacroRegistry>,
    trigger: Arc<HotkeyTrigger>,
    control: SessionControl,
}

impl InitiatorSession {
    /// Creates a session and the handle used to observe and close it.
    pub fn new(
        config: Arc<PeerConfig>,
        registry: Arc<MacroRegistry>,
        trigger: Arc<HotkeyTrigger>,
    ) -> (Self, SessionHandle) {
        let (handle, control) = session_pair();
        (
            Self {
                config,
                registry,
                trigger,
                control,
            },
            handle,
        )
    }

    /// Connects to `network.host:network.port` and runs the session.
    ///
    /// # Errors
    ///
    /// See [`SessionError`].  The session is `Closed` when this returns.
    pub async fn run(mut self) -> Result<SessionOutcome, SessionError> {
        let addr = self.config.network.address();
        let span = info_span!("initiator_session", session = %self.control.id());

        self.control.set_state(SessionState::Connecting);
        let connect = async {
            info!(%addr, "connecting to responder");
            tokio::select! {
                _ = self.control.shutdown_requested() => None,
                result = TcpStream::connect(&addr) => Some(result),
            }
        }
        .instrument(span.clone())
        .await;

        match connect {
            None => {
                self.control.set_state(SessionState::Closed);
                Ok(SessionOutcome::ClosedByUser)
            }
            Some(Err(source)) => {
                self.control.set_state(SessionState::Closed);
                let err = SessionError::Connect { addr, source };
                span.in_scope(|| error!(error = %err, "session failed"));
                Err(err)
            }
            Some(Ok(stream)) => {
                if let Err(e) = stream.set_nodelay(true) {
                    span.in_scope(|| debug!(error = %e, "could not set TCP_NODELAY"));
                }
                self.run_on(stream).instrument(span).await
            }
        }
    }

    /// Runs the session over an already connected stream.
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

        self.control.set_state(SessionState::Closing);
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
            result = handshake::initiate(channel, &secret, timeout) => result?,
        }
        info!("authenticated with responder");
        self.control.set_state(SessionState::Ready);

        // ── Initial sync ──────────────────────────────────────────────────────
        let pushed = push_pending(self.registry.log(), channel).await?;
        if pushed > 0 {
            info!(count = pushed, "initial macro sync sent");
        }
        self.control.set_state(SessionState::Active);

        // ── Active loop ───────────────────────────────────────────────────────
        let firing = MacroFiringUseCase::new(
            Arc::clone(&self.registry),
            Arc::clone(&self.trigger),
            self.config.trigger.cooldown(),
        );
        let poll_interval = self.config.trigger.poll_interval();

        loop {
            tokio::select! {
                biased;
                _ = self.control.shutdown_requested() => return Ok(SessionOutcome::ClosedByUser),
                inbound = channel.receive() => match inbound {
                    Ok(msg) => warn!(msg_type = msg.type_name(), "ignoring unexpected message from responder"),
                    Err(ChannelError::Decode(e)) => warn!(error = %e, "dropping undecodable message from responder"),
                    Err(e) => return Err(e.into()),
                },
                _ = tokio::time::sleep(poll_interval) => {}
            }

            let pushed = push_pending(self.registry.log(), channel).await?;
            if pushed > 0 {
                info!(count = pushed, "macro changes synced");
            }

            // The cycle includes the cooldown pause, so it must yield to close.
            let outcome = tokio::select! {
                biased;
                _ = self.control.shutdown_requested() => return Ok(SessionOutcome::ClosedByUser),
                fired = firing.poll_once(channel) => {
                    fired.map_err(|e| SessionError::from(e.into_channel_error()))?
                }
            };
            if outcome.exit_sent {
                info!("exit sent; closing session");
                return Ok(SessionOutcome::ExitSent);
            }
        }
    }
}
