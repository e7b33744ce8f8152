//! Phone/OTP authentication interface.

use std::pin::Pin;
use std::task::{Context, Poll};

use async_trait::async_trait;
use futures::stream::{BoxStream, Stream, StreamExt};
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::error::Result;

/// The identity returned by the auth provider after sign-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthIdentity {
    /// Stable user id.
    pub uid: String,
    pub phone_number: Option<String>,
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub photo_url: Option<String>,
}

impl AuthIdentity {
    /// An identity with only a uid and phone number.
    pub fn with_phone(uid: impl Into<String>, phone_number: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            phone_number: Some(phone_number.into()),
            display_name: None,
            email: None,
            photo_url: None,
        }
    }
}

/// Opaque handle for a pending phone verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationHandle {
    /// Provider-issued verification id.
    pub verification_id: String,
    /// Phone number the code was sent to.
    pub phone_number: String,
}

/// Identity-change notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    SignedIn(AuthIdentity),
    SignedOut,
}

impl From<Option<AuthIdentity>> for AuthEvent {
    fn from(identity: Option<AuthIdentity>) -> Self {
        match identity {
            Some(identity) => AuthEvent::SignedIn(identity),
            None => AuthEvent::SignedOut,
        }
    }
}

/// A cancellable stream of identity changes.
///
/// The first item is the identity at subscription time. After
/// [`cancel`](Self::cancel) the stream ends; cancelling again does nothing.
pub struct AuthSubscription {
    stream: Option<BoxStream<'static, AuthEvent>>,
}

impl AuthSubscription {
    /// Subscribe to a watch channel holding the current identity.
    pub fn from_watch(receiver: watch::Receiver<Option<AuthIdentity>>) -> Self {
        Self::from_stream(WatchStream::new(receiver).map(AuthEvent::from))
    }

    /// Wrap an arbitrary event stream.
    pub fn from_stream<S>(stream: S) -> Self
    where
        S: Stream<Item = AuthEvent> + Send + 'static,
    {
        Self {
            stream: Some(stream.boxed()),
        }
    }

    /// Stop receiving events.
    pub fn cancel(&mut self) {
        self.stream = None;
    }

    /// Whether [`cancel`](Self::cancel) has been called.
    pub fn is_cancelled(&self) -> bool {
        self.stream.is_none()
    }
}

impl std::fmt::Debug for AuthSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSubscription")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

impl Stream for AuthSubscription {
    type Item = AuthEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        match self.stream.as_mut() {
            Some(stream) => stream.poll_next_unpin(cx),
            None => Poll::Ready(None),
        }
    }
}

/// Phone-number authentication backend.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Send a one-time code to `phone_number`.
    async fn send_verification_code(&self, phone_number: &str) -> Result<VerificationHandle>;

    /// Exchange a handle and code for a signed-in identity.
    async fn verify_code(&self, handle: &VerificationHandle, code: &str) -> Result<AuthIdentity>;

    /// Subscribe to identity changes. Fires immediately with the current state.
    fn subscribe(&self) -> AuthSubscription;

    /// The currently signed-in identity, if any.
    fn current_identity(&self) -> Option<AuthIdentity>;

    /// Sign the current identity out.
    async fn sign_out(&self) -> Result<()>;
}
