//! Session state holder.
//!
//! One actor task owns the [`SessionState`] and applies commands in arrival
//! order. Each command publishes exactly one new snapshot, so readers only
//! ever observe a state from before or after a command, never in between.

use std::sync::Arc;

use rakto_core::{AuthIdentity, DonorProfile, ProfileCache, UserProfile};
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, warn};

use crate::error::{ClientError, Result};

/// Client-local record of the signed-in user.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    pub identity: Option<AuthIdentity>,
    pub profile: Option<UserProfile>,
    /// True exactly when `identity` is set.
    pub is_authenticated: bool,
    pub donor: Option<DonorProfile>,
    /// True exactly when `donor` is set.
    pub is_registered: bool,
}

impl SessionState {
    /// Uid of the signed-in user.
    pub fn uid(&self) -> Option<&str> {
        self.identity.as_ref().map(|identity| identity.uid.as_str())
    }

    /// Phone number of the signed-in user, preferring the stored profile.
    pub fn phone_number(&self) -> Option<&str> {
        self.profile
            .as_ref()
            .map(|profile| profile.phone_number.as_str())
            .filter(|phone| !phone.is_empty())
            .or_else(|| self.identity.as_ref()?.phone_number.as_deref())
    }
}

type Ack = oneshot::Sender<SessionState>;

enum Command {
    SetIdentity(Option<AuthIdentity>, Ack),
    SetProfile(Option<UserProfile>, Ack),
    SetDonor(Option<DonorProfile>, Ack),
    SetAvailability {
        donor_id: String,
        value: bool,
        reply: oneshot::Sender<Option<bool>>,
    },
    RefreshDonor(DonorProfile, Ack),
    HydrateFromCache(Ack),
    Logout(Ack),
}

/// Handle to the session actor. Cheap to clone.
///
/// The actor stops once every handle is dropped.
#[derive(Clone)]
pub struct Session {
    commands: mpsc::Sender<Command>,
    state: watch::Receiver<SessionState>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("state", &*self.state.borrow())
            .finish()
    }
}

impl Session {
    /// Spawn the session actor on the current tokio runtime.
    ///
    /// `capacity` bounds the command channel; senders wait when it is full.
    pub fn spawn(cache: Arc<dyn ProfileCache>, capacity: usize) -> Self {
        let (commands_tx, commands_rx) = mpsc::channel(capacity.max(1));
        let (state_tx, state_rx) = watch::channel(SessionState::default());

        let actor = SessionActor {
            state: SessionState::default(),
            cache,
            publisher: state_tx,
            commands: commands_rx,
        };
        tokio::spawn(actor.run());

        Self {
            commands: commands_tx,
            state: state_rx,
        }
    }

    /// Current snapshot.
    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Watch every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.clone()
    }

    /// Set the signed-in identity; `is_authenticated` follows it.
    ///
    /// An identity with an empty uid is treated as signed out.
    pub async fn set_identity(&self, identity: Option<AuthIdentity>) -> Result<SessionState> {
        self.request(|ack| Command::SetIdentity(identity, ack)).await
    }

    /// Set the user profile and mirror it into the local cache.
    pub async fn set_profile(&self, profile: Option<UserProfile>) -> Result<SessionState> {
        self.request(|ack| Command::SetProfile(profile, ack)).await
    }

    /// Set the donor profile; `is_registered` follows it.
    pub async fn set_donor(&self, donor: Option<DonorProfile>) -> Result<SessionState> {
        self.request(|ack| Command::SetDonor(donor, ack)).await
    }

    /// Set the held donor's availability, returning the previous value.
    ///
    /// Does nothing and returns `None` unless the session still holds the
    /// donor `donor_id`.
    pub async fn set_availability(&self, donor_id: &str, value: bool) -> Result<Option<bool>> {
        let donor_id = donor_id.to_string();
        self.request(|reply| Command::SetAvailability {
            donor_id,
            value,
            reply,
        })
        .await
    }

    /// Replace the held donor with a fresher copy of the same donor.
    pub async fn refresh_donor(&self, donor: DonorProfile) -> Result<SessionState> {
        self.request(|ack| Command::RefreshDonor(donor, ack)).await
    }

    /// Show the cached profile until the live auth state arrives.
    pub async fn hydrate_from_cache(&self) -> Result<SessionState> {
        self.request(Command::HydrateFromCache).await
    }

    /// Clear everything, including the cached profile.
    pub async fn logout(&self) -> Result<SessionState> {
        self.request(Command::Logout).await
    }

    async fn request<T>(&self, build: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(build(tx))
            .await
            .map_err(|_| ClientError::SessionClosed)?;
        rx.await.map_err(|_| ClientError::SessionClosed)
    }
}

struct SessionActor {
    state: SessionState,
    cache: Arc<dyn ProfileCache>,
    publisher: watch::Sender<SessionState>,
    commands: mpsc::Receiver<Command>,
}

impl SessionActor {
    async fn run(mut self) {
        while let Some(command) = self.commands.recv().await {
            self.handle(command).await;
        }
        debug!("Session actor stopped");
    }

    async fn handle(&mut self, command: Command) {
        match command {
            Command::SetIdentity(identity, ack) => {
                let identity = identity.filter(|identity| !identity.uid.is_empty());
                self.state.is_authenticated = identity.is_some();
                self.state.identity = identity;
                self.publish(ack);
            }
            Command::SetProfile(profile, ack) => {
                self.persist_profile(profile.as_ref()).await;
                self.state.profile = profile;
                self.publish(ack);
            }
            Command::SetDonor(donor, ack) => {
                self.state.is_registered = donor.is_some();
                self.state.donor = donor;
                self.publish(ack);
            }
            Command::SetAvailability {
                donor_id,
                value,
                reply,
            } => {
                let previous = match self.state.donor.as_mut() {
                    Some(donor) if donor.id == donor_id => {
                        let previous = donor.is_available;
                        donor.is_available = value;
                        Some(previous)
                    }
                    _ => None,
                };
                if previous.is_some() {
                    self.publisher.send_replace(self.state.clone());
                }
                let _ = reply.send(previous);
            }
            Command::RefreshDonor(donor, ack) => {
                match &self.state.donor {
                    Some(current) if current.id == donor.id => {
                        self.state.donor = Some(donor);
                    }
                    _ => debug!("Ignoring refresh for donor {} not held by session", donor.id),
                }
                self.publish(ack);
            }
            Command::HydrateFromCache(ack) => {
                if self.state.profile.is_none() {
                    match self.cache.load().await {
                        Ok(profile) => self.state.profile = profile,
                        Err(e) => warn!("Failed to load cached profile: {}", e),
                    }
                }
                self.publish(ack);
            }
            Command::Logout(ack) => {
                if let Err(e) = self.cache.clear().await {
                    warn!("Failed to clear cached profile: {}", e);
                }
                self.state = SessionState::default();
                self.publish(ack);
            }
        }
    }

    async fn persist_profile(&self, profile: Option<&UserProfile>) {
        let result = match profile {
            Some(profile) => self.cache.store(profile).await,
            None => self.cache.clear().await,
        };
        if let Err(e) = result {
            warn!("Failed to update cached profile: {}", e);
        }
    }

    fn publish(&self, ack: Ack) {
        self.publisher.send_replace(self.state.clone());
        let _ = ack.send(self.state.clone());
    }
}
