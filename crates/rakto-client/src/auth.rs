//! Phone sign-in and the auth-state listener.

use std::sync::Arc;

use futures::StreamExt;
use rakto_core::{
    encode_fields, AuthEvent, AuthIdentity, AuthProvider, Collection, DocumentStore, Record,
    UserProfile, VerificationHandle,
};
use rakto_database::validation::{normalize_phone_number, validate_otp_code, validate_phone_number};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::donors::DonorService;
use crate::error::{ClientError, Result};
use crate::forms::{FormErrors, ProfileForm};
use crate::session::Session;

/// Sign-in flow tying the auth provider, the `users` collection, and the
/// session together.
#[derive(Clone)]
pub struct AuthFlow {
    provider: Arc<dyn AuthProvider>,
    store: Arc<dyn DocumentStore>,
    session: Session,
    donors: DonorService,
}

impl AuthFlow {
    pub fn new(
        provider: Arc<dyn AuthProvider>,
        store: Arc<dyn DocumentStore>,
        session: Session,
    ) -> Self {
        let donors = DonorService::new(store.clone());
        Self {
            provider,
            store,
            session,
            donors,
        }
    }

    /// Normalize and validate `phone`, then ask the provider to send a code.
    pub async fn send_code(&self, phone: &str) -> Result<VerificationHandle> {
        let phone_number = normalize_phone_number(phone);
        validate_phone_number(&phone_number)
            .map_err(|e| FormErrors::single("phoneNumber", e))?;

        let handle = self.provider.send_verification_code(&phone_number).await?;
        debug!("Verification code sent to {}", phone_number);
        Ok(handle)
    }

    /// Verify the code and sign in, loading or creating the user profile.
    pub async fn verify_code(&self, handle: &VerificationHandle, code: &str) -> Result<UserProfile> {
        validate_otp_code(code).map_err(|e| FormErrors::single("code", e))?;

        let identity = self.provider.verify_code(handle, code).await?;
        info!("Signed in as {}", identity.uid);
        self.session.set_identity(Some(identity.clone())).await?;

        let profile = self.load_or_create_profile(&identity, &handle.phone_number).await?;
        self.session.set_profile(Some(profile.clone())).await?;
        Ok(profile)
    }

    /// The stored profile for `uid`. A failed read is logged and treated as absent.
    pub async fn get_user_profile(&self, uid: &str) -> Option<UserProfile> {
        match self.store.get(Collection::Users, uid).await {
            Ok(Some(document)) => match UserProfile::from_document(document) {
                Ok(profile) => Some(profile),
                Err(e) => {
                    warn!("Failed to decode profile for {}: {}", uid, e);
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!("Failed to get profile for {}: {}", uid, e);
                None
            }
        }
    }

    /// Create the profile document for `identity`, keyed by its uid.
    ///
    /// `phone_number` is used when the identity carries none.
    pub async fn create_user_profile(
        &self,
        identity: &AuthIdentity,
        phone_number: &str,
    ) -> Result<UserProfile> {
        let profile = UserProfile {
            uid: identity.uid.clone(),
            phone_number: identity
                .phone_number
                .clone()
                .filter(|phone| !phone.is_empty())
                .unwrap_or_else(|| phone_number.to_string()),
            display_name: identity.display_name.clone(),
            email: identity.email.clone(),
            photo_url: identity.photo_url.clone(),
            created_at: None,
            updated_at: None,
        };

        let document = self
            .store
            .set(Collection::Users, &identity.uid, encode_fields(&profile)?)
            .await?;
        info!("Created profile for {}", identity.uid);
        Ok(UserProfile::from_document(document)?)
    }

    /// Validate and save profile edits for the signed-in user.
    pub async fn update_user_profile(&self, form: &ProfileForm) -> Result<UserProfile> {
        let patch = form.to_patch()?;
        let uid = self
            .session
            .state()
            .uid()
            .map(str::to_string)
            .ok_or(ClientError::NotAuthenticated)?;

        let document = self.store.update(Collection::Users, &uid, patch).await?;
        let profile = UserProfile::from_document(document)?;
        self.session.set_profile(Some(profile.clone())).await?;
        Ok(profile)
    }

    /// Sign out with the provider, then clear the session.
    pub async fn sign_out(&self) -> Result<()> {
        self.provider.sign_out().await?;
        self.session.logout().await?;
        info!("Signed out");
        Ok(())
    }

    /// Follow identity changes in a background task until cancelled.
    ///
    /// Must be called within a tokio runtime.
    pub fn listen(&self) -> ListenerHandle {
        let mut events = self.provider.subscribe();
        let flow = self.clone();

        let task = tokio::spawn(async move {
            while let Some(event) = events.next().await {
                if let Err(e) = flow.handle_event(event).await {
                    warn!("Failed to apply auth state change: {}", e);
                    if matches!(e, ClientError::SessionClosed) {
                        break;
                    }
                }
            }
            debug!("Auth listener stopped");
        });

        ListenerHandle { task: Some(task) }
    }

    async fn handle_event(&self, event: AuthEvent) -> Result<()> {
        match event {
            AuthEvent::SignedIn(identity) => {
                debug!("Auth state: signed in as {}", identity.uid);
                self.session.set_identity(Some(identity.clone())).await?;

                let phone_number = identity.phone_number.clone().unwrap_or_default();
                match self.load_or_create_profile(&identity, &phone_number).await {
                    Ok(profile) => {
                        self.session.set_profile(Some(profile)).await?;
                    }
                    Err(e) => warn!("Failed to create profile for {}: {}", identity.uid, e),
                }

                let donor = self.donors.find_by_user(&identity.uid).await;
                self.session.set_donor(donor).await?;
            }
            AuthEvent::SignedOut => {
                debug!("Auth state: signed out");
                self.session.logout().await?;
            }
        }
        Ok(())
    }

    async fn load_or_create_profile(
        &self,
        identity: &AuthIdentity,
        phone_number: &str,
    ) -> Result<UserProfile> {
        match self.get_user_profile(&identity.uid).await {
            Some(profile) => Ok(profile),
            None => self.create_user_profile(identity, phone_number).await,
        }
    }
}

/// Handle to a running auth listener. Dropping it stops the listener.
#[derive(Debug)]
pub struct ListenerHandle {
    task: Option<JoinHandle<()>>,
}

impl ListenerHandle {
    /// Stop the listener. Calling this again does nothing.
    pub fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.task.is_none()
    }
}

impl Drop for ListenerHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}
