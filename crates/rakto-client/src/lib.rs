//! Client core for RaktoConnect.
//!
//! This crate provides the [`RaktoClient`] type which ties together the
//! pieces a screen needs:
//!
//! - [`Session`] - Actor-owned session state with whole-snapshot updates
//! - [`AuthFlow`] - Phone/OTP sign-in and the auth-state listener
//! - [`DonorService`] / [`RequestService`] - Searches and writes
//! - [`forms`] - Form input with complete validation before any write
//! - [`availability`] - Optimistic availability toggle with rollback
//!
//! # Architecture
//!
//! ```text
//!  AuthProvider ──events──▶ AuthFlow::listen ──┐
//!                                              ▼
//!  Screens ──forms──▶ services ──▶ DocumentStore    Session actor ──watch──▶ Screens
//!                        │                          ▲
//!                        └──── set_donor / refresh ─┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use rakto_client::{ClientConfig, RaktoClient};
//! use rakto_database::{Database, LocalProfileCache};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ClientConfig::from_env()?;
//!     let db = Database::connect(&config.database_url).await?;
//!     db.migrate().await?;
//!
//!     let client = RaktoClient::new(
//!         Arc::new(db.clone()),
//!         Arc::new(my_auth_provider()),
//!         Arc::new(LocalProfileCache::new(db)),
//!         &config,
//!     );
//!     let _listener = client.auth().listen();
//!
//!     for request in client.recent_requests().await? {
//!         println!("{} needs {} unit(s) of {}", request.patient_name, request.units, request.blood_group);
//!     }
//!     Ok(())
//! }
//! ```

pub mod availability;
mod auth;
mod config;
mod donors;
mod error;
mod fetch;
pub mod forms;
mod requests;
mod session;

pub use auth::{AuthFlow, ListenerHandle};
pub use availability::{toggle_availability, AvailabilityChange};
pub use config::{ClientConfig, DEFAULT_DATABASE_URL};
pub use donors::DonorService;
pub use error::{ClientError, Result};
pub use fetch::RecordStream;
pub use forms::{BloodRequestForm, DonorRegistrationForm, FieldError, FormErrors, ProfileForm};
pub use requests::{RequestService, DEFAULT_RECENT_REQUESTS};
pub use session::{Session, SessionState};

use std::sync::Arc;

use rakto_core::{AuthProvider, BloodRequest, DocumentStore, DonorProfile, ProfileCache};
use tracing::info;

/// Entry point for screens: services plus the session they act on.
#[derive(Clone)]
pub struct RaktoClient {
    session: Session,
    auth: AuthFlow,
    donors: DonorService,
    requests: RequestService,
    recent_requests: usize,
}

impl RaktoClient {
    /// Create a client and spawn its session actor.
    ///
    /// Must be called within a tokio runtime.
    pub fn new(
        store: Arc<dyn DocumentStore>,
        provider: Arc<dyn AuthProvider>,
        cache: Arc<dyn ProfileCache>,
        config: &ClientConfig,
    ) -> Self {
        let session = Session::spawn(cache, config.session_channel);
        info!("Client started with store {}", store.name());

        Self {
            auth: AuthFlow::new(provider, store.clone(), session.clone()),
            donors: DonorService::new(store.clone()),
            requests: RequestService::new(store),
            session,
            recent_requests: config.recent_requests,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn auth(&self) -> &AuthFlow {
        &self.auth
    }

    pub fn donors(&self) -> &DonorService {
        &self.donors
    }

    pub fn requests(&self) -> &RequestService {
        &self.requests
    }

    /// Register the signed-in user as a donor and remember the profile.
    pub async fn register_donor(&self, form: &DonorRegistrationForm) -> Result<DonorProfile> {
        let state = self.session.state();
        let uid = state.uid().ok_or(ClientError::NotAuthenticated)?;
        let phone_number = state.phone_number().unwrap_or_default();

        let donor = self.donors.register(uid, phone_number, form).await?;
        self.session.set_donor(Some(donor.clone())).await?;
        Ok(donor)
    }

    /// Post a blood request on behalf of the signed-in user.
    pub async fn create_request(&self, form: &BloodRequestForm) -> Result<BloodRequest> {
        let state = self.session.state();
        let uid = state.uid().ok_or(ClientError::NotAuthenticated)?;
        self.requests.create(uid, form).await
    }

    /// Requests posted by the signed-in user.
    pub async fn my_requests(&self) -> Result<Vec<BloodRequest>> {
        let state = self.session.state();
        let uid = state.uid().ok_or(ClientError::NotAuthenticated)?;
        self.requests.list_for_user(uid).await
    }

    /// The home feed of pending requests.
    pub async fn recent_requests(&self) -> Result<Vec<BloodRequest>> {
        self.requests.recent_pending(self.recent_requests).await
    }

    /// Optimistically set the signed-in donor's availability.
    pub async fn set_availability(&self, is_available: bool) -> Result<DonorProfile> {
        toggle_availability(&self.session, &self.donors, is_available).await
    }
}
