//! Mock phone authentication with a fixed verification code.

use std::collections::HashMap;

use rakto_core::{
    async_trait, AuthIdentity, AuthProvider, AuthSubscription, BackendError, VerificationHandle,
};
use tokio::sync::{watch, Mutex};
use uuid::Uuid;

/// Code accepted by [`MockAuth::new`].
pub const DEFAULT_CODE: &str = "123456";

#[derive(Debug, Default)]
struct Accounts {
    /// verification id -> phone number
    pending: HashMap<String, String>,
    /// phone number -> uid, so a number always signs in as the same user
    uids: HashMap<String, String>,
}

/// An [`AuthProvider`] that accepts one fixed code for every number.
///
/// Each verification handle is single-use. Identity changes are published
/// on a watch channel, so subscribers always see the latest state first.
#[derive(Debug)]
pub struct MockAuth {
    code: String,
    accounts: Mutex<Accounts>,
    identity: watch::Sender<Option<AuthIdentity>>,
}

impl Default for MockAuth {
    fn default() -> Self {
        Self::new()
    }
}

impl MockAuth {
    /// Accept [`DEFAULT_CODE`].
    pub fn new() -> Self {
        Self::with_code(DEFAULT_CODE)
    }

    /// Accept a custom code.
    pub fn with_code(code: impl Into<String>) -> Self {
        let (identity, _) = watch::channel(None);
        Self {
            code: code.into(),
            accounts: Mutex::new(Accounts::default()),
            identity,
        }
    }

    /// Sign an identity in directly, as if restored by the platform at launch.
    pub fn sign_in_as(&self, identity: AuthIdentity) {
        self.identity.send_replace(Some(identity));
    }
}

#[async_trait]
impl AuthProvider for MockAuth {
    async fn send_verification_code(
        &self,
        phone_number: &str,
    ) -> rakto_core::Result<VerificationHandle> {
        let verification_id = Uuid::new_v4().to_string();
        let mut accounts = self.accounts.lock().await;
        accounts
            .pending
            .insert(verification_id.clone(), phone_number.to_string());

        Ok(VerificationHandle {
            verification_id,
            phone_number: phone_number.to_string(),
        })
    }

    async fn verify_code(
        &self,
        handle: &VerificationHandle,
        code: &str,
    ) -> rakto_core::Result<AuthIdentity> {
        let mut accounts = self.accounts.lock().await;

        if !accounts.pending.contains_key(&handle.verification_id) {
            return Err(BackendError::Auth(
                "verification session expired or unknown".to_string(),
            ));
        }
        if code != self.code {
            return Err(BackendError::Auth("invalid verification code".to_string()));
        }

        let phone_number = accounts
            .pending
            .remove(&handle.verification_id)
            .unwrap_or_else(|| handle.phone_number.clone());
        let uid = accounts
            .uids
            .entry(phone_number.clone())
            .or_insert_with(|| Uuid::new_v4().simple().to_string())
            .clone();
        drop(accounts);

        let identity = AuthIdentity::with_phone(uid, phone_number);
        self.identity.send_replace(Some(identity.clone()));
        Ok(identity)
    }

    fn subscribe(&self) -> AuthSubscription {
        AuthSubscription::from_watch(self.identity.subscribe())
    }

    fn current_identity(&self) -> Option<AuthIdentity> {
        self.identity.borrow().clone()
    }

    async fn sign_out(&self) -> rakto_core::Result<()> {
        self.identity.send_replace(None);
        Ok(())
    }
}
