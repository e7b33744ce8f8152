//! Donor profile reads and writes.

use std::sync::Arc;

use chrono::Utc;
use rakto_core::{
    encode_fields, Collection, DocumentStore, DonorFilter, DonorPatch, DonorProfile, Record,
};
use tracing::{debug, info, warn};

use crate::error::{ClientError, Result};
use crate::fetch::{fetch_records, stream_records, RecordStream};
use crate::forms::DonorRegistrationForm;

/// Donor operations against the `donors` collection.
#[derive(Clone)]
pub struct DonorService {
    store: Arc<dyn DocumentStore>,
}

impl DonorService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Donors matching every supplied filter, newest first.
    pub async fn search(&self, filter: &DonorFilter) -> Result<Vec<DonorProfile>> {
        let query = filter.build_query();
        let donors = fetch_records(self.store.as_ref(), &query).await?;
        debug!("Donor search returned {} result(s)", donors.len());
        Ok(donors)
    }

    /// Every donor, newest first.
    pub async fn search_all(&self) -> Result<Vec<DonorProfile>> {
        self.search(&DonorFilter::new()).await
    }

    /// Every donor as a lazy stream, newest first.
    pub async fn list_all(&self) -> Result<RecordStream<DonorProfile>> {
        let query = DonorFilter::new().build_query();
        Ok(stream_records(self.store.as_ref(), &query).await?)
    }

    /// The donor profile owned by `user_id`.
    ///
    /// A failed read is logged and treated as "no profile".
    pub async fn find_by_user(&self, user_id: &str) -> Option<DonorProfile> {
        let query = DonorFilter::new().user(user_id).limit(1).build_query();
        match fetch_records::<DonorProfile>(self.store.as_ref(), &query).await {
            Ok(mut donors) => donors.pop(),
            Err(e) => {
                warn!("Failed to get donor for user {}: {}", user_id, e);
                None
            }
        }
    }

    /// Validate the form and create the donor profile for `user_id`.
    ///
    /// Fails with [`ClientError::AlreadyRegistered`] if the user already
    /// has a donor profile.
    pub async fn register(
        &self,
        user_id: &str,
        phone_number: &str,
        form: &DonorRegistrationForm,
    ) -> Result<DonorProfile> {
        let today = Utc::now().date_naive();
        let donor = form.to_new_donor(user_id, phone_number, today)?;

        if let Some(existing) = self.find_by_user(user_id).await {
            return Err(ClientError::AlreadyRegistered {
                donor_id: existing.id,
            });
        }

        let document = self
            .store
            .create(Collection::Donors, encode_fields(&donor)?)
            .await?;
        let donor = DonorProfile::from_document(document)?;

        info!("Registered donor {} for user {}", donor.id, user_id);
        Ok(donor)
    }

    /// Apply a partial update and return the stored donor.
    pub async fn update(&self, donor_id: &str, patch: &DonorPatch) -> Result<DonorProfile> {
        let document = self
            .store
            .update(Collection::Donors, donor_id, encode_fields(patch)?)
            .await?;
        Ok(DonorProfile::from_document(document)?)
    }

    /// Write the availability flag.
    pub async fn set_availability(&self, donor_id: &str, is_available: bool) -> Result<DonorProfile> {
        let donor = self
            .update(donor_id, &DonorPatch::availability(is_available))
            .await?;
        debug!("Donor {} availability set to {}", donor_id, is_available);
        Ok(donor)
    }
}
