//! Blood request reads and writes.

use std::sync::Arc;

use rakto_core::{
    encode_fields, BackendError, BloodRequest, Collection, DocumentStore, Record, RequestFilter,
    RequestPatch, RequestStatus,
};
use tracing::{debug, info};

use crate::error::{ClientError, Result};
use crate::fetch::fetch_records;
use crate::forms::BloodRequestForm;

/// Number of pending requests on the home feed.
pub const DEFAULT_RECENT_REQUESTS: usize = 5;

/// Request operations against the `bloodRequests` collection.
#[derive(Clone)]
pub struct RequestService {
    store: Arc<dyn DocumentStore>,
}

impl RequestService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Requests matching every supplied filter, newest first.
    pub async fn search(&self, filter: &RequestFilter) -> Result<Vec<BloodRequest>> {
        let requests = fetch_records(self.store.as_ref(), &filter.build_query()).await?;
        debug!("Request search returned {} result(s)", requests.len());
        Ok(requests)
    }

    /// Every request, newest first.
    pub async fn search_all(&self) -> Result<Vec<BloodRequest>> {
        self.search(&RequestFilter::new()).await
    }

    /// Requests created by `user_id`, newest first.
    pub async fn list_for_user(&self, user_id: &str) -> Result<Vec<BloodRequest>> {
        self.search(&RequestFilter::new().user(user_id)).await
    }

    /// The newest pending requests.
    pub async fn recent_pending(&self, limit: usize) -> Result<Vec<BloodRequest>> {
        self.search(
            &RequestFilter::new()
                .status(RequestStatus::Pending)
                .limit(limit),
        )
        .await
    }

    /// Validate the form and create a pending request owned by `user_id`.
    pub async fn create(&self, user_id: &str, form: &BloodRequestForm) -> Result<BloodRequest> {
        let request = form.to_new_request(user_id)?;
        let document = self
            .store
            .create(Collection::BloodRequests, encode_fields(&request)?)
            .await?;
        let request = BloodRequest::from_document(document)?;

        info!(
            "Created {} request {} for {} unit(s)",
            request.urgency, request.id, request.units
        );
        Ok(request)
    }

    /// Apply a partial update without status checks.
    pub async fn update(&self, request_id: &str, patch: &RequestPatch) -> Result<BloodRequest> {
        let document = self
            .store
            .update(Collection::BloodRequests, request_id, encode_fields(patch)?)
            .await?;
        Ok(BloodRequest::from_document(document)?)
    }

    /// Move a request to `status`.
    ///
    /// Only pending requests can be closed. Setting the current status again
    /// succeeds without writing.
    pub async fn update_status(&self, request_id: &str, status: RequestStatus) -> Result<BloodRequest> {
        let document = self
            .store
            .get(Collection::BloodRequests, request_id)
            .await?
            .ok_or_else(|| BackendError::NotFound {
                collection: Collection::BloodRequests.name(),
                id: request_id.to_string(),
            })?;
        let current = BloodRequest::from_document(document)?;

        if current.status == status {
            return Ok(current);
        }
        if !current.status.can_transition_to(status) {
            return Err(ClientError::InvalidTransition {
                from: current.status,
                to: status,
            });
        }

        let patch = RequestPatch {
            status: Some(status),
            ..Default::default()
        };
        let updated = self.update(request_id, &patch).await?;
        info!("Request {} moved from {} to {}", request_id, current.status, status);
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mock_backend::MemoryStore;
    use rakto_core::Urgency;

    fn form(patient: &str) -> BloodRequestForm {
        BloodRequestForm {
            patient_name: patient.to_string(),
            blood_group: "AB-".to_string(),
            units: "3".to_string(),
            hospital_name: "Dhaka Medical College".to_string(),
            hospital_address: "Bakshibazar".to_string(),
            city: "Dhaka".to_string(),
            state: "Dhaka Division".to_string(),
            urgency: "critical".to_string(),
            contact_number: "+8801912345678".to_string(),
            additional_info: "Surgery at 9am".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_then_read_back() {
        let service = RequestService::new(Arc::new(MemoryStore::new()));
        let created = service.create("uid-1", &form("Ayesha")).await.unwrap();

        assert_eq!(created.status, RequestStatus::Pending);
        assert_eq!(created.urgency, Urgency::Critical);
        assert_eq!(created.additional_info.as_deref(), Some("Surgery at 9am"));
        assert_eq!(service.list_for_user("uid-1").await.unwrap(), vec![created]);
        assert!(service.list_for_user("uid-2").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_recent_pending_is_limited_and_skips_closed() {
        let service = RequestService::new(Arc::new(MemoryStore::new()));
        let mut ids = Vec::new();
        for i in 0..7 {
            ids.push(service.create("uid-1", &form(&format!("P{}", i))).await.unwrap().id);
        }
        service
            .update_status(&ids[6], RequestStatus::Fulfilled)
            .await
            .unwrap();

        let recent: Vec<String> = service
            .recent_pending(DEFAULT_RECENT_REQUESTS)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        let expected: Vec<String> = ids[1..6].iter().rev().cloned().collect();
        assert_eq!(recent, expected);
    }

    #[tokio::test]
    async fn test_status_transitions() {
        let service = RequestService::new(Arc::new(MemoryStore::new()));
        let request = service.create("uid-1", &form("Ayesha")).await.unwrap();

        let same = service
            .update_status(&request.id, RequestStatus::Pending)
            .await
            .unwrap();
        assert_eq!(same, request);

        let cancelled = service
            .update_status(&request.id, RequestStatus::Cancelled)
            .await
            .unwrap();
        assert_eq!(cancelled.status, RequestStatus::Cancelled);

        let err = service
            .update_status(&request.id, RequestStatus::Fulfilled)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ClientError::InvalidTransition {
                from: RequestStatus::Cancelled,
                to: RequestStatus::Fulfilled,
            }
        ));
    }

    #[tokio::test]
    async fn test_update_status_missing_request() {
        let service = RequestService::new(Arc::new(MemoryStore::new()));
        let err = service
            .update_status("ghost", RequestStatus::Fulfilled)
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Backend(BackendError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_generic_update_is_unconstrained() {
        let service = RequestService::new(Arc::new(MemoryStore::new()));
        let request = service.create("uid-1", &form("Ayesha")).await.unwrap();
        service
            .update_status(&request.id, RequestStatus::Fulfilled)
            .await
            .unwrap();

        let reopened = service
            .update(
                &request.id,
                &RequestPatch {
                    status: Some(RequestStatus::Pending),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(reopened.status, RequestStatus::Pending);
    }
}
