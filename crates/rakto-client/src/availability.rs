//! Optimistic availability toggle.
//!
//! The change is applied to the session first so the screen updates
//! immediately, then written to the backend. A failed write restores the
//! value from the snapshot taken before the change.

use rakto_core::DonorProfile;
use tracing::{debug, warn};

use crate::donors::DonorService;
use crate::error::{ClientError, Result};
use crate::session::Session;

/// A pending availability change for the session's donor.
///
/// The snapshot is the donor as it was before the change and is never
/// modified.
#[derive(Debug, Clone)]
pub struct AvailabilityChange {
    snapshot: DonorProfile,
    value: bool,
}

impl AvailabilityChange {
    /// Prepare a change of the session donor's availability to `value`.
    pub fn prepare(session: &Session, value: bool) -> Result<Self> {
        let snapshot = session.state().donor.ok_or(ClientError::NotRegistered)?;
        Ok(Self { snapshot, value })
    }

    /// The donor as it was before the change.
    pub fn snapshot(&self) -> &DonorProfile {
        &self.snapshot
    }

    /// The requested availability.
    pub fn value(&self) -> bool {
        self.value
    }

    /// Show the new value in the session.
    ///
    /// Fails with [`ClientError::NotRegistered`] if the session no longer
    /// holds this donor, so nothing is committed for a signed-out user.
    pub async fn apply_locally(&self, session: &Session) -> Result<()> {
        session
            .set_availability(&self.snapshot.id, self.value)
            .await?
            .map(|_| ())
            .ok_or(ClientError::NotRegistered)
    }

    /// Write the change; on failure put the snapshot's value back.
    ///
    /// On success the session donor is replaced with the stored copy.
    pub async fn commit(self, session: &Session, donors: &DonorService) -> Result<DonorProfile> {
        match donors.set_availability(&self.snapshot.id, self.value).await {
            Ok(updated) => {
                session.refresh_donor(updated.clone()).await?;
                Ok(updated)
            }
            Err(e) => {
                warn!(
                    "Availability update for donor {} failed, rolling back: {}",
                    self.snapshot.id, e
                );
                session
                    .set_availability(&self.snapshot.id, self.snapshot.is_available)
                    .await?;
                Err(e)
            }
        }
    }
}

/// Set the session donor's availability optimistically.
pub async fn toggle_availability(
    session: &Session,
    donors: &DonorService,
    value: bool,
) -> Result<DonorProfile> {
    let change = AvailabilityChange::prepare(session, value)?;
    debug!(
        "Donor {} availability {} -> {}",
        change.snapshot.id, change.snapshot.is_available, value
    );
    change.apply_locally(session).await?;
    change.commit(session, donors).await
}
