//! Core records, query composition, and backend traits for RaktoConnect.
//!
//! This crate provides the shared vocabulary between the client and any
//! backend implementation. It defines:
//!
//! - [`DonorProfile`] / [`BloodRequest`] / [`UserProfile`] - Typed records
//! - [`DonorFilter`] / [`RequestFilter`] - Optional filters composed into a [`Query`]
//! - [`DocumentStore`] - The trait every document backend implements
//! - [`AuthProvider`] - Phone/OTP authentication with identity-change streams
//! - [`ProfileCache`] - Local snapshot of the last-known user profile
//! - [`BackendError`] - Error types for backend operations
//!
//! # Example
//!
//! ```rust
//! use rakto_core::{BloodGroup, DonorFilter, FieldFilter, FilterField};
//!
//! let query = DonorFilter::new()
//!     .blood_group(BloodGroup::ONegative)
//!     .city("Dhaka")
//!     .build_query();
//!
//! assert_eq!(query.filters.len(), 2);
//! assert_eq!(query.filters[0], FieldFilter::text(FilterField::BloodGroup, "O-"));
//! ```

mod auth;
mod document;
mod error;
mod query;
mod records;
mod store;
mod types;

pub use auth::{AuthEvent, AuthIdentity, AuthProvider, AuthSubscription, VerificationHandle};
pub use document::{decode_document, encode_fields, Document, Fields, Record};
pub use error::{BackendError, Result};
pub use query::{DonorFilter, FieldFilter, FilterField, FilterValue, OrderBy, Query, RequestFilter};
pub use records::{
    BloodRequest, DonorPatch, DonorProfile, EmergencyContact, GeoPoint, NewBloodRequest, NewDonor,
    RequestPatch, UserProfile,
};
pub use store::{DocumentStore, DocumentStream, ProfileCache, PROFILE_CACHE_KEY};
pub use types::{BloodGroup, Collection, Gender, RequestStatus, UnknownVariant, Urgency};

// Re-export async_trait for convenience
pub use async_trait::async_trait;
