//! Query composition.
//!
//! Filters are plain values ([`DonorFilter`], [`RequestFilter`]) with one
//! optional predicate per field. [`DonorFilter::build_query`] and
//! [`RequestFilter::build_query`] turn them into a backend-neutral [`Query`]:
//! every present predicate is an exact-match equality, predicates are ANDed,
//! and results are always ordered by `createdAt` descending.
//!
//! An absent predicate matches every value of its field. Empty text is
//! treated as absent, never as "match the empty string".

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::document::Document;
use crate::types::{BloodGroup, Collection, RequestStatus};

/// Fields that can appear in an equality filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterField {
    /// Owning user's uid.
    UserId,
    BloodGroup,
    City,
    State,
    /// Donor availability.
    IsAvailable,
    /// Blood request status.
    Status,
}

impl FilterField {
    /// Document field name for this filter.
    pub fn field_name(&self) -> &'static str {
        match self {
            FilterField::UserId => "userId",
            FilterField::BloodGroup => "bloodGroup",
            FilterField::City => "city",
            FilterField::State => "state",
            FilterField::IsAvailable => "isAvailable",
            FilterField::Status => "status",
        }
    }
}

/// Right-hand side of an equality filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterValue {
    Text(String),
    Bool(bool),
}

impl FilterValue {
    /// Exact comparison against a stored JSON value.
    pub fn matches(&self, stored: &Value) -> bool {
        match (self, stored) {
            (FilterValue::Text(expected), Value::String(actual)) => expected == actual,
            (FilterValue::Bool(expected), Value::Bool(actual)) => expected == actual,
            _ => false,
        }
    }
}

/// A single `field == value` predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldFilter {
    pub field: FilterField,
    pub value: FilterValue,
}

impl FieldFilter {
    /// Text equality.
    pub fn text(field: FilterField, value: impl Into<String>) -> Self {
        Self {
            field,
            value: FilterValue::Text(value.into()),
        }
    }

    /// Boolean equality.
    pub fn boolean(field: FilterField, value: bool) -> Self {
        Self {
            field,
            value: FilterValue::Bool(value),
        }
    }

    /// Whether the document satisfies this predicate. Missing fields never match.
    pub fn matches(&self, document: &Document) -> bool {
        document
            .field(self.field.field_name())
            .is_some_and(|stored| self.value.matches(stored))
    }
}

/// Ordering clause. Queries only ever order by creation time, newest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderBy {
    CreatedAtDesc,
}

impl OrderBy {
    /// Name of the ordered timestamp field.
    pub const FIELD: &'static str = "createdAt";

    /// Newest first.
    pub fn created_at_desc() -> Self {
        Self::CreatedAtDesc
    }

    /// Compare two documents. Undated documents sort after dated ones.
    pub fn compare(&self, a: &Document, b: &Document) -> Ordering {
        match self {
            Self::CreatedAtDesc => compare_newest_first(a.created_at, b.created_at),
        }
    }
}

fn compare_newest_first(a: Option<DateTime<Utc>>, b: Option<DateTime<Utc>>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// A composed read request against one collection.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub collection: Collection,
    /// Equality predicates, combined with AND.
    pub filters: Vec<FieldFilter>,
    pub order_by: OrderBy,
    pub limit: Option<usize>,
}

impl Query {
    /// A query matching every document in the collection, newest first.
    pub fn new(collection: Collection) -> Self {
        Self {
            collection,
            filters: Vec::new(),
            order_by: OrderBy::created_at_desc(),
            limit: None,
        }
    }

    /// Add an equality predicate.
    pub fn filter(mut self, filter: FieldFilter) -> Self {
        self.filters.push(filter);
        self
    }

    /// Cap the number of results.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Whether a document satisfies every predicate.
    pub fn matches(&self, document: &Document) -> bool {
        self.filters.iter().all(|f| f.matches(document))
    }

    /// Filter, order, and truncate documents.
    ///
    /// `documents` must arrive newest-inserted first; the sort is stable so
    /// documents with equal timestamps keep that order.
    pub fn apply<I>(&self, documents: I) -> Vec<Document>
    where
        I: IntoIterator<Item = Document>,
    {
        let mut matched: Vec<Document> = documents
            .into_iter()
            .filter(|doc| self.matches(doc))
            .collect();
        matched.sort_by(|a, b| self.order_by.compare(a, b));
        if let Some(limit) = self.limit {
            matched.truncate(limit);
        }
        matched
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

/// Optional predicates for searching donors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DonorFilter {
    pub user_id: Option<String>,
    pub blood_group: Option<BloodGroup>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub is_available: Option<bool>,
    pub limit: Option<usize>,
}

impl DonorFilter {
    /// No predicates: matches every donor.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn blood_group(mut self, blood_group: BloodGroup) -> Self {
        self.blood_group = Some(blood_group);
        self
    }

    pub fn city(mut self, city: impl Into<String>) -> Self {
        self.city = Some(city.into());
        self
    }

    pub fn state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }

    pub fn available(mut self, is_available: bool) -> Self {
        self.is_available = Some(is_available);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Compose the donor query.
    pub fn build_query(&self) -> Query {
        let mut query = Query::new(Collection::Donors);
        if let Some(user_id) = non_blank(&self.user_id) {
            query = query.filter(FieldFilter::text(FilterField::UserId, user_id));
        }
        if let Some(blood_group) = self.blood_group {
            query = query.filter(FieldFilter::text(
                FilterField::BloodGroup,
                blood_group.as_str(),
            ));
        }
        if let Some(city) = non_blank(&self.city) {
            query = query.filter(FieldFilter::text(FilterField::City, city));
        }
        if let Some(state) = non_blank(&self.state) {
            query = query.filter(FieldFilter::text(FilterField::State, state));
        }
        if let Some(is_available) = self.is_available {
            query = query.filter(FieldFilter::boolean(FilterField::IsAvailable, is_available));
        }
        query.limit = self.limit;
        query
    }
}

/// Optional predicates for searching blood requests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestFilter {
    pub user_id: Option<String>,
    pub blood_group: Option<BloodGroup>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub status: Option<RequestStatus>,
    pub limit: Option<usize>,
}

impl RequestFilter {
    /// No predicates: matches every request.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn blood_group(mut self, blood_group: BloodGroup) -> Self {
        self.blood_group = Some(blood_group);
        self
    }

    pub fn city(mut self, city: impl Into<String>) -> Self {
        self.city = Some(city.into());
        self
    }

    pub fn state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }

    pub fn status(mut self, status: RequestStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Compose the blood request query.
    pub fn build_query(&self) -> Query {
        let mut query = Query::new(Collection::BloodRequests);
        if let Some(user_id) = non_blank(&self.user_id) {
            query = query.filter(FieldFilter::text(FilterField::UserId, user_id));
        }
        if let Some(blood_group) = self.blood_group {
            query = query.filter(FieldFilter::text(
                FilterField::BloodGroup,
                blood_group.as_str(),
            ));
        }
        if let Some(city) = non_blank(&self.city) {
            query = query.filter(FieldFilter::text(FilterField::City, city));
        }
        if let Some(state) = non_blank(&self.state) {
            query = query.filter(FieldFilter::text(FilterField::State, state));
        }
        if let Some(status) = self.status {
            query = query.filter(FieldFilter::text(FilterField::Status, status.as_str()));
        }
        query.limit = self.limit;
        query
    }
}
