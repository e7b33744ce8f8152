//! Closed enumerations shared by records and filters.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Returned when parsing a string that is not a member of an enumeration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariant {
    /// Enumeration name (e.g. "blood group").
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
}

impl fmt::Display for UnknownVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown {}: '{}'", self.kind, self.value)
    }
}

impl std::error::Error for UnknownVariant {}

/// Declares a string-backed enum with serde names, `as_str`, `ALL`, and `FromStr`.
macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $kind:literal {
            $($(#[$vmeta:meta])* $variant:ident => $text:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $($(#[$vmeta])* #[serde(rename = $text)] $variant),+
        }

        impl $name {
            /// Every member, in display order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// The wire representation of this value.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    _ => Err(UnknownVariant {
                        kind: $kind,
                        value: s.to_string(),
                    }),
                }
            }
        }
    };
}

string_enum! {
    /// ABO/Rh blood group.
    BloodGroup, "blood group" {
        APositive => "A+",
        ANegative => "A-",
        BPositive => "B+",
        BNegative => "B-",
        AbPositive => "AB+",
        AbNegative => "AB-",
        OPositive => "O+",
        ONegative => "O-",
    }
}

string_enum! {
    /// Donor gender.
    Gender, "gender" {
        Male => "male",
        Female => "female",
        Other => "other",
    }
}

string_enum! {
    /// Severity of a blood request.
    Urgency, "urgency" {
        Low => "low",
        Medium => "medium",
        High => "high",
        Critical => "critical",
    }
}

string_enum! {
    /// Lifecycle status of a blood request.
    RequestStatus, "request status" {
        Pending => "pending",
        Fulfilled => "fulfilled",
        Cancelled => "cancelled",
    }
}

impl Default for Urgency {
    fn default() -> Self {
        Urgency::Medium
    }
}

impl Default for RequestStatus {
    fn default() -> Self {
        RequestStatus::Pending
    }
}

impl RequestStatus {
    /// Whether a request in this status may move to `next`.
    ///
    /// Only pending requests can be closed, either as fulfilled or cancelled.
    pub fn can_transition_to(&self, next: RequestStatus) -> bool {
        matches!(
            (self, next),
            (RequestStatus::Pending, RequestStatus::Fulfilled)
                | (RequestStatus::Pending, RequestStatus::Cancelled)
        )
    }
}

/// Logical backend collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    /// User profiles, keyed by auth uid.
    Users,
    /// Donor profiles.
    Donors,
    /// Blood requests.
    BloodRequests,
}

impl Collection {
    /// Collection name as stored by the backend.
    pub fn name(&self) -> &'static str {
        match self {
            Collection::Users => "users",
            Collection::Donors => "donors",
            Collection::BloodRequests => "bloodRequests",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
