//! Input validation for form fields.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;

/// Validation error types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Empty value where one is required.
    Empty(String),
    /// Invalid phone number format.
    InvalidPhone(String),
    /// Invalid email format.
    InvalidEmail(String),
    /// Invalid postal code format.
    InvalidPincode(String),
    /// Invalid one-time code.
    InvalidCode(String),
    /// Value is not one of the allowed choices.
    InvalidChoice { field: String, value: String },
    /// Value is not an acceptable number.
    InvalidNumber { field: String, reason: String },
    /// Value is not an acceptable date.
    InvalidDate { field: String, reason: String },
    /// Value too long.
    TooLong { field: String, max: usize, actual: usize },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::Empty(field) => write!(f, "{} is required", field),
            ValidationError::InvalidPhone(msg) => write!(f, "Invalid phone number: {}", msg),
            ValidationError::InvalidEmail(msg) => write!(f, "Invalid email: {}", msg),
            ValidationError::InvalidPincode(msg) => write!(f, "Invalid pincode: {}", msg),
            ValidationError::InvalidCode(msg) => write!(f, "Invalid code: {}", msg),
            ValidationError::InvalidChoice { field, value } => {
                write!(f, "'{}' is not a valid {}", value, field)
            }
            ValidationError::InvalidNumber { field, reason } => {
                write!(f, "Invalid {}: {}", field, reason)
            }
            ValidationError::InvalidDate { field, reason } => {
                write!(f, "Invalid {}: {}", field, reason)
            }
            ValidationError::TooLong { field, max, actual } => {
                write!(f, "{} is too long ({} chars, max {})", field, actual, max)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Maximum allowed length for email addresses.
pub const MAX_EMAIL_LENGTH: usize = 254;

/// Maximum allowed length for free-text fields (names, addresses, notes).
pub const MAX_TEXT_LENGTH: usize = 500;

/// Maximum digits in an E.164 number (excluding the leading '+').
pub const MAX_PHONE_DIGITS: usize = 15;

/// Upper bound on units in a single blood request.
pub const MAX_UNITS: u32 = 50;

/// Length of a one-time verification code.
pub const OTP_CODE_LENGTH: usize = 6;

/// Check that a required field is present and not overly long.
///
/// Returns the value as given; whitespace-only input counts as empty.
pub fn validate_required<'a>(field: &str, value: &'a str) -> Result<&'a str, ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Empty(field.to_string()));
    }

    let len = value.chars().count();
    if len > MAX_TEXT_LENGTH {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_TEXT_LENGTH,
            actual: len,
        });
    }

    Ok(value)
}

/// Normalize user-entered phone input.
///
/// Strips everything except digits and '+', then ensures a leading '+'.
pub fn normalize_phone_number(phone: &str) -> String {
    let cleaned: String = phone
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '+')
        .collect();

    if cleaned.starts_with('+') {
        cleaned
    } else {
        format!("+{}", cleaned)
    }
}

/// Validate an E.164-like phone number.
///
/// Accepts an optional leading '+', followed by a non-zero digit and
/// 1 to 14 further digits.
pub fn validate_phone_number(phone: &str) -> Result<(), ValidationError> {
    if phone.is_empty() {
        return Err(ValidationError::Empty("phone number".to_string()));
    }

    let digits = phone.strip_prefix('+').unwrap_or(phone);

    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::InvalidPhone(
            "only digits and a leading '+' are allowed".to_string(),
        ));
    }

    if digits.starts_with('0') {
        return Err(ValidationError::InvalidPhone(
            "must not start with 0 after the country code prefix".to_string(),
        ));
    }

    if digits.len() < 2 || digits.len() > MAX_PHONE_DIGITS {
        return Err(ValidationError::InvalidPhone(format!(
            "must have between 2 and {} digits",
            MAX_PHONE_DIGITS
        )));
    }

    Ok(())
}

/// Validate an email address.
///
/// Matches the basic `local@domain.tld` shape: no whitespace, exactly one
/// '@', and a dot somewhere after the '@' with text on both sides.
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    let email = email.trim();

    if email.is_empty() {
        return Err(ValidationError::Empty("email".to_string()));
    }

    if email.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::TooLong {
            field: "email".to_string(),
            max: MAX_EMAIL_LENGTH,
            actual: email.len(),
        });
    }

    if email.chars().any(char::is_whitespace) {
        return Err(ValidationError::InvalidEmail(
            "must not contain whitespace".to_string(),
        ));
    }

    let Some((local, domain)) = email.split_once('@') else {
        return Err(ValidationError::InvalidEmail(
            "must contain an @ symbol".to_string(),
        ));
    };

    if domain.contains('@') {
        return Err(ValidationError::InvalidEmail(
            "must contain exactly one @ symbol".to_string(),
        ));
    }

    if local.is_empty() {
        return Err(ValidationError::InvalidEmail(
            "missing local part (before @)".to_string(),
        ));
    }

    match domain.rsplit_once('.') {
        Some((name, tld)) if !name.is_empty() && !tld.is_empty() => Ok(()),
        _ => Err(ValidationError::InvalidEmail(
            "domain must look like name.tld".to_string(),
        )),
    }
}

/// Validate a postal code: 5 or 6 ASCII digits.
pub fn validate_pincode(pincode: &str) -> Result<(), ValidationError> {
    if pincode.is_empty() {
        return Err(ValidationError::Empty("pincode".to_string()));
    }

    if !pincode.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::InvalidPincode(
            "must contain only digits".to_string(),
        ));
    }

    if !(5..=6).contains(&pincode.len()) {
        return Err(ValidationError::InvalidPincode(
            "must be 5 or 6 digits".to_string(),
        ));
    }

    Ok(())
}

/// Validate a one-time verification code.
pub fn validate_otp_code(code: &str) -> Result<(), ValidationError> {
    if code.len() != OTP_CODE_LENGTH || !code.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::InvalidCode(format!(
            "please enter a valid {}-digit code",
            OTP_CODE_LENGTH
        )));
    }
    Ok(())
}

/// Parse the number of units in a blood request: an integer in `1..=MAX_UNITS`.
pub fn parse_units(units: &str) -> Result<u32, ValidationError> {
    let units = units.trim();
    if units.is_empty() {
        return Err(ValidationError::Empty("units".to_string()));
    }

    let value: u32 = units.parse().map_err(|_| ValidationError::InvalidNumber {
        field: "units".to_string(),
        reason: format!("'{}' is not a whole number", units),
    })?;

    if value == 0 || value > MAX_UNITS {
        return Err(ValidationError::InvalidNumber {
            field: "units".to_string(),
            reason: format!("must be between 1 and {}", MAX_UNITS),
        });
    }

    Ok(value)
}

/// Parse a `YYYY-MM-DD` date that must not be after `today`.
pub fn parse_past_date(field: &str, value: &str, today: NaiveDate) -> Result<NaiveDate, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::Empty(field.to_string()));
    }

    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| {
        ValidationError::InvalidDate {
            field: field.to_string(),
            reason: "expected YYYY-MM-DD".to_string(),
        }
    })?;

    if date > today {
        return Err(ValidationError::InvalidDate {
            field: field.to_string(),
            reason: "must not be in the future".to_string(),
        });
    }

    Ok(date)
}

/// Parse one of a closed set of choices (blood group, gender, urgency, ...).
pub fn parse_choice<T: FromStr>(field: &str, value: &str) -> Result<T, ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Empty(field.to_string()));
    }

    value.parse().map_err(|_| ValidationError::InvalidChoice {
        field: field.to_string(),
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rakto_core::{BloodGroup, Urgency};

    #[test]
    fn test_validate_required() {
        assert_eq!(validate_required("name", "Rahim"), Ok("Rahim"));
        assert!(matches!(
            validate_required("name", "   "),
            Err(ValidationError::Empty(_))
        ));
        assert!(matches!(
            validate_required("address", &"x".repeat(MAX_TEXT_LENGTH + 1)),
            Err(ValidationError::TooLong { .. })
        ));
    }

    #[test]
    fn test_normalize_phone_number() {
        assert_eq!(normalize_phone_number("880 1712-345678"), "+8801712345678");
        assert_eq!(normalize_phone_number("+1 (555) 123-4567"), "+15551234567");
        assert_eq!(normalize_phone_number(""), "+");
    }

    #[test]
    fn test_validate_phone_number() {
        assert!(validate_phone_number("+8801712345678").is_ok());
        assert!(validate_phone_number("15551234567").is_ok());
        assert!(validate_phone_number("+12").is_ok());

        assert!(matches!(
            validate_phone_number(""),
            Err(ValidationError::Empty(_))
        ));
        assert!(matches!(
            validate_phone_number("+0123456"),
            Err(ValidationError::InvalidPhone(_))
        ));
        assert!(matches!(
            validate_phone_number("+1"),
            Err(ValidationError::InvalidPhone(_))
        ));
        assert!(matches!(
            validate_phone_number("+1234567890123456"),
            Err(ValidationError::InvalidPhone(_))
        ));
        assert!(matches!(
            validate_phone_number("+1555-123"),
            Err(ValidationError::InvalidPhone(_))
        ));
        assert!(matches!(
            validate_phone_number("+"),
            Err(ValidationError::InvalidPhone(_))
        ));
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("test@example.com").is_ok());
        assert!(validate_email("user.name@domain.co.uk").is_ok());
        assert!(validate_email(" a@b.c ").is_ok()); // trimmed

        assert!(matches!(validate_email(""), Err(ValidationError::Empty(_))));
        assert!(matches!(
            validate_email("test.example.com"),
            Err(ValidationError::InvalidEmail(_))
        ));
        assert!(matches!(
            validate_email("a@b@c.com"),
            Err(ValidationError::InvalidEmail(_))
        ));
        assert!(matches!(
            validate_email("@example.com"),
            Err(ValidationError::InvalidEmail(_))
        ));
        assert!(matches!(
            validate_email("test@localhost"),
            Err(ValidationError::InvalidEmail(_))
        ));
        assert!(matches!(
            validate_email("test@example."),
            Err(ValidationError::InvalidEmail(_))
        ));
        assert!(matches!(
            validate_email("te st@example.com"),
            Err(ValidationError::InvalidEmail(_))
        ));
    }

    #[test]
    fn test_validate_pincode() {
        assert!(validate_pincode("12345").is_ok());
        assert!(validate_pincode("560001").is_ok());

        assert!(matches!(validate_pincode(""), Err(ValidationError::Empty(_))));
        assert!(matches!(
            validate_pincode("1234"),
            Err(ValidationError::InvalidPincode(_))
        ));
        assert!(matches!(
            validate_pincode("1234567"),
            Err(ValidationError::InvalidPincode(_))
        ));
        assert!(matches!(
            validate_pincode("12a45"),
            Err(ValidationError::InvalidPincode(_))
        ));
    }

    #[test]
    fn test_validate_otp_code() {
        assert!(validate_otp_code("123456").is_ok());
        assert!(validate_otp_code("12345").is_err());
        assert!(validate_otp_code("12345a").is_err());
        assert!(validate_otp_code("1234567").is_err());
    }

    #[test]
    fn test_parse_units() {
        assert_eq!(parse_units("2"), Ok(2));
        assert_eq!(parse_units(" 3 "), Ok(3));

        assert!(matches!(parse_units(""), Err(ValidationError::Empty(_))));
        assert!(matches!(
            parse_units("0"),
            Err(ValidationError::InvalidNumber { .. })
        ));
        assert!(matches!(
            parse_units("two"),
            Err(ValidationError::InvalidNumber { .. })
        ));
        assert!(matches!(
            parse_units("-1"),
            Err(ValidationError::InvalidNumber { .. })
        ));
        assert!(matches!(
            parse_units("51"),
            Err(ValidationError::InvalidNumber { .. })
        ));
    }

    #[test]
    fn test_parse_past_date() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        assert_eq!(
            parse_past_date("date of birth", "1990-02-28", today),
            Ok(NaiveDate::from_ymd_opt(1990, 2, 28).unwrap())
        );
        assert!(matches!(
            parse_past_date("date of birth", "28/02/1990", today),
            Err(ValidationError::InvalidDate { .. })
        ));
        assert!(matches!(
            parse_past_date("date of birth", "2024-06-02", today),
            Err(ValidationError::InvalidDate { .. })
        ));
    }

    #[test]
    fn test_parse_choice() {
        assert_eq!(parse_choice::<BloodGroup>("blood group", "A-"), Ok(BloodGroup::ANegative));
        assert_eq!(parse_choice::<Urgency>("urgency", "high"), Ok(Urgency::High));
        assert!(matches!(
            parse_choice::<BloodGroup>("blood group", "C+"),
            Err(ValidationError::InvalidChoice { .. })
        ));
        assert!(matches!(
            parse_choice::<BloodGroup>("blood group", ""),
            Err(ValidationError::Empty(_))
        ));
    }

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::Empty("Name".to_string());
        assert_eq!(err.to_string(), "Name is required");

        let err = ValidationError::InvalidChoice {
            field: "blood group".to_string(),
            value: "C+".to_string(),
        };
        assert_eq!(err.to_string(), "'C+' is not a valid blood group");
    }
}
