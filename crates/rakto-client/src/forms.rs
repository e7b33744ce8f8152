//! Form input and validation.
//!
//! Forms hold raw text as typed into the screen. Converting a form into a
//! write shape validates every field and reports all failures at once, so
//! nothing reaches the backend unless the whole form is valid.

use std::fmt;

use chrono::NaiveDate;
use rakto_core::{
    BloodGroup, EmergencyContact, Fields, GeoPoint, Gender, NewBloodRequest, NewDonor,
    RequestStatus, Urgency,
};
use rakto_database::validation::{
    parse_choice, parse_past_date, parse_units, validate_email, validate_phone_number,
    validate_pincode, validate_required, MAX_TEXT_LENGTH,
};
use rakto_database::ValidationError;
use serde_json::Value;

/// A validation failure on one form field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Field name as stored (e.g. `bloodGroup`).
    pub field: &'static str,
    pub error: ValidationError,
}

/// Every validation failure of a form, in field order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormErrors {
    errors: Vec<FieldError>,
}

impl FormErrors {
    /// A single-field failure.
    pub fn single(field: &'static str, error: ValidationError) -> Self {
        let mut errors = Self::default();
        errors.push(field, error);
        errors
    }

    pub fn push(&mut self, field: &'static str, error: ValidationError) {
        self.errors.push(FieldError { field, error });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn first(&self) -> Option<&FieldError> {
        self.errors.first()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.errors.iter()
    }

    /// The error reported for `field`, if any.
    pub fn get(&self, field: &str) -> Option<&ValidationError> {
        self.errors
            .iter()
            .find(|e| e.field == field)
            .map(|e| &e.error)
    }

    /// Names of the failing fields.
    pub fn fields(&self) -> Vec<&'static str> {
        self.errors.iter().map(|e| e.field).collect()
    }

    /// Record the outcome of one field check, keeping the value on success.
    fn check<T>(&mut self, field: &'static str, result: Result<T, ValidationError>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(error) => {
                self.push(field, error);
                None
            }
        }
    }
}

impl fmt::Display for FormErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<String> = self.errors.iter().map(|e| e.error.to_string()).collect();
        write!(f, "{}", messages.join("; "))
    }
}

impl std::error::Error for FormErrors {}

fn required_text(label: &str, value: &str) -> Result<String, ValidationError> {
    validate_required(label, value).map(|v| v.trim().to_string())
}

fn required_phone(label: &str, value: &str) -> Result<String, ValidationError> {
    let value = required_text(label, value)?;
    validate_phone_number(&value)?;
    Ok(value)
}

fn required_pincode(label: &str, value: &str) -> Result<String, ValidationError> {
    let value = required_text(label, value)?;
    validate_pincode(&value)?;
    Ok(value)
}

fn optional_text(label: &str, value: &str) -> Result<Option<String>, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    let len = value.chars().count();
    if len > MAX_TEXT_LENGTH {
        return Err(ValidationError::TooLong {
            field: label.to_string(),
            max: MAX_TEXT_LENGTH,
            actual: len,
        });
    }
    Ok(Some(value.to_string()))
}

/// Donor registration screen input.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DonorRegistrationForm {
    pub name: String,
    pub blood_group: String,
    /// `YYYY-MM-DD`.
    pub date_of_birth: String,
    pub gender: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub pincode: String,
    pub emergency_contact_name: String,
    pub emergency_contact_phone: String,
    /// Device location, when the user granted access.
    pub location: Option<GeoPoint>,
}

impl DonorRegistrationForm {
    /// Validate the form and build the donor record for `user_id`.
    ///
    /// The donor's phone number comes from the signed-in account, not the
    /// form. New donors start out available.
    pub fn to_new_donor(
        &self,
        user_id: &str,
        phone_number: &str,
        today: NaiveDate,
    ) -> Result<NewDonor, FormErrors> {
        let mut errors = FormErrors::default();

        let name = errors.check("name", required_text("Name", &self.name));
        let blood_group = errors.check(
            "bloodGroup",
            parse_choice::<BloodGroup>("blood group", &self.blood_group),
        );
        let date_of_birth = errors.check(
            "dateOfBirth",
            parse_past_date("date of birth", &self.date_of_birth, today),
        );
        let gender = errors.check("gender", parse_choice::<Gender>("gender", &self.gender));
        let address = errors.check("address", required_text("Address", &self.address));
        let city = errors.check("city", required_text("City", &self.city));
        let state = errors.check("state", required_text("State", &self.state));
        let pincode = errors.check("pincode", required_pincode("Pincode", &self.pincode));
        let contact_name = errors.check(
            "emergencyContactName",
            required_text("Emergency contact name", &self.emergency_contact_name),
        );
        let contact_phone = errors.check(
            "emergencyContactPhone",
            required_phone("Emergency contact phone", &self.emergency_contact_phone),
        );

        let (
            Some(name),
            Some(blood_group),
            Some(date_of_birth),
            Some(gender),
            Some(address),
            Some(city),
            Some(state),
            Some(pincode),
            Some(contact_name),
            Some(contact_phone),
        ) = (
            name,
            blood_group,
            date_of_birth,
            gender,
            address,
            city,
            state,
            pincode,
            contact_name,
            contact_phone,
        )
        else {
            return Err(errors);
        };

        Ok(NewDonor {
            user_id: user_id.to_string(),
            name,
            phone_number: phone_number.to_string(),
            blood_group,
            date_of_birth,
            gender,
            address,
            city,
            state,
            pincode,
            location: self.location,
            is_available: true,
            last_donation_date: None,
            next_available_date: None,
            emergency_contact: Some(EmergencyContact {
                name: contact_name,
                phone: contact_phone,
            }),
        })
    }
}

/// Blood request screen input.
#[derive(Debug, Clone, PartialEq)]
pub struct BloodRequestForm {
    pub patient_name: String,
    pub blood_group: String,
    pub units: String,
    pub hospital_name: String,
    pub hospital_address: String,
    pub city: String,
    pub state: String,
    pub urgency: String,
    pub contact_number: String,
    pub additional_info: String,
}

impl Default for BloodRequestForm {
    fn default() -> Self {
        Self {
            patient_name: String::new(),
            blood_group: String::new(),
            units: "1".to_string(),
            hospital_name: String::new(),
            hospital_address: String::new(),
            city: String::new(),
            state: String::new(),
            urgency: Urgency::default().to_string(),
            contact_number: String::new(),
            additional_info: String::new(),
        }
    }
}

impl BloodRequestForm {
    /// Validate the form and build a pending request owned by `user_id`.
    pub fn to_new_request(&self, user_id: &str) -> Result<NewBloodRequest, FormErrors> {
        let mut errors = FormErrors::default();

        let patient_name = errors.check(
            "patientName",
            required_text("Patient name", &self.patient_name),
        );
        let blood_group = errors.check(
            "bloodGroup",
            parse_choice::<BloodGroup>("blood group", &self.blood_group),
        );
        let units = errors.check("units", parse_units(&self.units));
        let hospital_name = errors.check(
            "hospitalName",
            required_text("Hospital name", &self.hospital_name),
        );
        let hospital_address = errors.check(
            "hospitalAddress",
            required_text("Hospital address", &self.hospital_address),
        );
        let city = errors.check("city", required_text("City", &self.city));
        let state = errors.check("state", required_text("State", &self.state));
        let urgency = errors.check("urgency", parse_choice::<Urgency>("urgency", &self.urgency));
        let contact_number = errors.check(
            "contactNumber",
            required_phone("Contact number", &self.contact_number),
        );
        let additional_info = errors.check(
            "additionalInfo",
            optional_text("Additional info", &self.additional_info),
        );

        let (
            Some(patient_name),
            Some(blood_group),
            Some(units),
            Some(hospital_name),
            Some(hospital_address),
            Some(city),
            Some(state),
            Some(urgency),
            Some(contact_number),
            Some(additional_info),
        ) = (
            patient_name,
            blood_group,
            units,
            hospital_name,
            hospital_address,
            city,
            state,
            urgency,
            contact_number,
            additional_info,
        )
        else {
            return Err(errors);
        };

        Ok(NewBloodRequest {
            user_id: user_id.to_string(),
            patient_name,
            blood_group,
            units,
            hospital_name,
            hospital_address,
            city,
            state,
            urgency,
            contact_number,
            additional_info,
            status: RequestStatus::Pending,
        })
    }
}

/// Profile screen input. Blank fields clear the stored value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileForm {
    pub display_name: String,
    pub email: String,
}

impl ProfileForm {
    /// Validate and build the partial update for the `users` document.
    pub fn to_patch(&self) -> Result<Fields, FormErrors> {
        let mut errors = FormErrors::default();

        let display_name = errors.check(
            "displayName",
            optional_text("Display name", &self.display_name),
        );
        let email = errors.check(
            "email",
            optional_text("Email", &self.email).and_then(|email| {
                if let Some(email) = &email {
                    validate_email(email)?;
                }
                Ok(email)
            }),
        );

        let (Some(display_name), Some(email)) = (display_name, email) else {
            return Err(errors);
        };

        let mut patch = Fields::new();
        patch.insert(
            "displayName".to_string(),
            display_name.map_or(Value::Null, Value::String),
        );
        patch.insert("email".to_string(), email.map_or(Value::Null, Value::String));
        Ok(patch)
    }
}
