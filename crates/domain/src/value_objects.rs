//! Self-validating value objects.
//!
//! Each type exposes a single `create` factory returning a
//! [`DomainResult`]; there is no way to obtain an instance with invalid
//! internal state, and no mutator exists post-construction. Equality is
//! structural. When several fields fail at once the factory returns one
//! aggregated error per the rules in [`crate::error`].

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// Maximum accepted email length, exclusive.
const EMAIL_MAX_LEN: usize = 100;

/// Validates that a candidate value is non-blank and returns it trimmed.
fn require_text(field: &str, value: &str) -> DomainResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(DomainError::required(field))
    } else {
        Ok(trimmed.to_string())
    }
}

/// Pushes the error of a failed field validation onto the collector,
/// returning the value of a successful one.
fn collect<T>(result: DomainResult<T>, errors: &mut Vec<DomainError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            errors.push(err);
            None
        }
    }
}

/// A postal address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Address {
    street: String,
    postal_code: String,
    city: String,
}

impl Address {
    /// Validates and creates an address. All three fields are required.
    pub fn create(street: &str, postal_code: &str, city: &str) -> DomainResult<Self> {
        let mut errors = Vec::new();
        let street = collect(require_text("street", street), &mut errors);
        let postal_code = collect(require_text("postal code", postal_code), &mut errors);
        let city = collect(require_text("city", city), &mut errors);

        if !errors.is_empty() {
            return Err(DomainError::aggregate(errors));
        }

        Ok(Self {
            street: street.unwrap_or_default(),
            postal_code: postal_code.unwrap_or_default(),
            city: city.unwrap_or_default(),
        })
    }

    pub fn street(&self) -> &str {
        &self.street
    }

    pub fn postal_code(&self) -> &str {
        &self.postal_code
    }

    pub fn city(&self) -> &str {
        &self.city
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}, {} {}", self.street, self.postal_code, self.city)
    }
}

/// A validated email address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    /// Validates and creates an email address.
    ///
    /// The value is trimmed, must be shorter than 100 characters and must
    /// have a non-empty local part and domain separated by a single `@`.
    pub fn create(value: &str) -> DomainResult<Self> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(DomainError::required("email"));
        }
        if trimmed.chars().count() >= EMAIL_MAX_LEN {
            return Err(DomainError::too_long("email", EMAIL_MAX_LEN));
        }

        match trimmed.split_once('@') {
            Some((local, domain))
                if !local.is_empty()
                    && !domain.is_empty()
                    && !domain.contains('@')
                    && !trimmed.chars().any(char::is_whitespace) =>
            {
                Ok(Self(trimmed.to_string()))
            }
            _ => Err(DomainError::invalid(format!(
                "email \"{trimmed}\" is not a valid address"
            ))),
        }
    }

    pub fn value(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Email {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A validated phone number split into country code and subscriber number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PhoneNumber {
    country_code: String,
    number: String,
}

impl PhoneNumber {
    /// Validates and creates a phone number.
    ///
    /// The country code is trimmed and stripped of its leading `+` before
    /// the numeric check; it is stored in canonical `+digits` form. Both
    /// bodies must be purely numeric.
    pub fn create(country_code: &str, number: &str) -> DomainResult<Self> {
        let mut errors = Vec::new();

        let cc_digits = country_code.trim().trim_start_matches('+').to_string();
        if cc_digits.is_empty() {
            errors.push(DomainError::required("country code"));
        } else if !cc_digits.bytes().all(|b| b.is_ascii_digit()) {
            errors.push(DomainError::invalid(format!(
                "country code \"{}\" must be numeric",
                country_code.trim()
            )));
        }

        let number_digits = number.trim().to_string();
        if number_digits.is_empty() {
            errors.push(DomainError::required("phone number"));
        } else if !number_digits.bytes().all(|b| b.is_ascii_digit()) {
            errors.push(DomainError::invalid(format!(
                "phone number \"{}\" must be numeric",
                number.trim()
            )));
        }

        if !errors.is_empty() {
            return Err(DomainError::aggregate(errors));
        }

        Ok(Self {
            country_code: format!("+{cc_digits}"),
            number: number_digits,
        })
    }

    /// Returns the country code in canonical `+digits` form.
    pub fn country_code(&self) -> &str {
        &self.country_code
    }

    /// Returns the subscriber number.
    pub fn number(&self) -> &str {
        &self.number
    }

    /// Returns the canonical stored form: country code and number
    /// concatenated, e.g. `+4512345678`.
    pub fn value(&self) -> String {
        format!("{}{}", self.country_code, self.number)
    }
}

impl std::fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.country_code, self.number)
    }
}

/// A person's full name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FullName {
    first: String,
    last: String,
}

impl FullName {
    /// Validates and creates a full name. Both parts are required.
    pub fn create(first: &str, last: &str) -> DomainResult<Self> {
        let mut errors = Vec::new();
        let first = collect(require_text("first name", first), &mut errors);
        let last = collect(require_text("last name", last), &mut errors);

        if !errors.is_empty() {
            return Err(DomainError::aggregate(errors));
        }

        Ok(Self {
            first: first.unwrap_or_default(),
            last: last.unwrap_or_default(),
        })
    }

    pub fn first(&self) -> &str {
        &self.first
    }

    pub fn last(&self) -> &str {
        &self.last
    }
}

impl std::fmt::Display for FullName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.first, self.last)
    }
}
