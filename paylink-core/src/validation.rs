//! Field-level validation of submitted forms
//!
//! Forms arrive as loosely-typed input (missing fields deserialize to empty
//! strings) and are turned into validated records. Every violated field is
//! reported, not just the first one.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};

use crate::{Error, Result};

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid"));

/// Ten ASCII digits, leading digit 6-9. `\d` would also admit other scripts' digits.
static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[6-9][0-9]{9}$").expect("phone pattern is valid"));

pub const MIN_NAME_LEN: usize = 3;
pub const MIN_MESSAGE_LEN: usize = 10;

/// Validation failures keyed by field name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_string()).or_insert_with(|| message.into());
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `Ok(value)` when no field failed
    pub fn into_result<T>(self, value: T) -> Result<T> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(Error::Validation(self))
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields: Vec<&str> = self.0.keys().map(String::as_str).collect();
        write!(f, "invalid fields: {}", fields.join(", "))
    }
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

pub fn is_valid_phone(phone: &str) -> bool {
    PHONE_RE.is_match(phone)
}

/// Any JSON scalar a browser form might send for a text field
#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl Scalar {
    fn into_text(self) -> String {
        match self {
            Scalar::Text(s) => s,
            Scalar::Int(n) => n.to_string(),
            Scalar::Float(f) => f.to_string(),
            Scalar::Bool(b) => b.to_string(),
        }
    }
}

// Scalars of the wrong JSON type become text and are judged by the field
// rules, so `"phone": 12345` is a phone error rather than a decode failure.
fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Scalar>::deserialize(deserializer)?
        .map(Scalar::into_text)
        .unwrap_or_default())
}

fn lenient_opt_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Scalar>::deserialize(deserializer)?.map(Scalar::into_text))
}

/// Numbers and numeric strings; anything else reads as absent
fn lenient_amount<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Scalar>::deserialize(deserializer)? {
        Some(Scalar::Int(n)) => Some(n as f64),
        Some(Scalar::Float(f)) => Some(f),
        Some(Scalar::Text(s)) => s.trim().parse().ok(),
        Some(Scalar::Bool(_)) | None => None,
    })
}

/// Contact form as submitted by the website
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ContactForm {
    #[serde(deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(deserialize_with = "lenient_string")]
    pub email: String,
    #[serde(deserialize_with = "lenient_string")]
    pub phone: String,
    #[serde(deserialize_with = "lenient_string")]
    pub subject: String,
    #[serde(deserialize_with = "lenient_string")]
    pub message: String,
}

/// A contact submission that passed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewContact {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub subject: String,
    pub message: String,
}

impl ContactForm {
    pub fn validate(self) -> Result<NewContact> {
        let name = self.name.trim().to_string();
        let email = self.email.trim().to_string();
        let phone = self.phone.trim().to_string();
        let subject = self.subject.trim().to_string();
        let message = self.message.trim().to_string();

        let mut errors = FieldErrors::new();
        if name.chars().count() < MIN_NAME_LEN {
            errors.add("name", "Name must be at least 3 characters");
        }
        if !is_valid_email(&email) {
            errors.add("email", "Please enter a valid email address");
        }
        if !is_valid_phone(&phone) {
            errors.add("phone", "Please enter a valid 10-digit phone number");
        }
        if subject.is_empty() {
            errors.add("subject", "Subject is required");
        }
        if message.chars().count() < MIN_MESSAGE_LEN {
            errors.add("message", "Message must be at least 10 characters");
        }

        errors.into_result(NewContact {
            name,
            email,
            phone,
            subject,
            message,
        })
    }
}

/// Client record as entered in the admin panel
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ClientForm {
    #[serde(deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(deserialize_with = "lenient_string")]
    pub email: String,
    #[serde(deserialize_with = "lenient_string")]
    pub phone: String,
    #[serde(deserialize_with = "lenient_opt_string")]
    pub company: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewClient {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub company: Option<String>,
}

impl ClientForm {
    pub fn validate(self) -> Result<NewClient> {
        let name = self.name.trim().to_string();
        let email = self.email.trim().to_string();
        let phone = self.phone.trim().to_string();
        let company = self
            .company
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());

        let mut errors = FieldErrors::new();
        if name.is_empty() {
            errors.add("name", "Name is required");
        }
        if email.is_empty() {
            errors.add("email", "Email is required");
        } else if !is_valid_email(&email) {
            errors.add("email", "Please enter a valid email address");
        }
        if phone.is_empty() {
            errors.add("phone", "Phone is required");
        }

        errors.into_result(NewClient {
            name,
            email,
            phone,
            company,
        })
    }
}

/// Payment registration as submitted by a client
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PaymentForm {
    #[serde(deserialize_with = "lenient_string")]
    pub client_name: String,
    #[serde(deserialize_with = "lenient_string")]
    pub project_name: String,
    #[serde(deserialize_with = "lenient_string")]
    pub client_id: String,
    #[serde(deserialize_with = "lenient_amount")]
    pub amount: Option<f64>,
    #[serde(deserialize_with = "lenient_string")]
    pub due_date: String,
    #[serde(deserialize_with = "lenient_opt_string")]
    pub receipt_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewPayment {
    pub client_name: String,
    pub project_name: String,
    pub client_id: String,
    pub amount: f64,
    pub due_date: NaiveDate,
    pub receipt_url: Option<String>,
}

impl PaymentForm {
    pub fn validate(self) -> Result<NewPayment> {
        let client_name = self.client_name.trim().to_string();
        let project_name = self.project_name.trim().to_string();
        let client_id = self.client_id.trim().to_string();
        let receipt_url = self
            .receipt_url
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty());

        let mut errors = FieldErrors::new();
        if client_name.is_empty() {
            errors.add("clientName", "Client name is required");
        }
        if project_name.is_empty() {
            errors.add("projectName", "Project name is required");
        }
        if client_id.is_empty() {
            errors.add("clientId", "Client ID is required");
        }
        let amount = match self.amount {
            Some(a) if a.is_finite() && a > 0.0 => a,
            _ => {
                errors.add("amount", "Amount must be a positive number");
                0.0
            }
        };
        let due_date = match NaiveDate::parse_from_str(self.due_date.trim(), "%Y-%m-%d") {
            Ok(d) => Some(d),
            Err(_) => {
                errors.add("dueDate", "Due date must be in YYYY-MM-DD format");
                None
            }
        };

        match due_date {
            Some(due_date) => errors.into_result(NewPayment {
                client_name,
                project_name,
                client_id,
                amount,
                due_date,
                receipt_url,
            }),
            None => Err(Error::Validation(errors)),
        }
    }
}

/// Request to issue a client link. The id may arrive as a number or as the
/// string an HTML form produces.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LinkRequestForm {
    #[serde(deserialize_with = "lenient_string")]
    pub client_id: String,
}

impl LinkRequestForm {
    /// The numeric id of the client the link is for
    pub fn validate(self) -> Result<i64> {
        match self.client_id.trim().parse::<i64>() {
            Ok(id) if id > 0 => Ok(id),
            _ => {
                let mut errors = FieldErrors::new();
                errors.add("clientId", "Client ID must be a positive whole number");
                Err(Error::Validation(errors))
            }
        }
    }
}
