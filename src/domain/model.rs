use crate::utils::error::{RelayError, Result};
use crate::utils::validation::{check_length, is_valid_email, normalize_email};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const NAME_MESSAGE: &str = "Name must be between 2 and 100 characters";
pub const EMAIL_MESSAGE: &str = "Please provide a valid email address";
pub const COMPANY_MESSAGE: &str = "Company name must be less than 100 characters";
pub const MESSAGE_MESSAGE: &str = "Message must be between 10 and 5000 characters";

/// A single rejected field, returned verbatim to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &str, message: &str) -> Self {
        Self {
            field: field.to_string(),
            message: message.to_string(),
        }
    }
}

/// Raw contact form body as posted by the site.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContactForm {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewsletterForm {
    #[serde(default)]
    pub email: Option<String>,
}

/// Validated, trimmed and normalized contact submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactSubmission {
    pub name: String,
    pub email: String,
    pub company: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewsletterSignup {
    pub email: String,
}

impl TryFrom<ContactForm> for ContactSubmission {
    type Error = RelayError;

    fn try_from(form: ContactForm) -> Result<Self> {
        let mut errors = Vec::new();

        let name = trimmed(form.name);
        if let Some(error) = check_length("name", &name, 2, 100, NAME_MESSAGE) {
            errors.push(error);
        }

        let email = match parse_email(form.email) {
            Ok(email) => email,
            Err(error) => {
                errors.push(error);
                String::new()
            }
        };

        // 公司欄位是選填；送了空字串就當作沒填
        let company = form.company.map(|c| c.trim().to_string());
        if let Some(company) = &company {
            if let Some(error) = check_length("company", company, 0, 100, COMPANY_MESSAGE) {
                errors.push(error);
            }
        }

        let message = trimmed(form.message);
        if let Some(error) = check_length("message", &message, 10, 5000, MESSAGE_MESSAGE) {
            errors.push(error);
        }

        if !errors.is_empty() {
            return Err(RelayError::ValidationError { errors });
        }

        Ok(Self {
            name,
            email,
            company: company.filter(|c| !c.is_empty()),
            message,
        })
    }
}

impl TryFrom<NewsletterForm> for NewsletterSignup {
    type Error = RelayError;

    fn try_from(form: NewsletterForm) -> Result<Self> {
        let email = parse_email(form.email)
            .map_err(|error| RelayError::ValidationError { errors: vec![error] })?;
        Ok(Self { email })
    }
}

fn trimmed(value: Option<String>) -> String {
    value.map(|v| v.trim().to_string()).unwrap_or_default()
}

fn parse_email(value: Option<String>) -> std::result::Result<String, FieldError> {
    let email = trimmed(value);
    if !is_valid_email(&email) {
        return Err(FieldError::new("email", EMAIL_MESSAGE));
    }
    normalize_email(&email)
        // 結果也必須是 lettre 可解析的地址
        .filter(|normalized| normalized.parse::<lettre::Address>().is_ok())
        .ok_or_else(|| FieldError::new("email", EMAIL_MESSAGE))
}

/// Which limiter rejected a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LimitScope {
    Global,
    Contact,
    Newsletter,
}

impl LimitScope {
    pub fn advisory(&self) -> &'static str {
        match self {
            LimitScope::Global => "Too many requests, please try again later.",
            LimitScope::Contact => "Too many contact submissions, please try again later.",
            LimitScope::Newsletter => "Too many newsletter signups, please try again later.",
        }
    }
}

impl fmt::Display for LimitScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LimitScope::Global => "global",
            LimitScope::Contact => "contact",
            LimitScope::Newsletter => "newsletter",
        };
        f.write_str(name)
    }
}

/// Operating mode; production disables preview links and the test transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Production,
    #[default]
    Development,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Production => "production",
            Mode::Development => "development",
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Mode::Production)
    }
}

impl std::str::FromStr for Mode {
    type Err = RelayError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Ok(Mode::Production),
            "development" | "dev" | "" => Ok(Mode::Development),
            other => Err(RelayError::InvalidConfigValueError {
                field: "APP_ENV".to_string(),
                value: other.to_string(),
                reason: "Expected 'production' or 'development'".to_string(),
            }),
        }
    }
}

/// Fully composed email ready for a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub from: String,
    pub to: String,
    pub reply_to: String,
    pub subject: String,
    pub message_id: String,
    pub text_body: String,
    pub html_body: String,
}

/// What the transport reports back after accepting a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub message_id: String,
    pub preview_url: Option<String>,
}

/// Successful contact relay outcome surfaced to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactReceipt {
    pub message_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview_url: Option<String>,
}
