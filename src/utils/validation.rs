use crate::domain::model::FieldError;
use crate::utils::error::{RelayError, Result};
use regex::Regex;
use std::sync::LazyLock;
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

// local part: dot-atom (quoted local parts are not accepted)
static EMAIL_LOCAL_PART: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^[a-z0-9!#$%&'*+\-/=?^_`{|}~]+(\.[a-z0-9!#$%&'*+\-/=?^_`{|}~]+)*$")
        .expect("email local-part pattern is valid")
});

static DOMAIN_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^[a-z0-9\u{00a1}-\u{ffff}]([a-z0-9\u{00a1}-\u{ffff}-]*[a-z0-9\u{00a1}-\u{ffff}])?$")
        .expect("domain label pattern is valid")
});

static TOP_LEVEL_DOMAIN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^([a-z\u{00a1}-\u{ffff}]{2,}|xn--[a-z0-9-]{2,})$")
        .expect("tld pattern is valid")
});

const MAX_EMAIL_LENGTH: usize = 254;
const MAX_LOCAL_PART_LENGTH: usize = 64;
const MAX_LABEL_LENGTH: usize = 63;

const GMAIL_DOMAINS: &[&str] = &["gmail.com", "googlemail.com"];
const ICLOUD_DOMAINS: &[&str] = &["icloud.com", "me.com", "mac.com"];
const OUTLOOK_DOMAINS: &[&str] = &[
    "hotmail.com",
    "hotmail.co.uk",
    "hotmail.fr",
    "live.com",
    "live.co.uk",
    "msn.com",
    "outlook.com",
    "outlook.de",
    "outlook.fr",
];
const YAHOO_DOMAINS: &[&str] = &[
    "rocketmail.com",
    "yahoo.ca",
    "yahoo.co.uk",
    "yahoo.com",
    "yahoo.de",
    "yahoo.fr",
    "yahoo.in",
    "yahoo.it",
    "ymail.com",
];

/// 檢查電子郵件語法 (dot-atom 本地部分 + 完整網域名稱)
pub fn is_valid_email(candidate: &str) -> bool {
    if candidate.is_empty() || candidate.len() > MAX_EMAIL_LENGTH {
        return false;
    }

    let Some((local, domain)) = candidate.rsplit_once('@') else {
        return false;
    };

    if local.is_empty() || local.len() > MAX_LOCAL_PART_LENGTH {
        return false;
    }
    if !EMAIL_LOCAL_PART.is_match(local) {
        return false;
    }

    is_fully_qualified_domain(domain)
}

fn is_fully_qualified_domain(domain: &str) -> bool {
    // 結尾的 "." 不接受 (jane@example.com.)
    if domain.ends_with('.') {
        return false;
    }
    let labels: Vec<&str> = domain.split('.').collect();

    if labels.len() < 2 {
        return false;
    }

    let Some(tld) = labels.last() else {
        return false;
    };
    if !TOP_LEVEL_DOMAIN.is_match(tld) {
        return false;
    }

    labels
        .iter()
        .all(|label| label.chars().count() <= MAX_LABEL_LENGTH && DOMAIN_LABEL.is_match(label))
}

/// 正規化電子郵件：網域一律小寫，常見郵件服務移除子地址與點號。
///
/// Returns `None` when normalization leaves an empty local part
/// (for example `+tag@gmail.com`).
pub fn normalize_email(email: &str) -> Option<String> {
    let (local, domain) = email.rsplit_once('@')?;
    let mut domain = domain.to_lowercase();

    let local = if GMAIL_DOMAINS.contains(&domain.as_str()) {
        domain = "gmail.com".to_string();
        strip_subaddress(local, '+').replace('.', "").to_lowercase()
    } else if ICLOUD_DOMAINS.contains(&domain.as_str())
        || OUTLOOK_DOMAINS.contains(&domain.as_str())
    {
        strip_subaddress(local, '+').to_lowercase()
    } else if YAHOO_DOMAINS.contains(&domain.as_str()) {
        // Yahoo 只去掉最後一段 "-" 後綴
        match local.rsplit_once('-') {
            Some((head, _)) => head.to_lowercase(),
            None => local.to_lowercase(),
        }
    } else {
        local.to_lowercase()
    };

    if local.is_empty() {
        return None;
    }

    Some(format!("{}@{}", local, domain))
}

fn strip_subaddress(local: &str, separator: char) -> &str {
    local.split(separator).next().unwrap_or(local)
}

/// Trimmed-length check counted in characters.
pub fn check_length(
    field: &str,
    value: &str,
    min: usize,
    max: usize,
    message: &str,
) -> Option<FieldError> {
    let length = value.chars().count();
    if length < min || length > max {
        return Some(FieldError::new(field, message));
    }
    None
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(RelayError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: "URL cannot be empty".to_string(),
        });
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(RelayError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: url_str.to_string(),
                reason: format!("Unsupported URL scheme: {}", scheme),
            }),
        },
        Err(e) => Err(RelayError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: format!("Invalid URL format: {}", e),
        }),
    }
}

pub fn validate_positive_number(field_name: &str, value: u64, min_value: u64) -> Result<()> {
    if value < min_value {
        return Err(RelayError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be at least {}", min_value),
        });
    }
    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(RelayError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(RelayError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}
