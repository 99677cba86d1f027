//! # Remote Error Classification
//!
//! Turns a failed remote call (status code plus optional exception body) into
//! one of a closed set of [`ErrorKind`]s the caller can act on.
//!
//! Classification is best-effort inspection of status and text, in this
//! order:
//!
//! 1. the ADT exception document (`<exc:exception>`): type id and message
//! 2. the HTTP status code
//! 3. well-known phrases in the message text
//!
//! Anything that matches none of these is [`ErrorKind::Unknown`] with the raw
//! text preserved. The classifier never panics and never returns an error.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::xml;

/// Longest message text carried out of a response body.
const MAX_MESSAGE_LEN: usize = 2000;

static EXCEPTION_TYPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"<type\s+id="([^"]+)""#).expect("valid exception type regex"));

static LOCALIZED_MESSAGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)<localizedMessage[^>]*>(.*?)</localizedMessage>")
        .expect("valid localized message regex")
});

static PLAIN_MESSAGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)<(?:[A-Za-z]+:)?message[^>]*>(.*?)</(?:[A-Za-z]+:)?message>")
        .expect("valid message regex")
});

static MARKUP: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").expect("valid markup regex"));

/// Closed failure taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Object absent
    NotFound,
    /// Already exists, or locked by another party
    Conflict,
    /// Lock handle rejected: wrong session, expired, or mismatched object
    InvalidLock,
    /// Credentials or session rejected outright
    AuthenticationFailed,
    /// Name or payload rejected by remote business rules
    ValidationFailed,
    /// Unlock failed after an earlier step failed; synthesized by the
    /// orchestrator, never produced by [`ErrorClassifier`]
    CleanupFailure,
    /// Anything else
    Unknown,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "not_found"),
            Self::Conflict => write!(f, "conflict"),
            Self::InvalidLock => write!(f, "invalid_lock"),
            Self::AuthenticationFailed => write!(f, "authentication_failed"),
            Self::ValidationFailed => write!(f, "validation_failed"),
            Self::CleanupFailure => write!(f, "cleanup_failure"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Result of classifying one failed call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub kind: ErrorKind,
    /// Remote message verbatim when one could be extracted, else the raw body
    pub message: String,
}

/// Stateless classifier for remote failures.
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorClassifier;

impl ErrorClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Classify a failed call from its status code and optional body.
    pub fn classify(&self, status: u16, body: Option<&str>) -> Classification {
        let body = body.map(str::trim).filter(|b| !b.is_empty());
        let exception_type = body.and_then(extract_exception_type);
        let message = body
            .map(extract_message)
            .unwrap_or_else(|| default_status_text(status));

        let kind = exception_type
            .as_deref()
            .and_then(|ty| kind_from_exception_type(ty, &message))
            .or_else(|| kind_from_status(status, &message))
            .or_else(|| kind_from_text(&message))
            .unwrap_or(ErrorKind::Unknown);

        Classification { kind, message }
    }

    /// Classify a message that arrived without a failing status, such as an
    /// error line inside a successful validation response.
    pub fn classify_message(&self, text: &str) -> ErrorKind {
        kind_from_text(text).unwrap_or(ErrorKind::ValidationFailed)
    }
}

fn extract_exception_type(body: &str) -> Option<String> {
    EXCEPTION_TYPE
        .captures(body)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Message text out of an exception document, or the raw body when it is not
/// one.
fn extract_message(body: &str) -> String {
    let extracted = LOCALIZED_MESSAGE
        .captures(body)
        .or_else(|| PLAIN_MESSAGE.captures(body))
        .and_then(|caps| caps.get(1))
        .map(|m| xml::unescape(m.as_str().trim()))
        .filter(|m| !m.is_empty());

    let text = match extracted {
        Some(text) => text,
        None if body.starts_with('<') => {
            let stripped = MARKUP.replace_all(body, " ");
            let collapsed = stripped.split_whitespace().collect::<Vec<_>>().join(" ");
            if collapsed.is_empty() {
                body.to_string()
            } else {
                xml::unescape(&collapsed)
            }
        }
        None => body.to_string(),
    };

    truncate(text)
}

fn truncate(mut text: String) -> String {
    if text.len() > MAX_MESSAGE_LEN {
        let mut cut = MAX_MESSAGE_LEN;
        while !text.is_char_boundary(cut) {
            cut -= 1;
        }
        text.truncate(cut);
    }
    text
}

fn default_status_text(status: u16) -> String {
    format!("HTTP {status}")
}

fn kind_from_exception_type(exception_type: &str, message: &str) -> Option<ErrorKind> {
    match exception_type {
        "ExceptionResourceNotFound" | "ExceptionObjectNotFound" => Some(ErrorKind::NotFound),
        "ExceptionResourceAlreadyExists" | "ExceptionResourceLocked" => Some(ErrorKind::Conflict),
        "ExceptionInvalidLockHandle" | "ExceptionLockHandleInvalid" => Some(ErrorKind::InvalidLock),
        "ExceptionNotAuthorized" | "ExceptionNotAuthenticated" => {
            Some(ErrorKind::AuthenticationFailed)
        }
        "ExceptionInvalidData" | "ExceptionResourceInvalid" | "ExceptionResourceCreationFailure" => {
            kind_from_text(message).or(Some(ErrorKind::ValidationFailed))
        }
        // The remote system reports "locked by another user" as a no-access
        // condition on the resource.
        "ExceptionResourceNoAccess" => kind_from_text(message).or(Some(ErrorKind::Conflict)),
        _ => None,
    }
}

fn kind_from_status(status: u16, message: &str) -> Option<ErrorKind> {
    match status {
        401 => Some(ErrorKind::AuthenticationFailed),
        403 if contains_any(&message.to_lowercase(), &["csrf", "token validation"]) => {
            Some(ErrorKind::AuthenticationFailed)
        }
        404 => Some(ErrorKind::NotFound),
        409 => Some(ErrorKind::Conflict),
        423 => Some(ErrorKind::Conflict),
        400 | 422 => kind_from_text(message).or(Some(ErrorKind::ValidationFailed)),
        _ => None,
    }
}

fn kind_from_text(text: &str) -> Option<ErrorKind> {
    let lower = text.to_lowercase();
    if contains_any(&lower, &["already exists", "already exist"]) {
        Some(ErrorKind::Conflict)
    } else if contains_any(&lower, &["lock handle", "not locked", "invalid lock"]) {
        Some(ErrorKind::InvalidLock)
    } else if contains_any(&lower, &["locked by", "currently editing", "is being edited"]) {
        Some(ErrorKind::Conflict)
    } else if contains_any(&lower, &["does not exist", "not found", "doesn't exist"]) {
        Some(ErrorKind::NotFound)
    } else if contains_any(
        &lower,
        &["not authorized", "no authorization", "logon", "unauthorized", "csrf token"],
    ) {
        Some(ErrorKind::AuthenticationFailed)
    } else {
        None
    }
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| haystack.contains(needle))
}
