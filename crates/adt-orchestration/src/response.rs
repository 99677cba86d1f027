//! Parsers for successful-status response bodies.
//!
//! A 2xx response can still carry business errors: name validation, check
//! runs and activation all report findings inside the document. These
//! parsers pull those findings out; anything they cannot read yields no
//! findings rather than an error.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

use adt_shared::{xml, Severity};

static LOCK_HANDLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<LOCK_HANDLE>\s*([^<]+?)\s*</LOCK_HANDLE>").expect("valid lock handle regex"));

static VALIDATION_ENTRY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<DATA>(.*?)</DATA>").expect("valid validation entry regex"));

static VALIDATION_SEVERITY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<SEVERITY>\s*([^<]*?)\s*</SEVERITY>").expect("valid severity regex"));

static VALIDATION_TEXT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<SHORT_TEXT>(.*?)</SHORT_TEXT>").expect("valid short text regex"));

static CHECK_MESSAGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<chkrun:checkMessage\b([^>]*)/?>").expect("valid check message regex"));

static ACTIVATION_MESSAGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<msg\b([^>]*)>(.*?)</msg>").expect("valid activation message regex"));

static MESSAGE_TEXT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<txt>(.*?)</txt>").expect("valid message text regex"));

static ACTIVATION_PROPERTIES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<chkl:properties\b([^>]*)/?>").expect("valid properties regex"));

static ATTRIBUTE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"([A-Za-z_][\w.-]*(?::[\w.-]+)?)\s*=\s*"([^"]*)""#).expect("valid attribute regex"));

/// One finding reported inside a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub severity: Severity,
    pub text: String,
}

impl Finding {
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

/// Lock handle out of a lock result document.
pub fn lock_handle(body: &str) -> Option<String> {
    LOCK_HANDLE
        .captures(body)
        .and_then(|caps| caps.get(1))
        .map(|m| xml::unescape(m.as_str()))
        .filter(|handle| !handle.is_empty())
}

/// Findings of a name validation response. `OK` entries are dropped.
pub fn validation_findings(body: &str) -> Vec<Finding> {
    VALIDATION_ENTRY
        .captures_iter(body)
        .filter_map(|entry| {
            let entry = entry.get(1)?.as_str();
            let severity = VALIDATION_SEVERITY
                .captures(entry)
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str().to_ascii_uppercase())?;
            let severity = match severity.as_str() {
                "ERROR" | "E" | "FATAL" => Severity::Error,
                "WARNING" | "W" => Severity::Warning,
                _ => return None,
            };
            let text = VALIDATION_TEXT
                .captures(entry)
                .and_then(|caps| caps.get(1))
                .map(|m| xml::unescape(m.as_str().trim()))
                .unwrap_or_default();
            Some(Finding { severity, text })
        })
        .collect()
}

/// Findings of a check run. Types `E`/`A` are errors, `W` warnings; info
/// messages are dropped.
pub fn check_findings(body: &str) -> Vec<Finding> {
    CHECK_MESSAGE
        .captures_iter(body)
        .filter_map(|caps| {
            let attrs = attributes(caps.get(1)?.as_str());
            let severity = message_severity(attrs.get("chkrun:type")?)?;
            let text = attrs
                .get("chkrun:shortText")
                .map(|t| xml::unescape(t))
                .unwrap_or_default();
            Some(Finding { severity, text })
        })
        .collect()
}

/// Activation outcome: findings plus whether activation actually ran.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivationReport {
    pub findings: Vec<Finding>,
    /// `None` when the response carried no properties element
    pub activation_executed: Option<bool>,
}

impl ActivationReport {
    pub fn has_errors(&self) -> bool {
        self.findings.iter().any(Finding::is_error)
    }
}

pub fn activation_report(body: &str) -> ActivationReport {
    let findings = ACTIVATION_MESSAGE
        .captures_iter(body)
        .filter_map(|caps| {
            let attrs = attributes(caps.get(1)?.as_str());
            let severity = message_severity(attrs.get("type")?)?;
            let inner = caps.get(2).map_or("", |m| m.as_str());
            let text = MESSAGE_TEXT
                .captures(inner)
                .and_then(|t| t.get(1))
                .map(|m| xml::unescape(m.as_str().trim()))
                .unwrap_or_default();
            Some(Finding { severity, text })
        })
        .collect();

    let activation_executed = ACTIVATION_PROPERTIES
        .captures(body)
        .and_then(|caps| caps.get(1))
        .and_then(|m| attributes(m.as_str()).remove("activationExecuted"))
        .map(|value| value.eq_ignore_ascii_case("true"));

    ActivationReport {
        findings,
        activation_executed,
    }
}

fn message_severity(code: &str) -> Option<Severity> {
    match code.trim() {
        "E" | "A" | "X" => Some(Severity::Error),
        "W" => Some(Severity::Warning),
        _ => None,
    }
}

fn attributes(tag_body: &str) -> HashMap<String, String> {
    ATTRIBUTE
        .captures_iter(tag_body)
        .filter_map(|caps| Some((caps.get(1)?.as_str().to_string(), caps.get(2)?.as_str().to_string())))
        .collect()
}
