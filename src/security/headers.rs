//! Security response headers.
//!
//! # Responsibilities
//! - Build the Content-Security-Policy header from the policy table
//! - Build the Referrer-Policy header from the policy table
//! - Expose both as tower layers that set the header on every response
//!
//! # Design Decisions
//! - Headers are rendered once at startup; the layers only clone a `HeaderValue`
//! - Configured directives override built-in defaults by name, defaults keep their position
//! - Any malformed directive is a configuration error, never silently dropped

use std::collections::HashSet;

use axum::http::{header, HeaderValue};
use thiserror::Error;
use tower_http::set_header::SetResponseHeaderLayer;

use crate::config::schema::{ContentSecurityConfig, ReferrerPolicy};

/// Directives applied when `use_defaults` is set.
const DEFAULT_DIRECTIVES: &[(&str, &[&str])] = &[
    ("default-src", &["'self'"]),
    ("base-uri", &["'self'"]),
    ("font-src", &["'self'", "https:", "data:"]),
    ("form-action", &["'self'"]),
    ("frame-ancestors", &["'self'"]),
    ("img-src", &["'self'", "data:"]),
    ("object-src", &["'none'"]),
    ("script-src", &["'self'"]),
    ("script-src-attr", &["'none'"]),
    ("style-src", &["'self'", "https:", "'unsafe-inline'"]),
    ("upgrade-insecure-requests", &[]),
];

/// Source keywords that are only valid when single-quoted.
const QUOTED_KEYWORDS: &[&str] = &[
    "self",
    "none",
    "unsafe-inline",
    "unsafe-eval",
    "unsafe-hashes",
    "strict-dynamic",
    "report-sample",
    "wasm-unsafe-eval",
];

const QUOTED_PREFIXES: &[&str] = &["nonce-", "sha256-", "sha384-", "sha512-"];

/// Error raised while rendering a policy table.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PolicyError {
    #[error("invalid Content-Security-Policy directive name {0:?}")]
    InvalidDirectiveName(String),

    #[error("Content-Security-Policy directive {0:?} is specified more than once")]
    DuplicateDirective(String),

    #[error("invalid value {value:?} for Content-Security-Policy directive {directive:?}")]
    InvalidDirectiveValue { directive: String, value: String },

    #[error("value {value:?} for Content-Security-Policy directive {directive:?} must be single-quoted")]
    UnquotedKeyword { directive: String, value: String },

    #[error("Content-Security-Policy needs a default-src but none was provided")]
    MissingDefaultSrc,

    #[error("Referrer-Policy received no policy tokens")]
    EmptyReferrerPolicy,

    #[error("Referrer-Policy received a duplicate value {0:?}")]
    DuplicateReferrerPolicy(&'static str),

    #[error("policy renders to an invalid header value: {0}")]
    InvalidHeaderValue(String),
}

/// A rendered Content-Security-Policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentSecurityPolicy {
    directives: Vec<(String, Vec<String>)>,
}

impl ContentSecurityPolicy {
    /// Merge the configured directives with the defaults and validate them.
    pub fn from_config(config: &ContentSecurityConfig) -> Result<Self, PolicyError> {
        let mut directives: Vec<(String, Vec<String>)> = if config.use_defaults {
            DEFAULT_DIRECTIVES
                .iter()
                .map(|(name, values)| {
                    (
                        name.to_string(),
                        values.iter().map(|v| v.to_string()).collect(),
                    )
                })
                .collect()
        } else {
            Vec::new()
        };

        let mut seen = HashSet::new();
        for (raw_name, values) in &config.directives {
            let name = dashify(raw_name);
            if name.is_empty()
                || !name
                    .chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
            {
                return Err(PolicyError::InvalidDirectiveName(raw_name.clone()));
            }
            if !seen.insert(name.clone()) {
                return Err(PolicyError::DuplicateDirective(name));
            }
            for value in values {
                validate_value(&name, value)?;
            }

            match directives.iter_mut().find(|(existing, _)| *existing == name) {
                Some((_, existing)) => *existing = values.clone(),
                None => directives.push((name, values.clone())),
            }
        }

        if !directives.iter().any(|(name, _)| name == "default-src") {
            return Err(PolicyError::MissingDefaultSrc);
        }

        Ok(Self { directives })
    }

    /// Header text, directives separated by `;`.
    pub fn render(&self) -> String {
        self.directives
            .iter()
            .map(|(name, values)| {
                if values.is_empty() {
                    name.clone()
                } else {
                    format!("{} {}", name, values.join(" "))
                }
            })
            .collect::<Vec<_>>()
            .join(";")
    }

    /// Header value for the rendered policy.
    pub fn header_value(&self) -> Result<HeaderValue, PolicyError> {
        HeaderValue::from_str(&self.render())
            .map_err(|e| PolicyError::InvalidHeaderValue(e.to_string()))
    }

    /// Layer that sets the header on every response.
    pub fn layer(&self) -> Result<SetResponseHeaderLayer<HeaderValue>, PolicyError> {
        Ok(SetResponseHeaderLayer::overriding(
            header::CONTENT_SECURITY_POLICY,
            self.header_value()?,
        ))
    }
}

/// Render the Referrer-Policy header, tokens separated by `,`.
pub fn referrer_policy_value(policies: &[ReferrerPolicy]) -> Result<HeaderValue, PolicyError> {
    if policies.is_empty() {
        return Err(PolicyError::EmptyReferrerPolicy);
    }

    let mut seen = HashSet::new();
    for policy in policies {
        if !seen.insert(*policy) {
            return Err(PolicyError::DuplicateReferrerPolicy(policy.as_str()));
        }
    }

    let rendered = policies
        .iter()
        .map(ReferrerPolicy::as_str)
        .collect::<Vec<_>>()
        .join(",");

    HeaderValue::from_str(&rendered).map_err(|e| PolicyError::InvalidHeaderValue(e.to_string()))
}

/// Layer that sets Referrer-Policy on every response.
pub fn referrer_policy_layer(
    policies: &[ReferrerPolicy],
) -> Result<SetResponseHeaderLayer<HeaderValue>, PolicyError> {
    Ok(SetResponseHeaderLayer::overriding(
        header::REFERRER_POLICY,
        referrer_policy_value(policies)?,
    ))
}

/// `scriptSrc` -> `script-src`. Kebab-case names pass through.
fn dashify(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for c in name.chars() {
        if c.is_ascii_uppercase() {
            out.push('-');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

fn validate_value(directive: &str, value: &str) -> Result<(), PolicyError> {
    if value.contains(';') || value.contains(',') {
        return Err(PolicyError::InvalidDirectiveValue {
            directive: directive.to_string(),
            value: value.to_string(),
        });
    }

    let lowered = value.to_ascii_lowercase();
    let needs_quotes = QUOTED_KEYWORDS.contains(&lowered.as_str())
        || QUOTED_PREFIXES.iter().any(|p| lowered.starts_with(p));
    if needs_quotes {
        return Err(PolicyError::UnquotedKeyword {
            directive: directive.to_string(),
            value: value.to_string(),
        });
    }

    Ok(())
}
