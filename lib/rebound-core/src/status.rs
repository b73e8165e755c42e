//! Status code classification.
//!
//! A [`StatusClassifier`] decides whether a response status is accepted or
//! turned into an [`Error`]. The mapping from rejected codes to errors lives in
//! a [`StatusTable`] so it can be extended without touching the classifier.
//!
//! # Example
//!
//! ```
//! use rebound_core::{StatusCategory, StatusClassifier, StatusRule, StatusTable};
//!
//! let table = StatusTable::default().with_rule(429, StatusRule::Timeout);
//! let classifier = StatusClassifier::new(table).accept([409]);
//!
//! assert!(classifier.classify(200, "http://localhost/").is_ok());
//! assert!(classifier.classify(409, "http://localhost/").is_ok());
//! assert!(classifier.classify(429, "http://localhost/").unwrap_err().is_timeout());
//! assert_eq!(
//!     classifier.classify(418, "http://localhost/").unwrap_err().category(),
//!     Some(StatusCategory::Unexpected)
//! );
//! ```

use std::collections::{BTreeMap, BTreeSet};

use derive_more::Display;

use crate::{Error, Result};

/// Classification of a rejected status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum StatusCategory {
    /// `400 Bad Request`.
    #[display("bad request")]
    BadRequest,
    /// `404 Not Found`.
    #[display("not found")]
    NotFound,
    /// `500 Internal Server Error`.
    #[display("internal error")]
    InternalError,
    /// `502 Bad Gateway`.
    #[display("bad gateway")]
    BadGateway,
    /// `503 Service Unavailable`, reported by the server.
    #[display("unavailable")]
    Unavailable,
    /// Any other rejected code.
    #[display("unexpected")]
    Unexpected,
}

impl StatusCategory {
    /// Human readable message for a request to `url`.
    #[must_use]
    pub fn message(self, url: &str) -> String {
        match self {
            Self::BadRequest => "Invalid request.".to_string(),
            Self::NotFound => format!("URL {url} not found."),
            Self::InternalError => "An internal error occurred during the request.".to_string(),
            Self::BadGateway => "Bad gateway.".to_string(),
            Self::Unavailable => "The requested server is unavailable.".to_string(),
            Self::Unexpected => "An unexpected response was received.".to_string(),
        }
    }
}

/// What a rejected status code turns into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusRule {
    /// Same error as a client-side deadline expiry.
    Timeout,
    /// An HTTP error with the given category.
    Http(StatusCategory),
}

/// Mapping from rejected status codes to [`StatusRule`]s.
///
/// Codes without an entry map to [`StatusCategory::Unexpected`], which keeps
/// the mapping total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusTable {
    rules: BTreeMap<u16, StatusRule>,
}

impl Default for StatusTable {
    fn default() -> Self {
        Self::empty()
            .with_rule(400, StatusRule::Http(StatusCategory::BadRequest))
            .with_rule(404, StatusRule::Http(StatusCategory::NotFound))
            .with_rule(408, StatusRule::Timeout)
            .with_rule(500, StatusRule::Http(StatusCategory::InternalError))
            .with_rule(502, StatusRule::Http(StatusCategory::BadGateway))
            .with_rule(503, StatusRule::Http(StatusCategory::Unavailable))
            .with_rule(504, StatusRule::Timeout)
    }
}

impl StatusTable {
    /// A table without rules: every rejected code is unexpected.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            rules: BTreeMap::new(),
        }
    }

    /// Add or replace the rule for a status code.
    #[must_use]
    pub fn with_rule(mut self, status: u16, rule: StatusRule) -> Self {
        self.rules.insert(status, rule);
        self
    }

    /// Rule applied to a rejected status code.
    #[must_use]
    pub fn rule(&self, status: u16) -> StatusRule {
        self.rules
            .get(&status)
            .copied()
            .unwrap_or(StatusRule::Http(StatusCategory::Unexpected))
    }
}

/// Decides whether a response status is accepted.
#[derive(Debug, Clone, Default)]
pub struct StatusClassifier {
    table: StatusTable,
    accept_any: bool,
    accepted: BTreeSet<u16>,
}

impl StatusClassifier {
    /// Create a classifier using the given table.
    #[must_use]
    pub fn new(table: StatusTable) -> Self {
        Self {
            table,
            accept_any: false,
            accepted: BTreeSet::new(),
        }
    }

    /// Accept every status code.
    #[must_use]
    pub const fn accept_any(mut self) -> Self {
        self.accept_any = true;
        self
    }

    /// Accept these codes in addition to the 2xx range.
    #[must_use]
    pub fn accept(mut self, codes: impl IntoIterator<Item = u16>) -> Self {
        self.accepted.extend(codes);
        self
    }

    /// Replace the rejection table.
    #[must_use]
    pub fn with_table(mut self, table: StatusTable) -> Self {
        self.table = table;
        self
    }

    /// Returns `true` if the status code needs no further classification.
    #[must_use]
    pub fn is_accepted(&self, status: u16) -> bool {
        self.accept_any || (200..300).contains(&status) || self.accepted.contains(&status)
    }

    /// Accept the status code or map it to an error for a request to `url`.
    pub fn classify(&self, status: u16, url: &str) -> Result<()> {
        if self.is_accepted(status) {
            return Ok(());
        }

        Err(match self.table.rule(status) {
            StatusRule::Timeout => Error::Timeout {
                url: url.to_string(),
                status: Some(status),
            },
            StatusRule::Http(category) => {
                Error::http(status, category, url, category.message(url))
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use assert2::{check, let_assert};

    use super::*;

    const URL: &str = "http://localhost/status";

    #[test]
    fn accepts_success_codes() {
        let classifier = StatusClassifier::default();
        for status in [200, 201, 203, 204, 205] {
            check!(classifier.classify(status, URL).is_ok(), "status {status}");
        }
    }

    #[test]
    fn accepts_explicit_codes_outside_2xx() {
        let codes = [400, 401, 403, 404, 405, 408, 409, 415, 422, 500, 501];
        let classifier = StatusClassifier::default().accept(codes);
        for status in codes {
            check!(classifier.classify(status, URL).is_ok(), "status {status}");
        }
        check!(classifier.classify(503, URL).is_err());
    }

    #[test]
    fn accept_any_disables_classification() {
        let classifier = StatusClassifier::default().accept_any();
        for status in [100, 302, 404, 500, 599] {
            check!(classifier.classify(status, URL).is_ok(), "status {status}");
        }
    }

    #[test]
    fn not_found_references_url() {
        let_assert!(Err(err) = StatusClassifier::default().classify(404, URL));
        check!(err.category() == Some(StatusCategory::NotFound));
        check!(err.to_string().contains(URL));
        check!(err.url() == Some(URL));
    }

    #[test]
    fn bad_request_is_generic() {
        let_assert!(
            Err(Error::Http {
                status: 400,
                category: StatusCategory::BadRequest,
                message,
                ..
            }) = StatusClassifier::default().classify(400, URL)
        );
        check!(message == "Invalid request.");
    }

    #[test]
    fn server_timeouts_map_to_timeout() {
        for status in [408, 504] {
            let_assert!(Err(err) = StatusClassifier::default().classify(status, URL));
            check!(err.is_timeout());
            check!(err.status() == Some(status));
        }
    }

    #[test]
    fn server_errors() {
        let classifier = StatusClassifier::default();
        let cases = [
            (500, StatusCategory::InternalError),
            (502, StatusCategory::BadGateway),
            (503, StatusCategory::Unavailable),
        ];
        for (status, category) in cases {
            let_assert!(Err(err) = classifier.classify(status, URL));
            check!(err.category() == Some(category));
            check!(err.status() == Some(status));
        }
    }

    #[test]
    fn other_codes_are_unexpected_with_raw_code() {
        let classifier = StatusClassifier::default();
        for status in [301, 401, 403, 405, 409, 415, 422, 501] {
            let_assert!(Err(err) = classifier.classify(status, URL));
            check!(err.category() == Some(StatusCategory::Unexpected));
            check!(err.status() == Some(status));
        }
    }

    #[test]
    fn table_is_extensible() {
        let table = StatusTable::default()
            .with_rule(429, StatusRule::Timeout)
            .with_rule(502, StatusRule::Http(StatusCategory::Unavailable));
        let classifier = StatusClassifier::new(table);

        check!(classifier.classify(429, URL).is_err_and(|err| err.is_timeout()));
        check!(
            classifier
                .classify(502, URL)
                .is_err_and(|err| err.category() == Some(StatusCategory::Unavailable))
        );
    }

    #[test]
    fn empty_table_is_still_total() {
        let classifier = StatusClassifier::new(StatusTable::empty());
        let_assert!(Err(err) = classifier.classify(504, URL));
        check!(err.category() == Some(StatusCategory::Unexpected));
    }
}
