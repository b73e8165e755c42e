//! Core types for the rebound resilient HTTP client.
//!
//! This crate is transport-agnostic and provides:
//! - [`Method`], [`Request`] and [`Response`] - HTTP request/response types
//! - [`Error`], [`ErrorKind`] and [`Result`] - the error taxonomy shared by every stage
//! - [`Transport`] - the one-exchange boundary the pipeline runs against
//! - [`StatusClassifier`] and [`StatusTable`] - status code validation
//! - Codecs: [`to_json`], [`to_form`], [`format_query`], [`decode_json`], [`decode_json_opt`]

mod codec;
mod error;
mod method;
pub mod prelude;
mod request;
mod response;
mod status;
mod transport;

pub use codec::{
    ContentType, append_query, decode_json, decode_json_opt, decode_text, format_query,
    from_json, to_form, to_json, to_query_string,
};
pub use error::{Error, ErrorKind, Result};
pub use method::Method;
pub use request::{Request, RequestBuilder};
pub use response::Response;
pub use status::{StatusCategory, StatusClassifier, StatusRule, StatusTable};
pub use transport::Transport;
