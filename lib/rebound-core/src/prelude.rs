//! Prelude module for convenient imports.
//!
//! ```ignore
//! use rebound_core::prelude::*;
//! ```

pub use crate::{
    ContentType, Error, ErrorKind, Method, Request, RequestBuilder, Response, Result,
    StatusCategory, StatusClassifier, Transport, decode_json, to_json,
};
