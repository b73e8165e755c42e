//! Body and query codecs.
//!
//! Encoding goes through `serde_json`, `serde_urlencoded` and
//! `serde_html_form`; decoding goes through `serde_path_to_error` so failures
//! point at the offending field.

use bytes::Bytes;
use url::form_urlencoded;

use crate::{Error, Result};

/// Content type for request bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ContentType {
    /// JSON content type (`application/json`).
    #[default]
    Json,
    /// Form URL-encoded content type (`application/x-www-form-urlencoded`).
    FormUrlEncoded,
    /// Plain text content type (`text/plain`).
    PlainText,
}

impl ContentType {
    /// Get the MIME type string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::FormUrlEncoded => "application/x-www-form-urlencoded",
            Self::PlainText => "text/plain",
        }
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Serialize a value to JSON bytes.
///
/// # Example
///
/// ```
/// use rebound_core::to_json;
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct User { name: String }
///
/// let user = User { name: "Alice".to_string() };
/// let bytes = to_json(&user).expect("serialize");
/// assert_eq!(bytes.as_ref(), br#"{"name":"Alice"}"#);
/// ```
pub fn to_json<T: serde::Serialize>(value: &T) -> Result<Bytes> {
    serde_json::to_vec(value)
        .map(Bytes::from)
        .map_err(Into::into)
}

/// Serialize a value to form URL-encoded bytes.
pub fn to_form<T: serde::Serialize>(value: &T) -> Result<Bytes> {
    serde_urlencoded::to_string(value)
        .map(|s| Bytes::from(s.into_bytes()))
        .map_err(Into::into)
}

/// Serialize a value to a query string.
///
/// Uses `serde_html_form`, so `Vec<T>` fields become repeated parameters
/// (`tags=a&tags=b`).
pub fn to_query_string<T: serde::Serialize>(value: &T) -> Result<String> {
    serde_html_form::to_string(value).map_err(Into::into)
}

/// Format key/value pairs as a query string, in iteration order.
///
/// # Example
///
/// ```
/// use rebound_core::format_query;
///
/// assert_eq!(format_query([("q", "languages"), ("lang", "en")]), "q=languages&lang=en");
/// assert_eq!(format_query(Vec::<(String, String)>::new()), "");
/// ```
pub fn format_query<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> String
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish()
}

/// Append an already formatted query string to a URL.
///
/// Uses `&` when the URL already carries a query, `?` otherwise.
#[must_use]
pub fn append_query(url: &str, query: &str) -> String {
    if query.is_empty() {
        url.to_string()
    } else if url.contains('?') {
        format!("{url}&{query}")
    } else {
        format!("{url}?{query}")
    }
}

/// Deserialize JSON bytes with path-aware error messages.
pub fn from_json<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    let mut deserializer = serde_json::Deserializer::from_slice(bytes);
    serde_path_to_error::deserialize(&mut deserializer)
        .map_err(|e| Error::decode(e.path().to_string(), e.inner().to_string()))
}

/// Decode a response body, an empty body yields `T::default()`.
pub fn decode_json<T>(body: &[u8]) -> Result<T>
where
    T: serde::de::DeserializeOwned + Default,
{
    Ok(decode_json_opt(body)?.unwrap_or_default())
}

/// Decode a response body, an empty body yields `None`.
pub fn decode_json_opt<T: serde::de::DeserializeOwned>(body: &[u8]) -> Result<Option<T>> {
    if body.is_empty() {
        return Ok(None);
    }
    from_json(body).map(Some)
}

/// Decode a response body as UTF-8 text.
pub fn decode_text(body: Bytes) -> Result<String> {
    String::from_utf8(body.to_vec()).map_err(|e| Error::decode("", e.to_string()))
}

#[cfg(test)]
mod tests {
    use assert2::{check, let_assert};

    use super::*;

    #[derive(Debug, Default, PartialEq, serde::Deserialize)]
    struct User {
        name: String,
        age: u32,
    }

    #[test]
    fn content_type_as_str() {
        check!(ContentType::Json.as_str() == "application/json");
        check!(ContentType::FormUrlEncoded.to_string() == "application/x-www-form-urlencoded");
        check!(ContentType::default() == ContentType::Json);
    }

    #[test]
    fn to_form_serialize() {
        #[derive(serde::Serialize)]
        struct Login {
            username: String,
            password: String,
        }

        let login = Login {
            username: "alice".to_string(),
            password: "secret".to_string(),
        };

        let_assert!(Ok(bytes) = to_form(&login));
        check!(bytes.as_ref() == b"username=alice&password=secret");
    }

    #[test]
    fn to_query_string_skips_none() {
        #[derive(serde::Serialize)]
        struct Search {
            q: String,
            #[serde(skip_serializing_if = "Option::is_none")]
            page: Option<u32>,
        }

        let search = Search {
            q: "rust".to_string(),
            page: None,
        };
        let_assert!(Ok(query) = to_query_string(&search));
        check!(query == "q=rust");
    }

    #[test]
    fn format_query_keeps_insertion_order() {
        check!(format_query([("q", "languages"), ("lang", "en")]) == "q=languages&lang=en");
        check!(format_query([("v", "1"), ("a", "2")]) == "v=1&a=2");
    }

    #[test]
    fn format_query_empty() {
        check!(format_query(Vec::<(&str, &str)>::new()).is_empty());
    }

    #[test]
    fn append_query_picks_separator() {
        check!(append_query("http://h/a", "q=1") == "http://h/a?q=1");
        check!(append_query("http://h/a?x=0", "q=1") == "http://h/a?x=0&q=1");
        check!(append_query("http://h/a", "") == "http://h/a");
    }

    #[test]
    fn decode_json_value() {
        let_assert!(Ok(user) = decode_json::<User>(br#"{"name":"Alice","age":30}"#));
        check!(
            user == User {
                name: "Alice".to_string(),
                age: 30
            }
        );
    }

    #[test]
    fn decode_empty_body_is_default() {
        let_assert!(Ok(user) = decode_json::<User>(b""));
        check!(user == User::default());

        let_assert!(Ok(None) = decode_json_opt::<User>(b""));
    }

    #[test]
    fn decode_malformed_body_fails() {
        let_assert!(Err(err) = decode_json::<User>(b"not json"));
        check!(err.kind() == crate::ErrorKind::Decode);
    }

    #[test]
    fn decode_missing_field_reports_path() {
        #[derive(Debug, Default, serde::Deserialize)]
        struct Address {
            #[allow(dead_code)]
            city: String,
        }

        #[derive(Debug, Default, serde::Deserialize)]
        struct Person {
            #[allow(dead_code)]
            address: Address,
        }

        let_assert!(Err(Error::Decode { path, message }) = decode_json::<Person>(br#"{"address":{}}"#));
        check!(path == "address");
        check!(message.contains("city"));
    }

    #[test]
    fn decode_text_rejects_invalid_utf8() {
        let_assert!(Ok(text) = decode_text(Bytes::from_static(b"hello")));
        check!(text == "hello");
        check!(decode_text(Bytes::from_static(&[0xff, 0xfe])).is_err());
    }
}
