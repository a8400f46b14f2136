//! Request description handed to the executor.

use reqwest::Url;
use reqwest::header::{HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::ExecuteError;

/// HTTP method of a [`Request`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Method {
    #[default]
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Head,
    Options,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Patch => "PATCH",
            Method::Head => "HEAD",
            Method::Options => "OPTIONS",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = ExecuteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "DELETE" => Ok(Method::Delete),
            "PATCH" => Ok(Method::Patch),
            "HEAD" => Ok(Method::Head),
            "OPTIONS" => Ok(Method::Options),
            _ => Err(ExecuteError::InvalidRequest(format!(
                "unsupported method '{}'",
                s
            ))),
        }
    }
}

impl TryFrom<String> for Method {
    type Error = ExecuteError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Method> for String {
    fn from(method: Method) -> Self {
        method.as_str().to_string()
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
            Method::Patch => reqwest::Method::PATCH,
            Method::Head => reqwest::Method::HEAD,
            Method::Options => reqwest::Method::OPTIONS,
        }
    }
}

/// Header map with case-insensitive keys.
///
/// Keys keep the spelling they were inserted with, so they go out on the wire
/// unchanged. Lookups, replacement and equality ignore ASCII case and order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, String>", into = "BTreeMap<String, String>")]
pub struct Headers {
    entries: Vec<(String, String)>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a header, replacing any existing value under the same key.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self
            .entries
            .iter_mut()
            .find(|(key, _)| key.eq_ignore_ascii_case(&name))
        {
            Some(entry) => *entry = (name, value),
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl PartialEq for Headers {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|(k, v)| other.get(k) == Some(v))
    }
}

impl Eq for Headers {}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Headers {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = Headers::new();
        for (name, value) in iter {
            headers.insert(name, value);
        }
        headers
    }
}

impl From<BTreeMap<String, String>> for Headers {
    fn from(map: BTreeMap<String, String>) -> Self {
        map.into_iter().collect()
    }
}

impl From<Headers> for BTreeMap<String, String> {
    fn from(headers: Headers) -> Self {
        headers.entries.into_iter().collect()
    }
}

/// A single HTTP request. The executor only ever borrows it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: Method,
    pub url: String,
    pub headers: Headers,
    pub body: Option<Vec<u8>>,
}

impl Request {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Headers::new(),
            body: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::Get, url)
    }

    pub fn post(url: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        Self::new(Method::Post, url).with_body(body)
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Checks the url is a non-empty absolute http(s) URL with a host and
    /// that every header can be put on the wire.
    pub fn validate(&self) -> Result<Url, ExecuteError> {
        if self.url.trim().is_empty() {
            return Err(ExecuteError::InvalidRequest(
                "url must not be empty".to_string(),
            ));
        }

        let url = Url::parse(&self.url).map_err(|e| {
            ExecuteError::InvalidRequest(format!("malformed url '{}': {}", self.url, e))
        })?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(ExecuteError::InvalidRequest(format!(
                "unsupported scheme '{}' in '{}'",
                url.scheme(),
                self.url
            )));
        }

        if url.host_str().is_none_or(str::is_empty) {
            return Err(ExecuteError::InvalidRequest(format!(
                "url '{}' has no host",
                self.url
            )));
        }

        for (name, value) in self.headers.iter() {
            HeaderName::from_bytes(name.as_bytes()).map_err(|_| {
                ExecuteError::InvalidRequest(format!("invalid header name '{}'", name))
            })?;
            HeaderValue::from_str(value).map_err(|_| {
                ExecuteError::InvalidRequest(format!("invalid value for header '{}'", name))
            })?;
        }

        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_parse_is_case_insensitive() {
        assert_eq!("get".parse::<Method>().unwrap(), Method::Get);
        assert_eq!("Post".parse::<Method>().unwrap(), Method::Post);
        assert_eq!("OPTIONS".parse::<Method>().unwrap(), Method::Options);
    }

    #[test]
    fn test_method_parse_unknown() {
        let err = "BREW".parse::<Method>().unwrap_err();
        assert!(matches!(err, ExecuteError::InvalidRequest(_)));
    }

    #[test]
    fn test_method_serde_uses_upper_case_name() {
        let json = serde_json::to_string(&Method::Delete).unwrap();
        assert_eq!(json, r#""DELETE""#);
        let method: Method = serde_json::from_str(r#""patch""#).unwrap();
        assert_eq!(method, Method::Patch);
        assert!(serde_json::from_str::<Method>(r#""BREW""#).is_err());
    }

    #[test]
    fn test_headers_case_insensitive_lookup() {
        let mut headers = Headers::new();
        headers.insert("Content-Type", "application/json");
        assert_eq!(headers.get("content-type"), Some("application/json"));
        assert_eq!(headers.get("CONTENT-TYPE"), Some("application/json"));
        assert!(headers.get("accept").is_none());
    }

    #[test]
    fn test_headers_insert_replaces_existing_key() {
        let mut headers = Headers::new();
        headers.insert("X-Token", "a");
        headers.insert("x-token", "b");
        assert_eq!(headers.len(), 1);
        assert_eq!(headers.get("X-TOKEN"), Some("b"));
    }

    #[test]
    fn test_headers_equality_ignores_order_and_case() {
        let a: Headers = [("Accept", "*/*"), ("X-Id", "1")].into_iter().collect();
        let b: Headers = [("x-id", "1"), ("accept", "*/*")].into_iter().collect();
        assert_eq!(a, b);

        let c: Headers = [("x-id", "2"), ("accept", "*/*")].into_iter().collect();
        assert_ne!(a, c);
    }

    #[test]
    fn test_request_builders() {
        let req = Request::post("http://x/items", "{}").with_header("Content-Type", "json");
        assert_eq!(req.method, Method::Post);
        assert_eq!(req.body.as_deref(), Some(b"{}".as_slice()));
        assert_eq!(req.headers.get("content-type"), Some("json"));
    }

    #[test]
    fn test_validate_accepts_http_and_https() {
        assert!(Request::get("http://x/ok").validate().is_ok());
        assert!(Request::get("https://example.com:8443/a?b=c").validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_url() {
        let err = Request::get("  ").validate().unwrap_err();
        assert_eq!(
            err,
            ExecuteError::InvalidRequest("url must not be empty".to_string())
        );
    }

    #[test]
    fn test_validate_rejects_malformed_url() {
        let err = Request::get("not a url").validate().unwrap_err();
        assert!(matches!(err, ExecuteError::InvalidRequest(_)));
    }

    #[test]
    fn test_validate_rejects_other_schemes() {
        let err = Request::get("ftp://example.com/file").validate().unwrap_err();
        assert!(err.to_string().contains("unsupported scheme"));
    }

    #[test]
    fn test_validate_rejects_bad_header_name() {
        let err = Request::get("http://x/ok")
            .with_header("Bad Header", "1")
            .validate()
            .unwrap_err();
        assert_eq!(
            err,
            ExecuteError::InvalidRequest("invalid header name 'Bad Header'".to_string())
        );
    }

    #[test]
    fn test_validate_rejects_bad_header_value() {
        let err = Request::get("http://x/ok")
            .with_header("X-Note", "line\nbreak")
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains("X-Note"));
    }
}
