//! Assembly of an outgoing request from operation inputs.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::Serialize;
use url::Url;

use super::dispatch::is_json;
use super::encoding::{encode_form, encode_query, simple_value, to_json, QueryStyle};
use super::error::{ClientError, ClientResult};
use crate::openapi::HttpMethod;

static PATH_PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{([^{}]+)\}").expect("path placeholder pattern is valid"));

/// Method, templated path, parameters and body of one call
#[derive(Debug, Clone)]
pub struct RequestParts {
    method: HttpMethod,
    path_template: String,
    path_values: HashMap<String, String>,
    query: Vec<(String, String)>,
    headers: Vec<(String, String)>,
    cookies: Vec<(String, String)>,
    body: Option<(String, Vec<u8>)>,
}

/// A request ready for a transport
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: Url,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

impl RequestParts {
    pub fn new(method: HttpMethod, path_template: impl Into<String>) -> Self {
        Self {
            method,
            path_template: path_template.into(),
            path_values: HashMap::new(),
            query: Vec::new(),
            headers: Vec::new(),
            cookies: Vec::new(),
            body: None,
        }
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn path_template(&self) -> &str {
        &self.path_template
    }

    /// Bind `{name}` in the path template
    pub fn path_param<T: Serialize + ?Sized>(&mut self, name: &str, value: &T) -> ClientResult<()> {
        let value = simple_value(name, &to_json(value)?)?
            .ok_or_else(|| ClientError::encode(format!("path parameter '{name}' is null")))?;
        self.path_values.insert(name.to_string(), value);
        Ok(())
    }

    /// Append a query parameter; null values add nothing
    pub fn query<T: Serialize + ?Sized>(
        &mut self,
        name: &str,
        value: &T,
        style: QueryStyle,
    ) -> ClientResult<()> {
        self.query
            .extend(encode_query(name, &to_json(value)?, style));
        Ok(())
    }

    /// Append a raw query pair
    pub fn query_pair(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.query.push((name.into(), value.into()));
    }

    /// Set a header parameter; null values add nothing
    pub fn header<T: Serialize + ?Sized>(&mut self, name: &str, value: &T) -> ClientResult<()> {
        if let Some(value) = simple_value(name, &to_json(value)?)? {
            self.set_header(name, value);
        }
        Ok(())
    }

    /// Set a raw header, replacing any earlier value with the same name
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        self.headers
            .retain(|(existing, _)| !existing.eq_ignore_ascii_case(&name));
        self.headers.push((name, value.into()));
    }

    /// Add a cookie parameter; null values add nothing
    pub fn cookie<T: Serialize + ?Sized>(&mut self, name: &str, value: &T) -> ClientResult<()> {
        if let Some(value) = simple_value(name, &to_json(value)?)? {
            self.cookies.push((name.to_string(), value));
        }
        Ok(())
    }

    /// Encode `value` as the body for `content_type`.
    ///
    /// JSON media types are serialized as JSON, `application/x-www-form-urlencoded`
    /// as form fields, and string values of any other type are sent verbatim.
    pub fn body<T: Serialize + ?Sized>(&mut self, content_type: &str, value: &T) -> ClientResult<()> {
        let json = to_json(value)?;
        let bytes = if is_json(content_type) {
            serde_json::to_vec(&json).map_err(|e| ClientError::encode(e.to_string()))?
        } else if content_type.starts_with("application/x-www-form-urlencoded") {
            let fields = match &json {
                serde_json::Value::Object(members) => members
                    .iter()
                    .flat_map(|(k, v)| encode_form(k, v, true))
                    .collect::<Vec<_>>(),
                other => encode_form("value", other, true),
            };
            url::form_urlencoded::Serializer::new(String::new())
                .extend_pairs(fields)
                .finish()
                .into_bytes()
        } else if let serde_json::Value::String(text) = &json {
            text.clone().into_bytes()
        } else {
            serde_json::to_vec(&json).map_err(|e| ClientError::encode(e.to_string()))?
        };
        self.body = Some((content_type.to_string(), bytes));
        Ok(())
    }

    /// Headers as sent, including `Content-Type` and the merged `Cookie` header
    pub fn headers(&self) -> Vec<(String, String)> {
        let mut headers = self.headers.clone();
        if !self.cookies.is_empty() {
            let cookie = self
                .cookies
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect::<Vec<_>>()
                .join("; ");
            headers.push(("Cookie".to_string(), cookie));
        }
        if let Some((content_type, _)) = &self.body {
            headers.push(("Content-Type".to_string(), content_type.clone()));
        }
        headers
    }

    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Resolve the full URL against `base`.
    ///
    /// Each path segment is percent-encoded after its placeholders are
    /// substituted, so a value can never introduce a new segment.
    pub fn url(&self, base: &Url) -> ClientResult<Url> {
        let mut segments = Vec::new();
        for segment in self.path_template.split('/').filter(|s| !s.is_empty()) {
            segments.push(self.expand_segment(segment)?);
        }
        if self.path_template.len() > 1 && self.path_template.ends_with('/') {
            segments.push(String::new());
        }

        let mut url = base.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidUrl(format!("'{base}' cannot be a base URL")))?
            .pop_if_empty()
            .extend(segments);
        if !self.query.is_empty() {
            url.query_pairs_mut().extend_pairs(&self.query);
        }
        Ok(url)
    }

    /// Finish the request against `base`
    pub fn into_request(self, base: &Url) -> ClientResult<HttpRequest> {
        Ok(HttpRequest {
            method: self.method,
            url: self.url(base)?,
            headers: self.headers(),
            body: self.body.map(|(_, bytes)| bytes),
        })
    }

    fn expand_segment(&self, segment: &str) -> ClientResult<String> {
        let mut missing = None;
        let expanded = PATH_PLACEHOLDER.replace_all(segment, |caps: &Captures<'_>| {
            match self.path_values.get(&caps[1]) {
                Some(value) => value.clone(),
                None => {
                    missing.get_or_insert_with(|| caps[1].to_string());
                    String::new()
                }
            }
        });
        match missing {
            Some(name) => Err(ClientError::InvalidUrl(format!(
                "no value for path parameter '{name}' in '{}'",
                self.path_template
            ))),
            None => Ok(expanded.into_owned()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn base() -> Url {
        Url::parse("https://api.example.com/v1/").unwrap()
    }

    #[test]
    fn test_path_values_are_encoded_per_segment() -> ClientResult<()> {
        let mut request = RequestParts::new(HttpMethod::Get, "/pets/{petId}/photos/{name}");
        request.path_param("petId", &42)?;
        request.path_param("name", "a b/c")?;
        assert_eq!(
            request.url(&base())?.as_str(),
            "https://api.example.com/v1/pets/42/photos/a%20b%2Fc"
        );
        Ok(())
    }

    #[test]
    fn test_missing_path_value() {
        let request = RequestParts::new(HttpMethod::Get, "/pets/{petId}");
        assert!(matches!(
            request.url(&base()),
            Err(ClientError::InvalidUrl(msg)) if msg.contains("petId")
        ));
    }

    #[test]
    fn test_query_styles() -> ClientResult<()> {
        let mut request = RequestParts::new(HttpMethod::Get, "/search");
        request.query("limit", &Some(10), QueryStyle::default())?;
        request.query("offset", &None::<i32>, QueryStyle::default())?;
        request.query("filter", &json!({"kind": "cat"}), QueryStyle::DeepObject)?;
        assert_eq!(
            request.url(&base())?.as_str(),
            "https://api.example.com/v1/search?limit=10&filter%5Bkind%5D=cat"
        );
        Ok(())
    }

    #[test]
    fn test_headers_cookies_and_body() -> ClientResult<()> {
        let mut request = RequestParts::new(HttpMethod::Post, "/pets");
        request.header("X-Request-Id", &7)?;
        request.header("X-Absent", &None::<String>)?;
        request.cookie("session", "abc")?;
        request.cookie("theme", "dark")?;
        request.body("application/json", &json!({"name": "Rex"}))?;

        let sent = request.into_request(&base())?;
        assert_eq!(
            sent.headers,
            vec![
                ("X-Request-Id".to_string(), "7".to_string()),
                ("Cookie".to_string(), "session=abc; theme=dark".to_string()),
                ("Content-Type".to_string(), "application/json".to_string()),
            ]
        );
        assert_eq!(sent.body.as_deref(), Some(br#"{"name":"Rex"}"#.as_slice()));
        Ok(())
    }

    #[test]
    fn test_form_body() -> ClientResult<()> {
        let mut request = RequestParts::new(HttpMethod::Post, "/login");
        request.body(
            "application/x-www-form-urlencoded",
            &json!({"user": "a b", "tags": ["x", "y"]}),
        )?;
        let sent = request.into_request(&base())?;
        assert_eq!(sent.body.as_deref(), Some(b"user=a+b&tags=x&tags=y".as_slice()));
        Ok(())
    }

    #[test]
    fn test_set_header_replaces() {
        let mut request = RequestParts::new(HttpMethod::Get, "/");
        request.set_header("Authorization", "one");
        request.set_header("authorization", "two");
        assert_eq!(request.header_value("AUTHORIZATION"), Some("two"));
        assert_eq!(request.headers().len(), 1);
    }
}
