//! Thin JSON-over-HTTP client for the smoke runner

use std::time::Duration;

use reqwest::{Method, StatusCode};
use serde_json::Value;

use super::report::SmokeError;

/// Status plus parsed body; non-JSON bodies become a JSON string
#[derive(Debug, Clone)]
pub struct ApiReply {
    pub status: StatusCode,
    pub body: Value,
}

impl ApiReply {
    /// Fail unless the status matches exactly
    pub fn expect_status(&self, expected: StatusCode) -> Result<&Self, SmokeError> {
        if self.status == expected {
            Ok(self)
        } else {
            Err(SmokeError::UnexpectedStatus {
                expected: expected.as_u16(),
                actual: self.status.as_u16(),
                body: self.body.to_string(),
            })
        }
    }

    /// Top-level field, which must be present and not null
    pub fn field(&self, name: &str) -> Result<&Value, SmokeError> {
        match self.body.get(name) {
            Some(v) if !v.is_null() => Ok(v),
            _ => Err(SmokeError::MissingField(name.to_string())),
        }
    }

    /// Top-level array field, which must be non-empty
    pub fn non_empty_array(&self, name: &str) -> Result<&Vec<Value>, SmokeError> {
        let items = self
            .field(name)?
            .as_array()
            .ok_or_else(|| SmokeError::Check(format!("`{}` is not an array", name)))?;
        if items.is_empty() {
            return Err(SmokeError::Check(format!("`{}` is empty", name)));
        }
        Ok(items)
    }
}

pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    /// `base_url` includes the `/api` prefix
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, SmokeError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn set_token(&mut self, token: impl Into<String>) {
        self.token = Some(token.into());
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub async fn get(&self, path: &str) -> Result<ApiReply, SmokeError> {
        self.send(Method::GET, path, None, self.token()).await
    }

    pub async fn post(&self, path: &str, body: &Value) -> Result<ApiReply, SmokeError> {
        self.send(Method::POST, path, Some(body), self.token()).await
    }

    pub async fn put(&self, path: &str, body: &Value) -> Result<ApiReply, SmokeError> {
        self.send(Method::PUT, path, Some(body), self.token()).await
    }

    /// Send with an explicit bearer token (or none), ignoring the session token
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        token: Option<&str>,
    ) -> Result<ApiReply, SmokeError> {
        let url = format!("{}{}", self.base_url, path);
        let mut req = self.http.request(method.clone(), &url);
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }
        if let Some(body) = body {
            req = req.json(body);
        }

        let resp = req.send().await?;
        let status = resp.status();
        let text = resp.text().await?;
        let body = if text.is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or(Value::String(text))
        };
        tracing::debug!("{} {} -> {}", method, path, status);
        Ok(ApiReply { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn reply(status: u16, body: Value) -> ApiReply {
        ApiReply {
            status: StatusCode::from_u16(status).unwrap(),
            body,
        }
    }

    #[test]
    fn test_expect_status() {
        assert!(reply(200, json!({})).expect_status(StatusCode::OK).is_ok());
        let err = reply(400, json!({"error": "bad"}))
            .expect_status(StatusCode::CREATED)
            .unwrap_err();
        assert!(matches!(
            err,
            SmokeError::UnexpectedStatus {
                expected: 201,
                actual: 400,
                ..
            }
        ));
    }

    #[test]
    fn test_field_helpers() {
        let r = reply(200, json!({"plans": [1], "empty": [], "none": null}));
        assert!(r.field("plans").is_ok());
        assert!(matches!(r.field("none"), Err(SmokeError::MissingField(_))));
        assert!(matches!(r.field("nope"), Err(SmokeError::MissingField(_))));
        assert_eq!(r.non_empty_array("plans").unwrap().len(), 1);
        assert!(matches!(r.non_empty_array("empty"), Err(SmokeError::Check(_))));
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = ApiClient::new("http://localhost:3000/api/", Duration::from_secs(1)).unwrap();
        assert_eq!(client.base_url(), "http://localhost:3000/api");
        assert!(client.token().is_none());
    }
}
