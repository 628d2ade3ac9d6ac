use std::fmt;

use reqwest::blocking::{Client, RequestBuilder};
use reqwest::Url;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::config::ClientConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully built call against the node. `path` starts with `/` and may carry
/// a query string.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub status: u16,
    pub body: Value,
}

impl Response {
    pub fn ok(body: Value) -> Self {
        Self { status: 200, body }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("invalid request URL `{0}`")]
    InvalidUrl(String),
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("node answered {status} with a non-JSON body: {body}")]
    Malformed { status: u16, body: String },
}

/// Moves a [`Request`] to the node and hands back whatever JSON it answered.
///
/// Non-success statuses are not errors at this level; only failures to talk
/// to the node or to read its answer are.
pub trait Transport: Send + Sync {
    fn execute(&self, request: &Request) -> Result<Response, TransportError>;
}

#[derive(Clone)]
pub struct HttpTransport {
    base_url: String,
    bearer_token: Option<String>,
    client: Client,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Result<Self, TransportError> {
        let mut builder = Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.clone());
        // Local nodes are reached directly even when a system proxy is set.
        if is_loopback(&config.api_base) {
            builder = builder.no_proxy();
        }
        let client = builder.build()?;
        Ok(Self {
            base_url: config.api_base.clone(),
            bearer_token: config.jwt_token.clone(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> Result<Url, TransportError> {
        let raw = format!("{}{}", self.base_url, path);
        Url::parse(&raw).map_err(|_| TransportError::InvalidUrl(raw))
    }

    fn apply_auth(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.bearer_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

impl Transport for HttpTransport {
    fn execute(&self, request: &Request) -> Result<Response, TransportError> {
        let url = self.url(&request.path)?;
        let builder = match request.method {
            Method::Get => self.client.get(url),
            Method::Post => self.client.post(url),
            Method::Delete => self.client.delete(url),
        };
        let builder = match &request.body {
            Some(body) => builder.json(body),
            None => builder,
        };

        let response = self.apply_auth(builder).send()?;
        let status = response.status().as_u16();
        let text = response.text()?;
        tracing::debug!(
            method = %request.method,
            path = %request.path,
            status,
            "node request"
        );

        Ok(Response {
            status,
            body: decode_body(status, text)?,
        })
    }
}

fn is_loopback(base_url: &str) -> bool {
    Url::parse(base_url)
        .ok()
        .and_then(|url| url.host_str().map(str::to_string))
        .is_some_and(|host| {
            host == "localhost"
                || host
                    .trim_matches(|c| c == '[' || c == ']')
                    .parse::<std::net::IpAddr>()
                    .is_ok_and(|ip| ip.is_loopback())
        })
}

fn decode_body(status: u16, text: String) -> Result<Value, TransportError> {
    if text.trim().is_empty() {
        return Ok(Value::Object(Map::new()));
    }
    serde_json::from_str(&text).map_err(|_| TransportError::Malformed { status, body: text })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_body_decodes_as_empty_object() {
        assert_eq!(decode_body(200, "  \n".into()).unwrap(), json!({}));
    }

    #[test]
    fn html_error_page_is_malformed() {
        let err = decode_body(502, "<html>bad gateway</html>".into()).unwrap_err();
        assert!(matches!(err, TransportError::Malformed { status: 502, .. }));
    }

    #[test]
    fn loopback_hosts_are_detected() {
        assert!(is_loopback("http://127.0.0.1:8002"));
        assert!(is_loopback("http://localhost:8002"));
        assert!(is_loopback("http://[::1]:8002"));
        assert!(!is_loopback("https://node.example.org"));
    }

    #[test]
    fn urls_keep_query_strings() {
        let config = ClientConfig::new("127.0.0.1:8002").unwrap();
        let transport = HttpTransport::new(&config).unwrap();
        let url = transport
            .url("/api/v1/group/g1/content?num=20&reverse=false")
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://127.0.0.1:8002/api/v1/group/g1/content?num=20&reverse=false"
        );
    }
}
