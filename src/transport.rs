//! HTTP request dispatch.

use std::fmt;
use std::sync::Arc;

use reqwest::blocking::Client;
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::Result;

/// Request methods the documents protocol needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Delete,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Delete => "DELETE",
        };
        f.write_str(name)
    }
}

/// An outgoing request.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

impl Request {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn body(mut self, body: Vec<u8>) -> Self {
        self.body = Some(body);
        self
    }

    /// First header value with this name (case-insensitive).
    pub fn header_value(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

/// Status code families.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCategory {
    Informational,
    Success,
    Redirection,
    ClientError,
    ServerError,
    Unknown,
}

impl StatusCategory {
    pub fn of(status: u16) -> Self {
        match status {
            100..=199 => StatusCategory::Informational,
            200..=299 => StatusCategory::Success,
            300..=399 => StatusCategory::Redirection,
            400..=499 => StatusCategory::ClientError,
            500..=599 => StatusCategory::ServerError,
            _ => StatusCategory::Unknown,
        }
    }
}

/// A fully buffered response.
#[derive(Debug, Clone)]
pub struct Response {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Response {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    pub fn category(&self) -> StatusCategory {
        StatusCategory::of(self.status)
    }

    pub fn is_success(&self) -> bool {
        self.category() == StatusCategory::Success
    }

    /// The body decoded as UTF-8, lossily.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn header_value(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}

/// Sends one request and buffers the whole response.
///
/// Connection, TLS and timeout failures must come back as
/// [`DocsError::Transport`](crate::DocsError::Transport), never as a
/// synthetic status.
pub trait Transport: Send + Sync {
    fn send(&self, request: &Request) -> Result<Response>;
}

/// Blocking HTTP(S) transport backed by reqwest.
pub struct HttpTransport {
    http: Client,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()?;
        Ok(Self { http })
    }
}

impl Transport for HttpTransport {
    fn send(&self, request: &Request) -> Result<Response> {
        let mut builder = match request.method {
            Method::Get => self.http.get(&request.url),
            Method::Post => self.http.post(&request.url),
            Method::Delete => self.http.delete(&request.url),
        };

        for (name, value) in &request.headers {
            // reqwest derives it from the body
            if name.eq_ignore_ascii_case("content-length") {
                continue;
            }
            builder = builder.header(name.as_str(), value.as_str());
        }

        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send()?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.to_string(), value.to_string()))
            })
            .collect();
        let body = response.bytes()?.to_vec();

        Ok(Response {
            status,
            headers,
            body,
        })
    }
}

/// Shared handle that stamps protocol headers on every request.
#[derive(Clone)]
pub struct Dispatcher {
    transport: Arc<dyn Transport>,
    gdata_version: String,
}

impl Dispatcher {
    pub fn new(transport: Arc<dyn Transport>, gdata_version: impl Into<String>) -> Self {
        Self {
            transport,
            gdata_version: gdata_version.into(),
        }
    }

    /// Perform a request and classify its status.
    ///
    /// HTTP error statuses are returned as ordinary responses; only
    /// transport failures are errors.
    pub fn dispatch(&self, mut request: Request) -> Result<Response> {
        if request.header_value("GData-Version").is_none() {
            request
                .headers
                .push(("GData-Version".to_string(), self.gdata_version.clone()));
        }

        debug!(method = %request.method, url = %request.url, "dispatching request");
        let response = self.transport.send(&request)?;
        debug!(
            method = %request.method,
            url = %request.url,
            status = response.status,
            category = ?response.category(),
            "received response"
        );

        Ok(response)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted transport for unit tests.

    use std::collections::VecDeque;

    use parking_lot::Mutex;

    use super::*;

    /// Replays canned responses in order and records every request.
    #[derive(Default)]
    pub struct ScriptedTransport {
        responses: Mutex<VecDeque<Response>>,
        requests: Mutex<Vec<Request>>,
    }

    impl ScriptedTransport {
        pub fn new() -> Arc<Self> {
            Arc::new(Self::default())
        }

        pub fn push(&self, status: u16, body: &str) {
            self.responses
                .lock()
                .push_back(Response::new(status, body.as_bytes().to_vec()));
        }

        pub fn requests(&self) -> Vec<Request> {
            self.requests.lock().clone()
        }

        pub fn urls(&self) -> Vec<String> {
            self.requests().into_iter().map(|r| r.url).collect()
        }
    }

    impl Transport for ScriptedTransport {
        fn send(&self, request: &Request) -> Result<Response> {
            self.requests.lock().push(request.clone());
            let response = self
                .responses
                .lock()
                .pop_front()
                .unwrap_or_else(|| panic!("no scripted response for {}", request.url));
            Ok(response)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::ScriptedTransport;
    use super::*;

    #[test]
    fn test_status_category() {
        assert_eq!(StatusCategory::of(200), StatusCategory::Success);
        assert_eq!(StatusCategory::of(201), StatusCategory::Success);
        assert_eq!(StatusCategory::of(301), StatusCategory::Redirection);
        assert_eq!(StatusCategory::of(403), StatusCategory::ClientError);
        assert_eq!(StatusCategory::of(503), StatusCategory::ServerError);
        assert_eq!(StatusCategory::of(100), StatusCategory::Informational);
        assert_eq!(StatusCategory::of(42), StatusCategory::Unknown);
    }

    #[test]
    fn test_dispatch_adds_gdata_version() {
        let transport = ScriptedTransport::new();
        transport.push(200, "ok");
        let dispatcher = Dispatcher::new(transport.clone(), "3.0");

        let response = dispatcher
            .dispatch(Request::new(Method::Get, "http://example.test/feed"))
            .unwrap();

        assert!(response.is_success());
        assert_eq!(response.text(), "ok");
        let sent = transport.requests();
        assert_eq!(sent[0].header_value("gdata-version"), Some("3.0"));
    }

    #[test]
    fn test_dispatch_returns_error_statuses() {
        let transport = ScriptedTransport::new();
        transport.push(500, "boom");
        let dispatcher = Dispatcher::new(transport, "3.0");

        let response = dispatcher
            .dispatch(Request::new(Method::Delete, "http://example.test/feed/x"))
            .unwrap();

        assert_eq!(response.category(), StatusCategory::ServerError);
    }

    /// Fails every request the way a non-reqwest transport would.
    struct Unreachable;

    impl Transport for Unreachable {
        fn send(&self, _request: &Request) -> Result<Response> {
            Err(crate::DocsError::transport(std::io::Error::new(
                std::io::ErrorKind::TimedOut,
                "connect timed out",
            )))
        }
    }

    #[test]
    fn test_dispatch_propagates_custom_transport_failure() {
        let dispatcher = Dispatcher::new(Arc::new(Unreachable), "3.0");

        let err = dispatcher
            .dispatch(Request::new(Method::Get, "http://example.test/feed"))
            .unwrap_err();

        match err {
            crate::DocsError::Transport(source) => {
                assert_eq!(
                    source.downcast_ref::<std::io::Error>().map(|e| e.kind()),
                    Some(std::io::ErrorKind::TimedOut)
                );
            }
            other => panic!("expected transport error, got {:?}", other),
        }
    }

    #[test]
    fn test_method_display() {
        assert_eq!(Method::Get.to_string(), "GET");
        assert_eq!(Method::Post.to_string(), "POST");
        assert_eq!(Method::Delete.to_string(), "DELETE");
    }
}
