//! Endpoint and transport configuration.

use std::time::Duration;

/// Host serving the document list feed and document exports.
const GOOGLE_DOCS_URL: &str = "https://docs.google.com";

/// Host serving spreadsheet exports.
const GOOGLE_SPREADSHEETS_URL: &str = "https://spreadsheets.google.com";

/// Host serving the ClientLogin endpoint.
const GOOGLE_ACCOUNTS_URL: &str = "https://www.google.com";

const LOGIN_PATH: &str = "/accounts/ClientLogin";
const FEED_PATH: &str = "/feeds/default/private/full";
const DOCUMENT_EXPORT_PATH: &str = "/feeds/download/documents/Export";
const DRAWING_EXPORT_PATH: &str = "/feeds/download/drawings/Export";
const PRESENTATION_EXPORT_PATH: &str = "/feeds/download/presentations/Export";
const SPREADSHEET_EXPORT_PATH: &str = "/feeds/download/spreadsheets/Export";

/// Protocol version sent in the `GData-Version` header.
pub const GDATA_VERSION: &str = "3.0";

/// Fixed URLs the client talks to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub login: String,
    pub feed: String,
    pub document_export: String,
    pub drawing_export: String,
    pub presentation_export: String,
    pub spreadsheet_export: String,
}

impl Endpoints {
    /// The production Google endpoints.
    pub fn google() -> Self {
        Self::rooted_at(GOOGLE_DOCS_URL, GOOGLE_SPREADSHEETS_URL, GOOGLE_ACCOUNTS_URL)
    }

    /// Build the standard paths against other hosts.
    ///
    /// # Arguments
    /// * `docs` - Base URL for the feed and the document/drawing/presentation exports
    /// * `spreadsheets` - Base URL for spreadsheet exports
    /// * `login` - Base URL for the login endpoint
    pub fn rooted_at(docs: &str, spreadsheets: &str, login: &str) -> Self {
        let docs = docs.trim_end_matches('/');
        let spreadsheets = spreadsheets.trim_end_matches('/');
        let login = login.trim_end_matches('/');

        Self {
            login: format!("{}{}", login, LOGIN_PATH),
            feed: format!("{}{}", docs, FEED_PATH),
            document_export: format!("{}{}", docs, DOCUMENT_EXPORT_PATH),
            drawing_export: format!("{}{}", docs, DRAWING_EXPORT_PATH),
            presentation_export: format!("{}{}", docs, PRESENTATION_EXPORT_PATH),
            spreadsheet_export: format!("{}{}", spreadsheets, SPREADSHEET_EXPORT_PATH),
        }
    }

    /// Every endpoint served from a single base URL.
    pub fn single_host(base: &str) -> Self {
        Self::rooted_at(base, base, base)
    }
}

impl Default for Endpoints {
    fn default() -> Self {
        Self::google()
    }
}

/// Client-wide settings.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub endpoints: Endpoints,
    /// Total time allowed for one request/response round trip.
    pub timeout: Duration,
    pub connect_timeout: Duration,
    /// Skip TLS certificate verification. Off unless explicitly requested.
    pub accept_invalid_certs: bool,
    pub gdata_version: String,
}

impl ClientConfig {
    pub fn new(endpoints: Endpoints) -> Self {
        Self {
            endpoints,
            ..Self::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoints: Endpoints::google(),
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            accept_invalid_certs: false,
            gdata_version: GDATA_VERSION.to_string(),
        }
    }
}
