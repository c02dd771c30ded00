//! ClientLogin authentication and per-scope token caching.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;

use parking_lot::Mutex;
use serde::Deserialize;
use tracing::{info, warn};

use crate::error::{DocsError, Result};
use crate::transport::{Dispatcher, Method, Request};

/// Scope name for documents, drawings and presentations.
const DOCUMENT_SCOPE: &str = "writely";

/// Scope name for spreadsheets.
const SPREADSHEET_SCOPE: &str = "wise";

const ACCOUNT_TYPE: &str = "HOSTED_OR_GOOGLE";

/// An authentication scope understood by the login endpoint.
///
/// Unknown names are kept verbatim and sent to the service as is.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Scope(String);

impl Scope {
    pub fn document() -> Self {
        Self(DOCUMENT_SCOPE.to_string())
    }

    pub fn spreadsheet() -> Self {
        Self(SPREADSHEET_SCOPE.to_string())
    }

    /// Map a loose service hint to a scope.
    ///
    /// `None` and `"document"` give the document scope, `"spreadsheet"` and
    /// `"spreadsheets"` the spreadsheet scope; anything else is used as the
    /// scope name itself.
    pub fn resolve(hint: Option<&str>) -> Self {
        match hint {
            None | Some("document") => Self::document(),
            Some("spreadsheet") | Some("spreadsheets") => Self::spreadsheet(),
            Some(other) => Self(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Account email and password.
#[derive(Clone, Deserialize)]
pub struct Credentials {
    email: String,
    password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    /// Load credentials from a JSON file of the form
    /// `{"email": "...", "password": "..."}`.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let credentials: Credentials = serde_json::from_str(&content)?;
        Ok(credentials)
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    fn ensure_complete(&self) -> Result<()> {
        if self.email.trim().is_empty() {
            return Err(DocsError::Config("account email is missing".to_string()));
        }
        if self.password.is_empty() {
            return Err(DocsError::Config("account password is missing".to_string()));
        }
        Ok(())
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Pull the token out of a ClientLogin success body.
///
/// The token is whatever follows the last `=`, trailing whitespace removed.
/// A body ending in `=` (such as `Auth=abc==`) therefore carries no token
/// and the login counts as failed; padding is never stripped to find one.
pub fn extract_token(body: &str) -> Option<&str> {
    body.trim_end()
        .rsplit('=')
        .next()
        .filter(|token| !token.is_empty())
}

/// Holds one account's credentials and a token per authenticated scope.
///
/// Tokens never expire client-side; once a scope is authenticated it stays
/// cached for the life of the store. The map is guarded so that concurrent
/// first requests for the same scope perform a single login.
pub struct TokenStore {
    credentials: Credentials,
    login_url: String,
    dispatcher: Dispatcher,
    tokens: Mutex<HashMap<Scope, String>>,
}

impl TokenStore {
    pub fn new(credentials: Credentials, login_url: impl Into<String>, dispatcher: Dispatcher) -> Self {
        Self {
            credentials,
            login_url: login_url.into(),
            dispatcher,
            tokens: Mutex::new(HashMap::new()),
        }
    }

    /// With no scope: true if any scope holds a token. With a scope: true if
    /// that scope holds one.
    pub fn is_authenticated(&self, scope: Option<&str>) -> bool {
        let tokens = self.tokens.lock();
        match scope {
            None => !tokens.is_empty(),
            Some(hint) => tokens.contains_key(&Scope::resolve(Some(hint))),
        }
    }

    /// Log in for a scope.
    ///
    /// Returns `Ok(false)` when the service rejects the credentials (403).
    /// Any other non-success status is an [`DocsError::Auth`].
    pub fn authenticate(&self, scope: Option<&str>) -> Result<bool> {
        let scope = Scope::resolve(scope);
        let mut tokens = self.tokens.lock();
        self.login(&scope, &mut tokens)
    }

    /// Token for a scope, logging in first if needed.
    pub fn token(&self, scope: Option<&str>) -> Result<String> {
        self.token_for(&Scope::resolve(scope))
    }

    pub fn token_for(&self, scope: &Scope) -> Result<String> {
        let mut tokens = self.tokens.lock();
        if let Some(token) = tokens.get(scope) {
            return Ok(token.clone());
        }

        if !self.login(scope, &mut tokens)? {
            return Err(DocsError::Auth {
                status: 403,
                body: format!("credentials rejected for scope {}", scope),
            });
        }

        tokens
            .get(scope)
            .cloned()
            .ok_or_else(|| DocsError::Config(format!("no token cached for scope {}", scope)))
    }

    fn login(&self, scope: &Scope, tokens: &mut HashMap<Scope, String>) -> Result<bool> {
        self.credentials.ensure_complete()?;

        let form: String = url_form(&[
            ("accountType", ACCOUNT_TYPE),
            ("Email", self.credentials.email.as_str()),
            ("Passwd", self.credentials.password.as_str()),
            ("service", scope.as_str()),
        ]);

        let request = Request::new(Method::Post, &self.login_url)
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(form.into_bytes());
        let response = self.dispatcher.dispatch(request)?;

        if response.is_success() {
            let body = response.text();
            let token = extract_token(&body).ok_or_else(|| DocsError::Auth {
                status: response.status,
                body: "login response carried no token".to_string(),
            })?;
            tokens.insert(scope.clone(), token.to_string());
            info!(scope = %scope, "authenticated");
            return Ok(true);
        }

        if response.status == 403 {
            warn!(scope = %scope, "login rejected");
            return Ok(false);
        }

        Err(DocsError::Auth {
            status: response.status,
            body: response.text(),
        })
    }
}

fn url_form(fields: &[(&str, &str)]) -> String {
    fields
        .iter()
        .map(|(key, value)| {
            format!(
                "{}={}",
                crate::resource::escape_query_value(key),
                crate::resource::escape_query_value(value)
            )
        })
        .collect::<Vec<_>>()
        .join("&")
}
