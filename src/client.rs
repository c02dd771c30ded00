//! Documents List client: search, upload, export, delete and convert.

use std::io::{Seek, SeekFrom, Write};
use std::sync::Arc;

use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::auth::{Credentials, Scope, TokenStore};
use crate::config::{ClientConfig, Endpoints};
use crate::error::{DocsError, Result};
use crate::formats::{FormatResolver, StandardFormats};
use crate::models::{split_name, Upload};
use crate::resource::{
    escape_path_segment, escape_query_value, extract_ids, is_resource_id, slug, ResourceId,
    ResourceKind,
};
use crate::transport::{Dispatcher, HttpTransport, Method, Request, Transport};

/// Options for [`DocsClient::search`].
#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    /// Only match titles exactly.
    pub exact: bool,
}

/// Options for [`DocsClient::put`].
#[derive(Debug, Clone, Default)]
pub struct PutOptions {
    /// Title to store the upload under. Defaults to the file's base name.
    pub title: Option<String>,
}

/// Options for [`DocsClient::get`].
#[derive(Debug, Clone, Default)]
pub struct GetOptions {
    /// Export format, e.g. `pdf` or `csv`.
    pub format: Option<String>,
    /// Spreadsheet sheet index; only sent together with a format.
    pub sheet: Option<u32>,
}

/// Options for [`DocsClient::delete`].
#[derive(Debug, Clone, Default)]
pub struct DeleteOptions {
    /// Move to trash instead of deleting permanently.
    pub trash: bool,
}

/// Options for [`DocsClient::convert`].
#[derive(Debug, Clone, Default)]
pub struct ConvertOptions {
    pub title: Option<String>,
    pub format: Option<String>,
}

/// Client for one account on the documents service.
pub struct DocsClient {
    endpoints: Endpoints,
    tokens: TokenStore,
    dispatcher: Dispatcher,
    formats: Box<dyn FormatResolver>,
}

impl DocsClient {
    /// Create a client that talks HTTP(S) through reqwest.
    ///
    /// # Arguments
    /// * `credentials` - Account used for every login
    /// * `config` - Endpoints and transport settings
    pub fn new(credentials: Credentials, config: ClientConfig) -> Result<Self> {
        let transport = HttpTransport::new(&config)?;
        Ok(Self::with_transport(credentials, config, Arc::new(transport)))
    }

    /// Create a client over a custom transport.
    pub fn with_transport(
        credentials: Credentials,
        config: ClientConfig,
        transport: Arc<dyn Transport>,
    ) -> Self {
        let dispatcher = Dispatcher::new(transport, config.gdata_version.clone());
        let tokens = TokenStore::new(credentials, config.endpoints.login.clone(), dispatcher.clone());

        Self {
            endpoints: config.endpoints,
            tokens,
            dispatcher,
            formats: Box::new(StandardFormats),
        }
    }

    /// Replace the built-in format tables.
    pub fn with_format_resolver(mut self, formats: impl FormatResolver + 'static) -> Self {
        self.formats = Box::new(formats);
        self
    }

    /// Token cache, for pre-warming logins or checking state.
    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Search titles. Whitespace in `query` becomes `+`.
    ///
    /// Any non-200 answer is reported as no results.
    pub fn search(&self, query: &str, options: &SearchOptions) -> Result<Vec<ResourceId>> {
        let mut url = format!("{}?title={}", self.endpoints.feed, title_filter(query));
        if options.exact {
            url.push_str("&title-exact=true");
        }

        let request = self.authorized(Request::new(Method::Get, url), &Scope::document())?;
        let response = self.dispatcher.dispatch(request)?;

        if response.status != 200 {
            debug!(query, status = response.status, "search returned no feed");
            return Ok(Vec::new());
        }

        extract_ids(&response.body)
    }

    /// Upload a file. Returns the new resource id, or `None` if the service
    /// did not create it.
    ///
    /// Fails with [`DocsError::UnsupportedFormat`] before any network call
    /// when the file is not an accepted upload format.
    pub fn put(&self, file: &mut dyn Upload, options: &PutOptions) -> Result<Option<ResourceId>> {
        let name = file.name();
        let format = self.formats.inspect(file)?;

        let kind = match format.kind {
            Some(kind) if self.formats.valid_upload_format(&format.extension, kind) => kind,
            _ => {
                return Err(DocsError::UnsupportedFormat(if format.extension.is_empty() {
                    name
                } else {
                    format.extension
                }))
            }
        };

        let (basename, _) = split_name(&name);
        let title = options.title.as_deref().unwrap_or(basename);

        file.rewind()?;
        let size = file.size()?;
        let content = file.read_all()?;

        let mut request = Request::new(Method::Post, self.endpoints.feed.as_str())
            .header("Content-Length", size.to_string())
            .header("Slug", slug(title));
        if let Some(mime_type) = &format.mime_type {
            request = request.header("Content-Type", mime_type.as_str());
        }
        let request = self.authorized(request.body(content), &kind.scope())?;
        let response = self.dispatcher.dispatch(request)?;

        if response.status != 201 {
            debug!(title, status = response.status, "upload not created");
            return Ok(None);
        }

        Ok(extract_ids(&response.body)?.into_iter().next())
    }

    /// Same as [`put`](Self::put) but a missing result is an error.
    pub fn put_strict(&self, file: &mut dyn Upload, options: &PutOptions) -> Result<ResourceId> {
        let name = file.name();
        self.put(file, options)?
            .ok_or_else(|| DocsError::OperationFailed(format!("unable to upload {}", name)))
    }

    /// Export a resource into a temporary file positioned at its start.
    ///
    /// `query` is a resource id or an exact title. Returns `None` when the
    /// title matches nothing or the export is not served.
    pub fn get(&self, query: &str, options: &GetOptions) -> Result<Option<NamedTempFile>> {
        let Some(id) = self.resolve(query)? else {
            return Ok(None);
        };
        let kind = id.resource_kind()?;

        let format = options.format.as_deref();
        if let Some(format) = format {
            self.check_export_format(format, kind)?;
        }

        let url = self.export_url(&id, kind, format, options.sheet);
        let request = self.authorized(Request::new(Method::Get, url), &kind.scope())?;
        let response = self.dispatcher.dispatch(request)?;

        if response.status != 200 {
            debug!(id = %id, status = response.status, "export not available");
            return Ok(None);
        }

        let prefix = format!("{}-", file_stem(id.opaque()));
        let suffix = format.map(|f| format!(".{}", f)).unwrap_or_default();
        let mut file = tempfile::Builder::new()
            .prefix(&prefix)
            .suffix(&suffix)
            .tempfile()?;
        file.write_all(&response.body)?;
        file.flush()?;
        file.as_file_mut().seek(SeekFrom::Start(0))?;

        Ok(Some(file))
    }

    /// Delete a resource by id or exact title.
    ///
    /// Deletion is permanent unless `trash` is set. Returns `false` when the
    /// title matches nothing or the service refuses.
    pub fn delete(&self, query: &str, options: &DeleteOptions) -> Result<bool> {
        let Some(id) = self.resolve(query)? else {
            return Ok(false);
        };

        let mut url = format!(
            "{}/{}",
            self.endpoints.feed,
            escape_path_segment(id.as_str())
        );
        if !options.trash {
            url.push_str("?delete=true");
        }

        let request = Request::new(Method::Delete, url).header("If-Match", "*");
        let request = self.authorized(request, &id.scope())?;
        let response = self.dispatcher.dispatch(request)?;

        Ok(response.status == 200)
    }

    /// Same as [`delete`](Self::delete) but a refusal is an error.
    pub fn delete_strict(&self, query: &str, options: &DeleteOptions) -> Result<()> {
        if self.delete(query, options)? {
            Ok(())
        } else {
            Err(DocsError::OperationFailed(format!("unable to delete {}", query)))
        }
    }

    /// Upload, export and delete in one go.
    ///
    /// Stops with `None` if the upload fails. The uploaded copy is removed
    /// even when the export fails. An export format the file's kind cannot
    /// produce is rejected before anything is sent.
    pub fn convert(
        &self,
        file: &mut dyn Upload,
        options: &ConvertOptions,
    ) -> Result<Option<NamedTempFile>> {
        if let Some(format) = options.format.as_deref() {
            if let Some(kind) = self.formats.inspect(file)?.kind {
                self.check_export_format(format, kind)?;
            }
        }

        let put_options = PutOptions {
            title: options.title.clone(),
        };
        let Some(id) = self.put(file, &put_options)? else {
            return Ok(None);
        };

        let get_options = GetOptions {
            format: options.format.clone(),
            sheet: None,
        };
        let converted = self.get(id.as_str(), &get_options);

        match self.delete(id.as_str(), &DeleteOptions::default()) {
            Ok(true) => {}
            Ok(false) => warn!(id = %id, "converted upload was not deleted"),
            Err(err) => {
                warn!(id = %id, error = %err, "failed to delete converted upload");
                if converted.is_ok() {
                    return Err(err);
                }
            }
        }

        converted
    }

    /// A resource id as is, or the first exact title match.
    fn resolve(&self, query: &str) -> Result<Option<ResourceId>> {
        if is_resource_id(query) {
            return Ok(Some(ResourceId::new(query)));
        }

        let matches = self.search(query, &SearchOptions { exact: true })?;
        Ok(matches.into_iter().next())
    }

    fn check_export_format(&self, format: &str, kind: ResourceKind) -> Result<()> {
        if self.formats.valid_export_format(format, kind) {
            Ok(())
        } else {
            Err(DocsError::InvalidFormat {
                format: format.to_string(),
                kind: kind.to_string(),
            })
        }
    }

    fn export_url(
        &self,
        id: &ResourceId,
        kind: ResourceKind,
        format: Option<&str>,
        sheet: Option<u32>,
    ) -> String {
        let opaque = escape_query_value(id.opaque());
        let mut url = match kind {
            ResourceKind::Document => format!("{}?docID={}", self.endpoints.document_export, opaque),
            ResourceKind::Drawing => format!("{}?docID={}", self.endpoints.drawing_export, opaque),
            ResourceKind::Presentation => {
                format!("{}?docID={}", self.endpoints.presentation_export, opaque)
            }
            ResourceKind::Spreadsheet => {
                format!("{}?key={}", self.endpoints.spreadsheet_export, opaque)
            }
        };

        if let Some(format) = format {
            let format = escape_query_value(format);
            url.push_str(&format!("&exportFormat={}", format));
            match kind {
                ResourceKind::Document => url.push_str(&format!("&format={}", format)),
                ResourceKind::Spreadsheet => {
                    if let Some(sheet) = sheet {
                        url.push_str(&format!("&gid={}", sheet));
                    }
                }
                _ => {}
            }
        }

        url
    }

    fn authorized(&self, request: Request, scope: &Scope) -> Result<Request> {
        let token = self.tokens.token_for(scope)?;
        Ok(request.header("Authorization", format!("GoogleLogin auth={}", token)))
    }
}

/// Percent-encode each word and join with a literal `+`.
fn title_filter(query: &str) -> String {
    query
        .split_whitespace()
        .map(escape_query_value)
        .collect::<Vec<_>>()
        .join("+")
}

/// Temp file name part for an opaque id. Anything outside `[A-Za-z0-9_-]`
/// becomes `_`.
fn file_stem(opaque: &str) -> String {
    opaque
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}
