//! Method/URI dispatch for the submission endpoints.
//!
//! One router implementation serves both protocol versions; the injected
//! [`PipelineStrategy`] decides which tool chain a submission reaches. Every
//! failure raised anywhere below the dispatch boundary is rendered as the
//! HTML error page — no error escapes to the transport, nothing is retried.

use crate::error::ServiceError;
use crate::multipart;
use crate::pages;
use crate::pipeline::{structure_id, PipelineStrategy};
use http::Method;
use std::borrow::Cow;
use std::sync::Arc;
use tracing::{info, warn};

/// Attachment name used for sequence submissions.
const SEQUENCE_ATTACHMENT: &str = "hssp-for-sequence";

/// What the transport should send back for one request.
#[derive(Debug, PartialEq, Eq)]
pub enum RouterResponse {
    /// An HTML document (`text/html`): the index page or the error page.
    Html(Cow<'static, str>),
    /// A plain-text report served as a named attachment.
    Attachment { filename: String, body: String },
    /// None of the four behaviors matched; the transport's default handling
    /// applies.
    NotHandled,
}

pub struct Router {
    strategy: Arc<dyn PipelineStrategy>,
}

impl Router {
    pub fn new(strategy: Arc<dyn PipelineStrategy>) -> Self {
        Self { strategy }
    }

    /// Dispatch one request. Errors from any branch are caught here and
    /// rendered as the error page, served as HTML regardless of the content
    /// type the branch would have produced.
    pub fn handle(&self, method: &Method, uri: &str, payload: &str) -> RouterResponse {
        let path = normalize_uri(uri);
        match self.dispatch(method, path, payload) {
            Ok(response) => response,
            Err(err) => {
                warn!(%method, uri, error = %err, "request failed");
                RouterResponse::Html(pages::render_error_page(&err.to_string()).into())
            }
        }
    }

    fn dispatch(
        &self,
        method: &Method,
        path: &str,
        payload: &str,
    ) -> Result<RouterResponse, ServiceError> {
        if method == Method::GET && (path.is_empty() || path.starts_with("index")) {
            return Ok(RouterResponse::Html(pages::INDEX_HTML.into()));
        }

        if method == Method::POST {
            if path.starts_with("PDB2DSSP") || path.starts_with("PDB2HSSP") {
                let form = multipart::decode_form(payload)?;

                let name = form
                    .filename
                    .clone()
                    .filter(|f| !f.is_empty())
                    .or_else(|| structure_id(&form.structure).map(|id| format!("{id}.pdb")))
                    .unwrap_or_default();

                let (body, filename) = if path.starts_with("PDB2DSSP") {
                    let report = self.strategy.assign_structure(&form.structure)?;
                    (report, replace_extension(&name, "dssp"))
                } else {
                    let report = self.strategy.align_from_structure(&form.structure)?;
                    (report, replace_extension(&name, "hssp"))
                };

                info!(path, filename, bytes = body.len(), "structure submission served");
                return Ok(RouterResponse::Attachment { filename, body });
            }

            if path.starts_with("SEQ2HSSP") {
                let at = payload
                    .find("seq=")
                    .ok_or_else(|| ServiceError::malformed("missing sequence parameter"))?;
                let sequence = urlencoding::decode(&payload[at + 4..]).map_err(|e| {
                    ServiceError::malformed(format!("sequence is not valid encoded text: {e}"))
                })?;

                let body = self.strategy.align_from_sequence(&sequence)?;

                info!(path, bytes = body.len(), "sequence submission served");
                return Ok(RouterResponse::Attachment {
                    filename: SEQUENCE_ATTACHMENT.to_string(),
                    body,
                });
            }
        }

        Ok(RouterResponse::NotHandled)
    }
}

/// Strip a leading `scheme://host` and any leading slashes, so absolute-form
/// and origin-form request targets route identically.
pub fn normalize_uri(uri: &str) -> &str {
    let mut s = uri;
    if let Some(p) = s.find("://") {
        let scheme = &s[..p];
        let scheme_ok = !scheme.is_empty()
            && scheme
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
        if scheme_ok {
            if let Some(slash) = s[p + 3..].find('/') {
                s = &s[p + 3 + slash..];
            }
        }
    }
    s.trim_start_matches('/')
}

/// Replace the final `.extension` of a filename, or append one if the name
/// has none.
fn replace_extension(name: &str, ext: &str) -> String {
    let stem = match name.rfind('.') {
        Some(i) => &name[..i],
        None => name,
    };
    format!("{stem}.{ext}")
}
