//! HTTP implementation of [`RenderBackend`] on top of `ureq`.

use tracing::{debug, info};
use ureq::Agent;

use super::{Artifact, Metadata, RenderBackend, RenderError};
use crate::document::ChartDocument;
use crate::options::OutputFormat;

pub const VECTOR_PATH: &str = "/render/vector";
pub const RASTER_PATH: &str = "/render/raster";
pub const METADATA_PATH: &str = "/metadata";

/// Response bodies larger than this are treated as a transport failure.
/// Applies to both markup and raster payloads.
pub const MAX_BODY_BYTES: u64 = 64 * 1024 * 1024;

/// Client for a chart rendering service reachable over HTTP.
#[derive(Clone)]
pub struct HttpRenderClient {
    agent: Agent,
    base_url: String,
}

impl std::fmt::Debug for HttpRenderClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpRenderClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl HttpRenderClient {
    /// Create a client for the service at `base_url` (e.g. `http://127.0.0.1:5000`).
    pub fn new(base_url: impl Into<String>) -> Self {
        // Failure statuses carry a JSON error body we want to read, so they
        // must come back as responses rather than as `ureq::Error`.
        let agent: Agent = Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .into();
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { agent, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

fn transport(err: &ureq::Error) -> RenderError {
    RenderError::Transport(err.to_string())
}

/// Build a service error from a failure response. An unreadable body falls
/// back to the generic message.
fn service_error(response: &mut ureq::http::Response<ureq::Body>) -> RenderError {
    let status = response.status().as_u16();
    let body = response
        .body_mut()
        .with_config()
        .limit(MAX_BODY_BYTES)
        .read_to_vec()
        .unwrap_or_else(|err| {
            debug!(status, error = %err, "error body unreadable");
            Vec::new()
        });
    RenderError::from_service_body(status, &body)
}

impl RenderBackend for HttpRenderClient {
    fn render(
        &self,
        document: &ChartDocument,
        format: OutputFormat,
    ) -> Result<Artifact, RenderError> {
        let url = self.url(match format {
            OutputFormat::Svg => VECTOR_PATH,
            OutputFormat::Png => RASTER_PATH,
        });
        let body = document.to_compact_string();
        debug!(url, bytes = body.len(), "sending render request");

        let mut response = self
            .agent
            .post(&url)
            .header("Content-Type", "application/json")
            .send(body.as_bytes())
            .map_err(|err| transport(&err))?;

        if !response.status().is_success() {
            return Err(service_error(&mut response));
        }

        let artifact = match format {
            OutputFormat::Svg => {
                let markup = response
                    .body_mut()
                    .with_config()
                    .limit(MAX_BODY_BYTES)
                    .read_to_string()
                    .map_err(|err| transport(&err))?;
                Artifact::svg(markup)
            }
            OutputFormat::Png => {
                let bytes = response
                    .body_mut()
                    .with_config()
                    .limit(MAX_BODY_BYTES)
                    .read_to_vec()
                    .map_err(|err| transport(&err))?;
                Artifact::png(&bytes)
            }
        };
        info!(
            url,
            kind = artifact.kind.as_str(),
            payload_len = artifact.payload.len(),
            "render succeeded"
        );
        Ok(artifact)
    }

    fn metadata(&self) -> Result<Metadata, RenderError> {
        let url = self.url(METADATA_PATH);
        let mut response = self.agent.get(&url).call().map_err(|err| transport(&err))?;
        if !response.status().is_success() {
            return Err(service_error(&mut response));
        }
        let status = response.status();
        let body = response
            .body_mut()
            .read_to_vec()
            .map_err(|err| transport(&err))?;
        serde_json::from_slice(&body).map_err(|err| RenderError::Service {
            status: status.as_u16(),
            message: format!("invalid metadata response: {err}"),
        })
    }
}
