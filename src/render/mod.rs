//! Rendering service client.
//!
//! The workbench talks to the service through [`RenderBackend`], so the
//! orchestration logic can be driven by an in-process fake in tests and by
//! [`HttpRenderClient`] in the application.

mod http;

pub use http::{HttpRenderClient, METADATA_PATH, RASTER_PATH, VECTOR_PATH};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Deserialize;
use thiserror::Error;

use crate::document::ChartDocument;
use crate::options::OutputFormat;

/// Shown when the service reports a failure without a usable message.
pub const GENERIC_FAILURE_MESSAGE: &str = "generate chart fail";

const PNG_DATA_URI_PREFIX: &str = "data:image/png;base64,";

/// Failure of a single render or metadata call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    /// The request never produced a response (DNS, connect, I/O).
    #[error("{0}")]
    Transport(String),
    /// The service answered with a failure status.
    #[error("{message}")]
    Service { status: u16, message: String },
}

impl RenderError {
    /// Build a service error from a failure response body.
    ///
    /// Uses the body's `message` field, or [`GENERIC_FAILURE_MESSAGE`] when the
    /// body is not JSON or carries no non-empty message.
    pub fn from_service_body(status: u16, body: &[u8]) -> Self {
        #[derive(Deserialize)]
        struct ErrorBody {
            message: Option<String>,
        }

        let message = serde_json::from_slice::<ErrorBody>(body)
            .ok()
            .and_then(|b| b.message)
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| GENERIC_FAILURE_MESSAGE.to_string());
        Self::Service { status, message }
    }
}

/// What kind of payload an [`Artifact`] carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    Svg,
    Png,
}

impl ArtifactKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Svg => "svg",
            Self::Png => "png",
        }
    }
}

/// A decoded, displayable render result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub kind: ArtifactKind,
    /// SVG markup, or a self-contained `data:` URI for raster images.
    pub payload: String,
}

impl Artifact {
    /// Vector markup, used verbatim.
    pub fn svg(markup: impl Into<String>) -> Self {
        Self {
            kind: ArtifactKind::Svg,
            payload: markup.into(),
        }
    }

    /// Raster bytes, wrapped as a base64 `data:` URI.
    pub fn png(bytes: &[u8]) -> Self {
        Self {
            kind: ArtifactKind::Png,
            payload: png_data_uri(bytes),
        }
    }

    /// The raw image bytes behind a raster payload.
    pub fn raster_bytes(&self) -> Option<Vec<u8>> {
        match self.kind {
            ArtifactKind::Png => decode_data_uri(&self.payload),
            ArtifactKind::Svg => None,
        }
    }
}

/// Startup information published by the service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Metadata {
    #[serde(default)]
    pub families: Vec<String>,
    #[serde(default)]
    pub version: String,
}

/// A chart rendering service.
pub trait RenderBackend: Send + Sync {
    /// Render `document`; `format` picks the endpoint and how the response
    /// body is decoded.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Transport`] when no response arrives and
    /// [`RenderError::Service`] for failure statuses.
    fn render(&self, document: &ChartDocument, format: OutputFormat)
    -> Result<Artifact, RenderError>;

    /// Fetch font families and the service version.
    ///
    /// # Errors
    ///
    /// Same failure classes as [`RenderBackend::render`].
    fn metadata(&self) -> Result<Metadata, RenderError>;
}

pub fn png_data_uri(bytes: &[u8]) -> String {
    format!("{PNG_DATA_URI_PREFIX}{}", STANDARD.encode(bytes))
}

/// Decode a base64 `data:` URI back into bytes.
///
/// Accepts any media type; returns `None` for non-base64 or malformed URIs.
pub fn decode_data_uri(uri: &str) -> Option<Vec<u8>> {
    let rest = uri.strip_prefix("data:")?;
    let (header, data) = rest.split_once(',')?;
    if !header.ends_with(";base64") {
        return None;
    }
    STANDARD.decode(data).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_png_artifact_is_data_uri() {
        let artifact = Artifact::png(b"\x89PNG");
        assert_eq!(artifact.kind, ArtifactKind::Png);
        assert_eq!(artifact.payload, "data:image/png;base64,iVBORw==");
        assert_eq!(artifact.raster_bytes(), Some(b"\x89PNG".to_vec()));
    }

    #[test]
    fn test_svg_artifact_is_verbatim() {
        let markup = "<svg width=\"10\"><script>x</script></svg>";
        let artifact = Artifact::svg(markup);
        assert_eq!(artifact.payload, markup);
        assert_eq!(artifact.raster_bytes(), None);
    }

    #[test]
    fn test_decode_data_uri_rejects_plain_uris() {
        assert_eq!(decode_data_uri("data:text/plain,hello"), None);
        assert_eq!(decode_data_uri("https://example.com/a.png"), None);
        assert_eq!(decode_data_uri("data:image/png;base64,!!"), None);
    }

    #[test]
    fn test_service_body_message_is_used() {
        let err = RenderError::from_service_body(400, br#"{"message":"invalid color","category":"charts"}"#);
        assert_eq!(
            err,
            RenderError::Service {
                status: 400,
                message: "invalid color".to_string()
            }
        );
        assert_eq!(err.to_string(), "invalid color");
    }

    #[test]
    fn test_service_body_falls_back_to_generic_message() {
        let bodies: [&[u8]; 4] = [b"<html>502</html>", b"{}", br#"{"message":""}"#, b""];
        for body in bodies {
            let err = RenderError::from_service_body(502, body);
            assert_eq!(err.to_string(), GENERIC_FAILURE_MESSAGE);
        }
    }

    #[test]
    fn test_metadata_tolerates_missing_fields() {
        let meta: Metadata = serde_json::from_str(r#"{"families":["Roboto"]}"#).unwrap();
        assert_eq!(meta.families, ["Roboto"]);
        assert!(meta.version.is_empty());
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn raster_payload_decodes_to_original_bytes(
                bytes in prop::collection::vec(any::<u8>(), 0..512)
            ) {
                let artifact = Artifact::png(&bytes);
                prop_assert!(artifact.payload.starts_with("data:image/png;base64,"));
                prop_assert_eq!(artifact.raster_bytes(), Some(bytes));
            }
        }
    }
}
