use std::io::Read;
use std::net::TcpListener;
use std::thread::{self, JoinHandle};

use tiny_http::{Header, Response, Server};

use chartpad::document::ChartDocument;
use chartpad::options::{OptionState, OutputFormat};
use chartpad::render::{
    Artifact, GENERIC_FAILURE_MESSAGE, HttpRenderClient, Metadata, RenderBackend, RenderError,
};

/// Larger than ureq's default 10 MiB body limit.
const LARGE_PAYLOAD_BYTES: usize = 11 * 1024 * 1024;
use chartpad::template::TemplateLibrary;
use chartpad::workbench::Workbench;

/// What the test server saw of the single request it handled.
struct Captured {
    method: String,
    url: String,
    content_type: Option<String>,
    body: String,
}

/// Answer exactly one request with `status` and `body`.
fn serve_once(status: u16, body: Vec<u8>, content_type: &'static str) -> (String, JoinHandle<Captured>) {
    let server = Server::http("127.0.0.1:0").unwrap();
    let addr = server.server_addr().to_ip().unwrap();
    let handle = thread::spawn(move || {
        let mut request = server.recv().unwrap();
        let mut received = String::new();
        request.as_reader().read_to_string(&mut received).unwrap();
        let captured = Captured {
            method: request.method().to_string(),
            url: request.url().to_string(),
            content_type: request
                .headers()
                .iter()
                .find(|h| h.field.equiv("Content-Type"))
                .map(|h| h.value.as_str().to_string()),
            body: received,
        };
        let header = Header::from_bytes(&b"Content-Type"[..], content_type.as_bytes()).unwrap();
        request
            .respond(
                Response::from_data(body)
                    .with_status_code(status)
                    .with_header(header),
            )
            .unwrap();
        captured
    });
    (format!("http://{addr}"), handle)
}

fn sample_document() -> ChartDocument {
    ChartDocument::parse(r#"{"b": 1, "a": 2, "width": 300}"#).unwrap()
}

#[test]
fn test_vector_render_posts_compact_json() {
    let (url, server) = serve_once(200, b"<svg>chart</svg>".to_vec(), "image/svg+xml");
    let client = HttpRenderClient::new(url);

    let artifact = client.render(&sample_document(), OutputFormat::Svg).unwrap();
    assert_eq!(artifact, Artifact::svg("<svg>chart</svg>"));

    let captured = server.join().unwrap();
    assert_eq!(captured.method, "POST");
    assert_eq!(captured.url, "/render/vector");
    assert_eq!(captured.content_type.as_deref(), Some("application/json"));
    assert_eq!(captured.body, r#"{"b":1,"a":2,"width":300}"#);
}

#[test]
fn test_raster_render_wraps_bytes_in_data_uri() {
    let png = vec![0x89, b'P', b'N', b'G', 0, 1, 2, 3];
    let (url, server) = serve_once(200, png.clone(), "image/png");
    let client = HttpRenderClient::new(url);

    let artifact = client.render(&sample_document(), OutputFormat::Png).unwrap();
    assert!(artifact.payload.starts_with("data:image/png;base64,"));
    assert_eq!(artifact.raster_bytes(), Some(png));

    assert_eq!(server.join().unwrap().url, "/render/raster");
}

#[test]
fn test_service_error_message_is_surfaced() {
    let (url, server) = serve_once(
        400,
        br#"{"message": "invalid color"}"#.to_vec(),
        "application/json",
    );
    let client = HttpRenderClient::new(url);

    let err = client.render(&sample_document(), OutputFormat::Svg).unwrap_err();
    assert_eq!(
        err,
        RenderError::Service {
            status: 400,
            message: "invalid color".to_string(),
        }
    );
    assert_eq!(err.to_string(), "invalid color");
    server.join().unwrap();
}

#[test]
fn test_unreadable_error_body_uses_generic_message() {
    let (url, server) = serve_once(500, b"<html>oops</html>".to_vec(), "text/html");
    let client = HttpRenderClient::new(url);

    let err = client.render(&sample_document(), OutputFormat::Png).unwrap_err();
    assert_eq!(
        err,
        RenderError::Service {
            status: 500,
            message: GENERIC_FAILURE_MESSAGE.to_string(),
        }
    );
    server.join().unwrap();
}

#[test]
fn test_empty_error_message_uses_generic_message() {
    let (url, server) = serve_once(422, br#"{"message": ""}"#.to_vec(), "application/json");
    let client = HttpRenderClient::new(url);

    let err = client.render(&sample_document(), OutputFormat::Svg).unwrap_err();
    assert_eq!(err.to_string(), GENERIC_FAILURE_MESSAGE);
    server.join().unwrap();
}

#[test]
fn test_large_error_body_is_still_a_service_error() {
    let body = format!(
        r#"{{"message": "invalid color", "pad": "{}"}}"#,
        "x".repeat(LARGE_PAYLOAD_BYTES)
    );
    let (url, server) = serve_once(500, body.into_bytes(), "application/json");
    let client = HttpRenderClient::new(url);

    let err = client.render(&sample_document(), OutputFormat::Svg).unwrap_err();
    assert_eq!(
        err,
        RenderError::Service {
            status: 500,
            message: "invalid color".to_string(),
        }
    );
    server.join().unwrap();
}

#[test]
fn test_large_vector_response_is_used_verbatim() {
    let markup = format!("<svg>{}</svg>", "<g/>".repeat(LARGE_PAYLOAD_BYTES / 4));
    let (url, server) = serve_once(200, markup.clone().into_bytes(), "image/svg+xml");
    let client = HttpRenderClient::new(url);

    let artifact = client.render(&sample_document(), OutputFormat::Svg).unwrap();
    assert!(artifact.payload.len() > LARGE_PAYLOAD_BYTES);
    assert_eq!(artifact, Artifact::svg(markup));
    server.join().unwrap();
}

#[test]
fn test_unreachable_service_is_a_transport_error() {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let client = HttpRenderClient::new(format!("http://127.0.0.1:{port}"));

    let err = client.render(&sample_document(), OutputFormat::Svg).unwrap_err();
    assert!(matches!(err, RenderError::Transport(_)), "{err:?}");
}

#[test]
fn test_metadata_is_fetched_with_get() {
    let (url, server) = serve_once(
        200,
        br#"{"families": ["Inter", "Roboto"], "version": "3.4.1"}"#.to_vec(),
        "application/json",
    );
    let client = HttpRenderClient::new(url);

    let metadata = client.metadata().unwrap();
    assert_eq!(
        metadata,
        Metadata {
            families: vec!["Inter".to_string(), "Roboto".to_string()],
            version: "3.4.1".to_string(),
        }
    );

    let captured = server.join().unwrap();
    assert_eq!(captured.method, "GET");
    assert_eq!(captured.url, "/metadata");
}

#[test]
fn test_malformed_metadata_is_an_error() {
    let (url, server) = serve_once(200, b"not json".to_vec(), "text/plain");
    let client = HttpRenderClient::new(url);
    assert!(matches!(
        client.metadata(),
        Err(RenderError::Service { status: 200, .. })
    ));
    server.join().unwrap();
}

#[test]
fn test_workbench_generate_against_http_service() {
    let (url, server) = serve_once(200, b"<svg/>".to_vec(), "image/svg+xml");
    let client = HttpRenderClient::new(url);
    let mut workbench = Workbench::new(
        String::new(),
        TemplateLibrary::builtin(),
        OptionState::default(),
    );
    workbench.edit(r#"{"type": "bar", "width": 640, "height": 480}"#);

    assert!(workbench.generate(&client));
    let preview = workbench.artifact().unwrap();
    assert_eq!(preview.artifact, Artifact::svg("<svg/>"));
    assert_eq!((preview.width, preview.height), (640, 480));
    assert!(workbench.error().is_none());

    let captured = server.join().unwrap();
    assert_eq!(captured.body, r#"{"type":"bar","width":640,"height":480}"#);
}
