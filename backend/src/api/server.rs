//! HTTP Server for the Main List converter.
//!
//! # API Endpoints
//!
//! | Method | Path           | Description                              |
//! |--------|----------------|------------------------------------------|
//! | GET    | `/`            | Upload page                              |
//! | POST   | `/convert`     | Upload an export, download the xlsx      |
//! | POST   | `/api/preview` | Upload an export, get the list as JSON   |
//! | GET    | `/health`      | Health check                             |
//! | GET    | `/api/logs`    | SSE stream for real-time logs            |

use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::{header, HeaderValue, Method, StatusCode},
    response::{sse::Event, Html, IntoResponse, Json, Response, Sse},
    routing::{get, post},
    Router,
};
use futures::stream::Stream;
use serde_json::{json, Value};
use std::{convert::Infallible, net::SocketAddr, sync::Arc, time::Duration};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tower_http::cors::CorsLayer;

use super::logs::{log_error, LOG_BROADCASTER};
use super::types::{convert_error_response, error_response, PreviewResponse};
use crate::config::ServerConfig;
use crate::error::{ConvertError, ServerError, ServerResult};
use crate::export::FILE_NAME;
use crate::transform::pipeline::{analyze_bytes, convert_bytes, ConvertOptions};

const PAGE_TEMPLATE: &str = include_str!("../../static/index.html");

const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Immutable state built once at startup.
#[derive(Debug)]
pub struct AppState {
    pub options: ConvertOptions,
    pub page: String,
}

impl AppState {
    pub fn new(options: ConvertOptions) -> Self {
        let page = PAGE_TEMPLATE
            .replace("{{STATUS}}", &options.target_status)
            .replace("{{SHEET}}", &options.sheet_name);
        Self { options, page }
    }
}

/// Build the router; exposed for embedding and tests.
pub fn router(state: Arc<AppState>, max_upload_bytes: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_TYPE, header::CONTENT_DISPOSITION]);

    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/convert", post(convert))
        .route("/api/preview", post(preview))
        .route("/api/logs", get(sse_logs))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(cors)
        .with_state(state)
}

/// Start the HTTP server
pub async fn start_server(config: ServerConfig, options: ConvertOptions) -> ServerResult<()> {
    let state = Arc::new(AppState::new(options));
    let app = router(state, config.max_upload_bytes);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .map_err(|e| ServerError::BadRequest(format!("Invalid listen address: {}", e)))?;

    println!("🚀 Main List server running on http://{}", addr);
    println!("   GET  /             - Upload page");
    println!("   POST /convert      - Upload export, download xlsx");
    println!("   POST /api/preview  - Upload export, get JSON");
    println!("   GET  /api/logs     - SSE log stream");
    println!("   GET  /health       - Health check");
    println!();

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn index(State(state): State<Arc<AppState>>) -> Html<String> {
    Html(state.page.clone())
}

/// Health check endpoint
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "mainlist",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "convert": "POST /convert",
            "preview": "POST /api/preview",
            "logs": "GET /api/logs (SSE)"
        }
    }))
}

/// SSE endpoint for real-time log streaming
async fn sse_logs() -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = LOG_BROADCASTER.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(entry) => {
            let json = serde_json::to_string(&entry).ok()?;
            Some(Ok(Event::default().data(json)))
        }
        Err(_) => None,
    });

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

/// Uploaded file: bytes and the client-side name, if sent.
struct Upload {
    bytes: Vec<u8>,
    file_name: Option<String>,
}

async fn read_upload(mut multipart: Multipart) -> ServerResult<Upload> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::BadRequest(format!("Multipart error: {}", e)))?
    {
        if field.name() == Some("file") {
            let file_name = field.file_name().map(|s| s.to_string());
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ServerError::BadRequest(format!("Read error: {}", e)))?
                .to_vec();
            return Ok(Upload { bytes, file_name });
        }
    }

    Err(ServerError::BadRequest("No file provided".to_string()))
}

fn log_upload(upload: &Upload) {
    println!("\n{}", "=".repeat(70));
    println!(
        "📄 NEW UPLOAD: {} ({} bytes)",
        upload.file_name.as_deref().unwrap_or("unknown"),
        upload.bytes.len()
    );
    println!("{}\n", "=".repeat(70));
}

fn status_for(err: &ConvertError) -> StatusCode {
    if err.is_client_error() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

fn html_error(status: StatusCode, message: &str) -> Response {
    (status, Html(format!("<h3>{}</h3>", escape_html(message)))).into_response()
}

/// Upload an export and download the Main List workbook.
async fn convert(State(state): State<Arc<AppState>>, multipart: Multipart) -> Response {
    let upload = match read_upload(multipart).await {
        Ok(upload) => upload,
        Err(e) => return html_error(StatusCode::BAD_REQUEST, &e.to_string()),
    };
    log_upload(&upload);

    match convert_bytes(&upload.bytes, upload.file_name.as_deref(), &state.options) {
        Ok(output) => (
            [
                (header::CONTENT_TYPE, HeaderValue::from_static(XLSX_MIME)),
                (header::CONTENT_DISPOSITION, attachment_header(FILE_NAME)),
            ],
            output.xlsx,
        )
            .into_response(),
        Err(e) => {
            log_error(format!("Conversion failed: {}", e));
            html_error(status_for(&e), &e.user_message())
        }
    }
}

/// Upload an export and get the Main List as JSON.
async fn preview(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<PreviewResponse>, (StatusCode, Json<Value>)> {
    let upload = read_upload(multipart)
        .await
        .map_err(|e| (StatusCode::BAD_REQUEST, Json(error_response(&e.to_string()))))?;
    log_upload(&upload);

    let analysis = analyze_bytes(&upload.bytes, upload.file_name.as_deref(), &state.options)
        .map_err(|e| {
            log_error(format!("Conversion failed: {}", e));
            (status_for(&e), Json(convert_error_response(&e)))
        })?;

    Ok(Json(PreviewResponse::from(analysis)))
}

/// `Content-Disposition` with an ASCII fallback and an RFC 5987 UTF-8 name.
fn attachment_header(file_name: &str) -> HeaderValue {
    let ascii: String = file_name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '.' { c } else { '_' })
        .collect();
    let value = format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        ascii,
        percent_encode(file_name)
    );
    HeaderValue::from_str(&value).unwrap_or_else(|_| HeaderValue::from_static("attachment"))
}

fn percent_encode(value: &str) -> String {
    value
        .bytes()
        .map(|b| match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'.' | b'-' | b'_' => (b as char).to_string(),
            _ => format!("%{:02X}", b),
        })
        .collect()
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    const ORDERS: &str = "Статус;Артикул;Количество;Номер отправления\n\
                          Ожидает отгрузки;A;2;S1\n\
                          Ожидает отгрузки;B;1;S1\n";

    fn app() -> Router {
        router(Arc::new(AppState::new(ConvertOptions::default())), 1024 * 1024)
    }

    fn upload(uri: &str, file_name: &str, content: &str) -> Request<Body> {
        let boundary = "mainlist-test-boundary";
        let body = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{f}\"\r\n\
             Content-Type: text/csv\r\n\r\n{c}\r\n--{b}--\r\n",
            b = boundary,
            f = file_name,
            c = content
        );
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={}", boundary))
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_convert_returns_workbook() {
        let response = app().oneshot(upload("/convert", "orders.csv", ORDERS)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], XLSX_MIME);
        assert!(response.headers()[header::CONTENT_DISPOSITION]
            .to_str()
            .unwrap()
            .starts_with("attachment"));

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(body.starts_with(b"PK"));
    }

    #[tokio::test]
    async fn test_convert_missing_columns_is_html_error() {
        let response = app()
            .oneshot(upload("/convert", "orders.csv", "Артикул;Цена\nX1;10\n"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.starts_with("<h3>"));
        assert!(text.contains("Номер отправления"));
    }

    #[tokio::test]
    async fn test_preview_returns_rows() {
        let response = app().oneshot(upload("/api/preview", "orders.csv", ORDERS)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "ready");
        assert_eq!(json["rows"][0]["cells"][0], "Артикул");
        assert_eq!(json["metadata"]["multiArticleShipments"], 1);
    }

    #[tokio::test]
    async fn test_health() {
        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn test_page_shows_configuration() {
        let state = AppState::new(ConvertOptions::default());
        assert!(state.page.contains("Статус: Ожидает отгрузки"));
        assert!(state.page.contains("Лист: Основной список"));
        assert!(!state.page.contains("{{"));
        assert!(state.page.contains("action=\"/convert\""));
    }

    #[test]
    fn test_attachment_header_is_ascii() {
        let value = attachment_header(FILE_NAME);
        let text = value.to_str().unwrap();

        assert!(text.starts_with("attachment; filename=\""));
        assert!(text.contains("filename*=UTF-8''%D0%9E"));
        assert!(text.ends_with("_%D1%81%D0%BF%D0%B8%D1%81%D0%BE%D0%BA.xlsx"));
    }

    #[test]
    fn test_percent_encode() {
        assert_eq!(percent_encode("a b.xlsx"), "a%20b.xlsx");
        assert_eq!(percent_encode("ё"), "%D1%91");
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("<b>\"x\" & y</b>"), "&lt;b&gt;&quot;x&quot; &amp; y&lt;/b&gt;");
    }

    #[test]
    fn test_error_status_codes() {
        let missing = ConvertError::MissingColumns(crate::error::MissingColumns { fields: vec![] });
        assert_eq!(status_for(&missing), StatusCode::BAD_REQUEST);
    }
}
