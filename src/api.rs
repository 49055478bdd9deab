//! HTTP surface for filesum.
//!
//! This module exposes a compact Axum router:
//!
//! - `POST /v1/files` – Upload a `.docx`, `.pptx` or `.pdf` as the multipart field `file`.
//!   Returns `201` with `{ "file_id", "file_name", "file_summary" }`.
//! - `GET /v1/files` – List every stored `file_id`.
//! - `GET /v1/files/:file_id` – Fetch one file record.
//! - `GET /metrics` – Upload counters.
//! - `GET /commands` – Machine-readable command catalog for quick discovery by tools.
//!
//! The `/v1/files` endpoints take `username` and `password` as query parameters. Failures are
//! answered with a status code and a JSON body `{ "detail": "<message>" }`.

use crate::auth::Credentials;
use crate::service::{FileApi, FileRecord, ServiceError, UploadRequest};
use axum::{
    Json, Router, async_trait,
    extract::{
        DefaultBodyLimit, FromRequestParts, Multipart, Path, Query, State,
        multipart::{MultipartError, MultipartRejection},
    },
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Serialize;
use serde_json::json;
use std::convert::Infallible;
use std::sync::Arc;

/// Multipart field carrying the uploaded document.
const FILE_FIELD: &str = "file";

/// Build the HTTP router exposing the file API surface.
///
/// `max_upload_bytes` caps the request body accepted by the upload route.
pub fn create_router<S>(service: Arc<S>, max_upload_bytes: usize) -> Router
where
    S: FileApi + 'static,
{
    Router::new()
        .route("/v1/files", get(list_files::<S>).post(upload_file::<S>))
        .route("/v1/files/:file_id", get(get_file::<S>))
        .route("/metrics", get(get_metrics::<S>))
        .route("/commands", get(get_commands))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(service)
}

/// Credentials are read from the query string once per request. Missing values stay empty and
/// fail verification in the service.
#[async_trait]
impl<S> FromRequestParts<S> for Credentials
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let credentials = Query::<Credentials>::from_request_parts(parts, state)
            .await
            .map(|Query(credentials)| credentials)
            .unwrap_or_default();
        Ok(credentials)
    }
}

/// Upload a document, extract its text, summarize it and store the record.
///
/// Credentials are checked before the body is read.
async fn upload_file<S>(
    State(service): State<Arc<S>>,
    credentials: Credentials,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<FileRecord>), AppError>
where
    S: FileApi,
{
    service.authorize_upload(&credentials)?;
    let mut multipart = multipart?;

    let mut upload = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let content = field.bytes().await?.to_vec();
        upload = Some(UploadRequest { file_name, content });
        break;
    }
    let request = upload.ok_or_else(|| AppError::BadRequest("No file uploaded".into()))?;

    let record = service.upload(&credentials, request).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// List the ids of every stored file.
async fn list_files<S>(
    State(service): State<Arc<S>>,
    credentials: Credentials,
) -> Result<Json<Vec<String>>, AppError>
where
    S: FileApi,
{
    let ids = service.list_file_ids(&credentials).await?;
    Ok(Json(ids))
}

/// Fetch a single file record.
async fn get_file<S>(
    State(service): State<Arc<S>>,
    Path(file_id): Path<String>,
    credentials: Credentials,
) -> Result<Json<FileRecord>, AppError>
where
    S: FileApi,
{
    let record = service.get_file_record(&credentials, &file_id).await?;
    Ok(Json(record))
}

/// Return the upload counters.
async fn get_metrics<S>(State(service): State<Arc<S>>) -> Json<crate::metrics::MetricsSnapshot>
where
    S: FileApi,
{
    Json(service.metrics_snapshot())
}

/// Descriptor for a single command in the discovery catalog.
#[derive(Serialize)]
struct CommandDescriptor {
    name: &'static str,
    method: &'static str,
    path: &'static str,
    description: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    request_example: Option<serde_json::Value>,
}

/// Response body for `GET /commands`.
#[derive(Serialize)]
struct CommandsResponse {
    commands: Vec<CommandDescriptor>,
}

/// Enumerate supported HTTP commands for discovery in hosts and tools.
async fn get_commands() -> Json<CommandsResponse> {
    Json(CommandsResponse {
        commands: vec![
            CommandDescriptor {
                name: "upload_file",
                method: "POST",
                path: "/v1/files?username=<user>&password=<password>",
                description: "Upload a .docx, .pptx or .pdf as multipart field `file`. Response returns { \"file_id\", \"file_name\", \"file_summary\" }.",
                request_example: None,
            },
            CommandDescriptor {
                name: "list_files",
                method: "GET",
                path: "/v1/files?username=<user>&password=<password>",
                description: "Return the ids of every stored file as a JSON array.",
                request_example: None,
            },
            CommandDescriptor {
                name: "get_file",
                method: "GET",
                path: "/v1/files/{file_id}?username=<user>&password=<password>",
                description: "Return the stored record for one file, or 404.",
                request_example: Some(json!({
                    "file_id": "2f1c8f0e-6c1e-4b7e-9a55-3f0f1d8f2c11",
                    "file_name": "report.pdf",
                    "file_summary": "Three line summary."
                })),
            },
            CommandDescriptor {
                name: "metrics",
                method: "GET",
                path: "/metrics",
                description: "Return upload counters useful for observability dashboards.",
                request_example: None,
            },
        ],
    })
}

enum AppError {
    Service(ServiceError),
    BadRequest(String),
    Multipart(MultipartError),
    NotMultipart(MultipartRejection),
}

impl AppError {
    fn status_and_detail(&self) -> (StatusCode, String) {
        match self {
            Self::Service(error) => match error {
                ServiceError::Unauthorized => {
                    (StatusCode::UNAUTHORIZED, "Invalid credentials".into())
                }
                ServiceError::InvalidFileType(_) => {
                    (StatusCode::BAD_REQUEST, "Invalid file type".into())
                }
                ServiceError::UnsupportedFormat(_) => {
                    (StatusCode::BAD_REQUEST, "Unsupported file type".into())
                }
                ServiceError::DuplicateFile(_) => {
                    (StatusCode::BAD_REQUEST, "File already uploaded".into())
                }
                ServiceError::NotFound(_) => (StatusCode::NOT_FOUND, "File not found".into()),
                ServiceError::SummarizationFailed(_) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Error summarizing text".into(),
                ),
                ServiceError::Processing(_) | ServiceError::Storage(_) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Error processing file".into(),
                ),
            },
            Self::BadRequest(message) => (StatusCode::BAD_REQUEST, message.clone()),
            Self::Multipart(error) => (error.status(), error.body_text()),
            Self::NotMultipart(rejection) => (rejection.status(), rejection.body_text()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, detail) = self.status_and_detail();
        if status.is_server_error()
            && let Self::Service(error) = &self
        {
            tracing::error!(error = %error, "Request failed");
        }
        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

impl From<ServiceError> for AppError {
    fn from(inner: ServiceError) -> Self {
        Self::Service(inner)
    }
}

impl From<MultipartError> for AppError {
    fn from(inner: MultipartError) -> Self {
        Self::Multipart(inner)
    }
}

impl From<MultipartRejection> for AppError {
    fn from(inner: MultipartRejection) -> Self {
        Self::NotMultipart(inner)
    }
}

#[cfg(test)]
mod tests {
    use super::{AppError, create_router, get_commands};
    use crate::auth::Credentials;
    use crate::metrics::MetricsSnapshot;
    use crate::service::{FileApi, FileRecord, ServiceError, UploadRequest};
    use crate::store::StoreError;
    use crate::summarization::SummarizationClientError;
    use async_trait::async_trait;
    use axum::{
        body::{Body, to_bytes},
        http::{Method, Request, StatusCode},
    };
    use std::sync::Arc;
    use tokio::sync::Mutex;
    use tower::ServiceExt;

    const BOUNDARY: &str = "filesum-test-boundary";

    #[tokio::test]
    async fn commands_catalog_exposes_upload_endpoint() {
        let response = get_commands().await;
        let commands = response.0.commands;
        let upload = commands
            .iter()
            .find(|cmd| cmd.name == "upload_file")
            .expect("upload command present");

        assert_eq!(upload.method, "POST");
        assert!(upload.path.starts_with("/v1/files"));
        assert!(commands.len() >= 3);
    }

    #[tokio::test]
    async fn upload_route_passes_file_and_query_credentials() {
        let service = Arc::new(StubFileService::default());
        let app = create_router(service.clone(), 1024 * 1024);

        let response = app
            .oneshot(multipart_request(
                "/v1/files?username=user&password=password",
                "file",
                "report.pdf",
                b"%PDF-bytes",
            ))
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::CREATED);
        let json = body_json(response).await;
        assert_eq!(json["file_name"], "report.pdf");
        assert_eq!(json["file_id"], "stub-id");
        assert_eq!(json["file_summary"], "stub summary");

        let calls = service.uploads.lock().await.clone();
        assert_eq!(calls.len(), 1);
        let (credentials, request) = &calls[0];
        assert_eq!(credentials, &Credentials::new("user", "password"));
        assert_eq!(request.file_name, "report.pdf");
        assert_eq!(request.content, b"%PDF-bytes");
    }

    #[tokio::test]
    async fn upload_without_file_field_is_a_bad_request() {
        let service = Arc::new(StubFileService::default());
        let app = create_router(service.clone(), 1024 * 1024);

        let response = app
            .oneshot(multipart_request(
                "/v1/files?username=user&password=password",
                "attachment",
                "report.pdf",
                b"%PDF-bytes",
            ))
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["detail"], "No file uploaded");
        assert!(service.uploads.lock().await.is_empty());
    }

    #[tokio::test]
    async fn wrong_credentials_win_over_a_missing_file_field() {
        let service = Arc::new(StubFileService::default());
        let app = create_router(service.clone(), 1024 * 1024);

        let response = app
            .oneshot(multipart_request(
                "/v1/files?username=user&password=guess",
                "attachment",
                "report.pdf",
                b"%PDF-bytes",
            ))
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await["detail"], "Invalid credentials");
        assert!(service.uploads.lock().await.is_empty());
    }

    #[tokio::test]
    async fn wrong_credentials_win_over_a_non_multipart_body() {
        let app = create_router(Arc::new(StubFileService::default()), 1024 * 1024);

        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/v1/files?username=user&password=guess")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await["detail"], "Invalid credentials");
    }

    #[tokio::test]
    async fn non_multipart_upload_gets_a_json_error() {
        let app = create_router(Arc::new(StubFileService::default()), 1024 * 1024);

        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/v1/files?username=user&password=password")
                    .header("content-type", "application/json")
                    .body(Body::from("{}"))
                    .expect("request"),
            )
            .await
            .expect("router response");

        assert!(response.status().is_client_error());
        let json = body_json(response).await;
        let detail = json["detail"].as_str().unwrap_or_default();
        assert!(!detail.is_empty());
    }

    #[tokio::test]
    async fn missing_credentials_reach_the_service_empty() {
        let service = Arc::new(StubFileService::default());
        let app = create_router(service.clone(), 1024 * 1024);

        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::GET)
                    .uri("/v1/files")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await["detail"], "Invalid credentials");
    }

    #[tokio::test]
    async fn list_route_returns_id_array() {
        let service = Arc::new(StubFileService::default());
        let app = create_router(service, 1024 * 1024);

        let response = app
            .oneshot(get_request("/v1/files?username=user&password=password"))
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, serde_json::json!(["stub-id"]));
    }

    #[tokio::test]
    async fn get_route_maps_missing_records_to_404() {
        let service = Arc::new(StubFileService::default());
        let app = create_router(service, 1024 * 1024);

        let response = app
            .clone()
            .oneshot(get_request(
                "/v1/files/stub-id?username=user&password=password",
            ))
            .await
            .expect("router response");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["file_name"], "report.pdf");

        let response = app
            .oneshot(get_request(
                "/v1/files/other?username=user&password=password",
            ))
            .await
            .expect("router response");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["detail"], "File not found");
    }

    #[tokio::test]
    async fn oversized_uploads_are_refused() {
        let service = Arc::new(StubFileService::default());
        let app = create_router(service.clone(), 64);

        let response = app
            .oneshot(multipart_request(
                "/v1/files?username=user&password=password",
                "file",
                "big.pdf",
                &[b'x'; 4096],
            ))
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert!(service.uploads.lock().await.is_empty());
    }

    #[tokio::test]
    async fn metrics_route_reports_snapshot() {
        let app = create_router(Arc::new(StubFileService::default()), 1024);

        let response = app
            .oneshot(get_request("/metrics"))
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["files_uploaded"], 7);
    }

    #[test]
    fn service_errors_map_to_status_codes() {
        let summarizer_down = SummarizationClientError::GenerationFailed("500".into());
        let cases = [
            (
                ServiceError::Unauthorized,
                StatusCode::UNAUTHORIZED,
                "Invalid credentials",
            ),
            (
                ServiceError::InvalidFileType("a.txt".into()),
                StatusCode::BAD_REQUEST,
                "Invalid file type",
            ),
            (
                ServiceError::UnsupportedFormat("a.txt".into()),
                StatusCode::BAD_REQUEST,
                "Unsupported file type",
            ),
            (
                ServiceError::DuplicateFile("a.pdf".into()),
                StatusCode::BAD_REQUEST,
                "File already uploaded",
            ),
            (
                ServiceError::NotFound("id".into()),
                StatusCode::NOT_FOUND,
                "File not found",
            ),
            (
                ServiceError::SummarizationFailed(summarizer_down),
                StatusCode::INTERNAL_SERVER_ERROR,
                "Error summarizing text",
            ),
            (
                ServiceError::Processing("bad xml".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
                "Error processing file",
            ),
            (
                ServiceError::Storage(StoreError::Task("cancelled".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
                "Error processing file",
            ),
        ];
        for (error, status, detail) in cases {
            let (actual_status, actual_detail) = AppError::from(error).status_and_detail();
            assert_eq!(actual_status, status);
            assert_eq!(actual_detail, detail);
        }
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder()
            .method(Method::GET)
            .uri(uri)
            .body(Body::empty())
            .expect("request")
    }

    fn multipart_request(
        uri: &str,
        field: &str,
        file_name: &str,
        content: &[u8],
    ) -> Request<Body> {
        let mut body = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
        )
        .into_bytes();
        body.extend_from_slice(content);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .expect("request")
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        serde_json::from_slice(&body).expect("json body")
    }

    /// Accepts `user`/`password` and knows a single record, `stub-id`.
    #[derive(Default)]
    struct StubFileService {
        uploads: Mutex<Vec<(Credentials, UploadRequest)>>,
    }

    impl StubFileService {
        fn check(credentials: &Credentials) -> Result<(), ServiceError> {
            if credentials == &Credentials::new("user", "password") {
                Ok(())
            } else {
                Err(ServiceError::Unauthorized)
            }
        }

        fn record() -> FileRecord {
            FileRecord {
                file_id: "stub-id".into(),
                file_name: "report.pdf".into(),
                file_summary: "stub summary".into(),
            }
        }
    }

    #[async_trait]
    impl FileApi for StubFileService {
        fn authorize_upload(&self, credentials: &Credentials) -> Result<(), ServiceError> {
            Self::check(credentials)
        }

        async fn upload(
            &self,
            credentials: &Credentials,
            request: UploadRequest,
        ) -> Result<FileRecord, ServiceError> {
            Self::check(credentials)?;
            let record = FileRecord {
                file_name: request.file_name.clone(),
                ..Self::record()
            };
            self.uploads
                .lock()
                .await
                .push((credentials.clone(), request));
            Ok(record)
        }

        async fn list_file_ids(
            &self,
            credentials: &Credentials,
        ) -> Result<Vec<String>, ServiceError> {
            Self::check(credentials)?;
            Ok(vec!["stub-id".into()])
        }

        async fn get_file_record(
            &self,
            credentials: &Credentials,
            file_id: &str,
        ) -> Result<FileRecord, ServiceError> {
            Self::check(credentials)?;
            if file_id == "stub-id" {
                Ok(Self::record())
            } else {
                Err(ServiceError::NotFound(file_id.into()))
            }
        }

        fn metrics_snapshot(&self) -> MetricsSnapshot {
            MetricsSnapshot {
                files_uploaded: 7,
                ..MetricsSnapshot::default()
            }
        }
    }
}
