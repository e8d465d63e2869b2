//! REST API for the TSPTW optimizer.
//!
//! Provides endpoints for:
//! - Service identification, health and info
//! - Optimization of a TSPTW instance via external solvers
//! - Swagger UI at /q/swagger-ui

use axum::{
    extract::{rejection::FormRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::OptimizerConfig;
use crate::dto::{HealthResponse, InfoResponse, OptimizeForm, OptimizeRequest, OptimizeResponse};
use crate::error::{RequestError, SolveError};
use crate::solver::{solve, NoResult, SolveOutcome};

/// Plain-text body of `GET /`.
pub const SERVICE_NAME: &str = "optimizer-api";

/// Application state shared across handlers.
pub struct AppState {
    pub config: Arc<OptimizerConfig>,
}

impl AppState {
    pub fn new(config: OptimizerConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }
}

/// Creates the API router with CORS and Swagger UI enabled.
pub fn create_router(config: OptimizerConfig) -> Router {
    let state = Arc::new(AppState::new(config));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/info", get(info))
        .route("/0.1/optimize_tsptw", post(optimize_tsptw))
        // Swagger UI at /q/swagger-ui (Quarkus-style path)
        .merge(SwaggerUi::new("/q/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

// ============================================================================
// Errors
// ============================================================================

/// Failure of an optimize request, rendered at the HTTP boundary.
#[derive(Debug)]
pub enum ApiError {
    /// The solver ran but produced nothing: 500 with an empty body.
    NoResult(NoResult),
    /// Any other failure: 500 with the error text.
    Solve(SolveError),
}

impl From<SolveError> for ApiError {
    fn from(e: SolveError) -> Self {
        ApiError::Solve(e)
    }
}

impl From<RequestError> for ApiError {
    fn from(e: RequestError) -> Self {
        ApiError::Solve(SolveError::Request(e))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::NoResult(reason) => {
                tracing::error!(?reason, "No optim result");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
            ApiError::Solve(e) => {
                tracing::error!("Optimize failed: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
            }
        }
    }
}

// ============================================================================
// Service Info
// ============================================================================

/// GET / - Service identification.
#[utoipa::path(
    get,
    path = "/",
    responses((status = 200, description = "Service name", body = String, content_type = "text/plain"))
)]
async fn index() -> &'static str {
    SERVICE_NAME
}

/// GET /health - Health check endpoint.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is healthy", body = HealthResponse))
)]
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "UP" })
}

/// GET /info - Application info endpoint.
#[utoipa::path(
    get,
    path = "/info",
    responses((status = 200, description = "Application info", body = InfoResponse))
)]
async fn info() -> Json<InfoResponse> {
    Json(InfoResponse {
        name: SERVICE_NAME,
        version: env!("CARGO_PKG_VERSION"),
    })
}

// ============================================================================
// Optimization
// ============================================================================

/// POST /0.1/optimize_tsptw - Solve a TSPTW instance.
///
/// The request is validated before any solver process starts. The solve
/// itself blocks on the solver process, so it runs on the blocking pool.
#[utoipa::path(
    post,
    path = "/0.1/optimize_tsptw",
    request_body(content = OptimizeForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Normalized solver result", body = OptimizeResponse),
        (status = 500, description = "Empty body when the solver produced no result, error text otherwise")
    )
)]
async fn optimize_tsptw(
    State(state): State<Arc<AppState>>,
    form: Result<Form<OptimizeForm>, FormRejection>,
) -> Result<Json<OptimizeResponse>, ApiError> {
    let Form(form) = form.map_err(|e| RequestError::Form(e.body_text()))?;
    let instance = OptimizeRequest::parse(&form.data)?;

    let config = Arc::clone(&state.config);
    let outcome = tokio::task::spawn_blocking(move || solve(&instance, &config))
        .await
        .map_err(|e| SolveError::Task(e.to_string()))??;

    match outcome {
        SolveOutcome::Solved(optim) => Ok(Json(OptimizeResponse::ok(optim))),
        SolveOutcome::NoResult(reason) => Err(ApiError::NoResult(reason)),
    }
}

// ============================================================================
// OpenAPI Documentation
// ============================================================================

#[derive(OpenApi)]
#[openapi(
    paths(index, health, info, optimize_tsptw),
    components(schemas(HealthResponse, InfoResponse, OptimizeForm, OptimizeResponse))
)]
struct ApiDoc;

#[cfg(test)]
mod tests {
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;

    fn form_body(data: &str) -> String {
        let mut out = String::from("data=");
        for b in data.bytes() {
            if b.is_ascii_alphanumeric() {
                out.push(b as char);
            } else {
                out.push_str(&format!("%{:02X}", b));
            }
        }
        out
    }

    fn optimize_request(body: String) -> Request<Body> {
        Request::post("/0.1/optimize_tsptw")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .unwrap()
    }

    async fn read_body(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_index_identifies_service() {
        let app = create_router(OptimizerConfig::default());
        let response = app
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(read_body(response).await, "optimizer-api");
    }

    #[tokio::test]
    async fn test_malformed_request_is_500_with_text() {
        let app = create_router(OptimizerConfig::default());
        let data = json!({ "matrix": [[0, 1]] }).to_string();

        let response = app.oneshot(optimize_request(form_body(&data))).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(read_body(response).await.contains("row 0 has 2 cells, expected 1"));
    }

    #[tokio::test]
    async fn test_missing_data_field_is_500_with_text() {
        let app = create_router(OptimizerConfig::default());

        let response = app.oneshot(optimize_request("other=1".to_string())).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(read_body(response).await.starts_with("malformed request"));
    }

    #[tokio::test]
    async fn test_data_in_query_string_is_not_read() {
        let app = create_router(OptimizerConfig::default());
        let data = form_body(&json!({ "matrix": [[0]] }).to_string());
        let request = Request::post(format!("/0.1/optimize_tsptw?{}", data))
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(read_body(response).await.starts_with("malformed request"));
    }

    #[cfg(unix)]
    mod with_solvers {
        use std::path::Path;

        use tempfile::TempDir;

        use super::*;
        use crate::config::Executables;
        use crate::invoke::test_support::{fake_solver, leftovers};

        fn config(dir: &Path, vroom: &str, or_tools: &str) -> OptimizerConfig {
            OptimizerConfig {
                executables: Executables {
                    vroom: fake_solver(dir, "vroom", vroom),
                    or_tools: fake_solver(dir, "or-tools", or_tools),
                    ..Executables::default()
                },
                tmp_dir: dir.to_path_buf(),
                ..OptimizerConfig::default()
            }
        }

        fn unconstrained_data() -> String {
            json!({
                "capacity": null,
                "matrix": [
                    [[0, 0], [1, 10], [2, 20], [3, 30]],
                    [[1, 10], [0, 0], [1, 10], [2, 20]],
                    [[2, 20], [1, 10], [0, 0], [1, 10]],
                    [[3, 30], [2, 20], [1, 10], [0, 0]]
                ],
                "time_window": [[null, null, 0], [null, null, 0], [null, null, 0], [null, null, 0]],
                "rest_window": []
            })
            .to_string()
        }

        #[tokio::test]
        async fn test_optimize_unconstrained_ok() {
            let dir = TempDir::new().unwrap();
            let app = create_router(config(dir.path(), r#"echo '{"tour":[3,1,4,2]}'"#, "exit 1"));

            let response = app
                .oneshot(optimize_request(form_body(&unconstrained_data())))
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::OK);
            let body: Value = serde_json::from_str(&read_body(response).await).unwrap();
            assert_eq!(body, json!({ "status": "ok", "optim": [0, 2, 1, 3] }));
            assert!(leftovers(dir.path()).is_empty());
        }

        #[tokio::test]
        async fn test_optimize_constrained_ok() {
            let dir = TempDir::new().unwrap();
            let app = create_router(config(dir.path(), "exit 1", r#"printf 'Cost: 12\n0 10\n1 25\n'"#));
            let data = json!({
                "capacity": null,
                "matrix": [[[0, 0], [5, 50]], [[5, 50], [0, 0]]],
                "time_window": [[null, null, 0], [null, 3600, 60]],
                "rest_window": [],
                "optimize_time": 1000
            })
            .to_string();

            let response = app.oneshot(optimize_request(form_body(&data))).await.unwrap();

            assert_eq!(response.status(), StatusCode::OK);
            let body: Value = serde_json::from_str(&read_body(response).await).unwrap();
            assert_eq!(body, json!({ "status": "ok", "optim": [[0, 10], [1, 25]] }));
        }

        #[tokio::test]
        async fn test_solver_exit_one_is_500_empty() {
            let dir = TempDir::new().unwrap();
            let app = create_router(config(dir.path(), "exit 1", "exit 1"));

            let response = app
                .oneshot(optimize_request(form_body(&unconstrained_data())))
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(read_body(response).await, "");
            assert!(leftovers(dir.path()).is_empty());
        }

        #[tokio::test]
        async fn test_malformed_solver_output_is_500_with_text() {
            let dir = TempDir::new().unwrap();
            let app = create_router(config(dir.path(), "echo '{\"tour\": \"x\"}'", "exit 1"));

            let response = app
                .oneshot(optimize_request(form_body(&unconstrained_data())))
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
            assert!(read_body(response).await.contains("malformed solver output"));
            assert!(leftovers(dir.path()).is_empty());
        }
    }
}
