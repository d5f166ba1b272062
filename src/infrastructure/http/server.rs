//! HTTP Server
//!
//! Axum HTTP 服务器启动和配置

use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::Router;
use http::header::{AUTHORIZATION, CONTENT_TYPE};
use http::{HeaderValue, Method};
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

use super::middleware::error_logging_middleware;
use super::routes::create_routes;
use super::state::AppState;

/// 服务器配置
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// JSON 请求体上限（字节）
    pub body_limit_bytes: usize,
    /// 允许跨域的 Origin 主机名（任意端口）
    pub allowed_origin_hosts: Vec<String>,
    /// 产物目录及其对外路径
    pub uploads_dir: PathBuf,
    pub public_path: String,
    /// 可选的静态网页目录及其挂载路径
    pub static_dir: Option<PathBuf>,
    pub static_path: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5678,
            body_limit_bytes: 5 * 1024 * 1024,
            allowed_origin_hosts: vec!["localhost".to_string(), "127.0.0.1".to_string()],
            uploads_dir: PathBuf::from("public/uploads"),
            public_path: "/uploads".to_string(),
            static_dir: None,
            static_path: "/".to_string(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// 取出 Origin 中的主机名，例如 `http://localhost:3000` -> `localhost`
fn origin_host(origin: &str) -> Option<&str> {
    let (_, rest) = origin.split_once("://")?;
    let authority = rest.split('/').next()?;
    let host = match authority.strip_prefix('[') {
        Some(v6) => v6.split(']').next()?,
        None => authority.split(':').next()?,
    };
    (!host.is_empty()).then_some(host)
}

fn cors_layer(allowed_hosts: &[String]) -> CorsLayer {
    let allowed: Vec<String> = allowed_hosts.iter().map(|h| h.to_ascii_lowercase()).collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(
            move |origin: &HeaderValue, _parts: &http::request::Parts| {
                origin
                    .to_str()
                    .ok()
                    .and_then(origin_host)
                    .is_some_and(|host| allowed.iter().any(|a| a.eq_ignore_ascii_case(host)))
            },
        ))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
        .max_age(std::time::Duration::from_secs(3600))
}

/// 构建完整 Router
pub fn build_router(config: &ServerConfig, state: Arc<AppState>) -> Router {
    let public_path = format!("/{}", config.public_path.trim_matches('/'));

    let mut router = create_routes().nest_service(&public_path, ServeDir::new(&config.uploads_dir));
    if let Some(dir) = &config.static_dir {
        let mount = config.static_path.trim_matches('/');
        router = if mount.is_empty() {
            router.fallback_service(ServeDir::new(dir))
        } else {
            router.nest_service(&format!("/{}", mount), ServeDir::new(dir))
        };
    }

    router
        .layer(DefaultBodyLimit::max(config.body_limit_bytes))
        .layer(middleware::from_fn(error_logging_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&config.allowed_origin_hosts))
        .with_state(state)
}

/// HTTP 服务器
pub struct HttpServer {
    config: ServerConfig,
    state: Arc<AppState>,
}

impl HttpServer {
    /// 创建新的 HTTP 服务器
    pub fn new(config: ServerConfig, state: AppState) -> Self {
        Self {
            config,
            state: Arc::new(state),
        }
    }

    /// 启动服务器（带优雅关闭）
    pub async fn run_with_shutdown<F>(self, shutdown_signal: F) -> Result<(), std::io::Error>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let router = build_router(&self.config, self.state.clone());
        let addr = self.config.addr();

        info!("Starting HTTP server on {} (with graceful shutdown)", addr);

        let listener = TcpListener::bind(&addr).await?;
        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal)
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::SpeechApiPort;
    use crate::application::services::{
        ArtifactGenerator, GenerationScheduler, RetryPolicy, SegmentLengthPolicy, SynthesisClient,
        SynthesisDefaults,
    };
    use crate::domain::voice::{CredentialPool, VoiceParams};
    use crate::infrastructure::adapters::{FakeTtsClient, FakeTtsClientConfig, FileArtifactStorage};
    use crate::infrastructure::events::EventPublisher;
    use crate::infrastructure::memory::InMemoryJobRegistry;
    use crate::infrastructure::worker::{GenerationWorker, GenerationWorkerConfig};
    use axum::body::Body;
    use http::{Request, StatusCode};
    use serde_json::{json, Value};
    use std::time::Duration;
    use tempfile::TempDir;
    use tokio::sync::mpsc;
    use tower::util::ServiceExt;

    struct TestApp {
        _dir: TempDir,
        router: Router,
    }

    async fn test_app(credentials: Option<CredentialPool>) -> TestApp {
        let dir = tempfile::tempdir().unwrap();
        let storage = Arc::new(FileArtifactStorage::new(dir.path(), "/uploads").await.unwrap());
        let api: Arc<dyn SpeechApiPort> = Arc::new(FakeTtsClient::new(FakeTtsClientConfig {
            latency: Duration::ZERO,
            millis_per_char: 10,
            ..Default::default()
        }));
        let renderer = Arc::new(ArtifactGenerator::new(
            SynthesisClient::new(api, RetryPolicy::default()),
            storage.clone(),
        ));
        let events = EventPublisher::new().arc();
        let (tx, rx) = mpsc::channel(16);
        let registry = InMemoryJobRegistry::new(tx).arc();

        let worker = GenerationWorker::new(
            GenerationWorkerConfig::default(),
            rx,
            registry.clone(),
            Arc::new(GenerationScheduler::new(renderer.clone(), 2)),
            events.clone(),
        );
        tokio::spawn(worker.run());

        let state = AppState::new(
            renderer,
            storage,
            registry,
            events,
            Arc::new(SynthesisDefaults::new(VoiceParams::default(), credentials)),
            SegmentLengthPolicy::default(),
        );
        let config = ServerConfig {
            uploads_dir: dir.path().to_path_buf(),
            ..Default::default()
        };

        TestApp {
            router: build_router(&config, Arc::new(state)),
            _dir: dir,
        }
    }

    async fn post_json(router: &Router, uri: &str, body: Value) -> Value {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = router.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn pool() -> Option<CredentialPool> {
        Some(CredentialPool::single("test-key").unwrap())
    }

    #[test]
    fn test_origin_host() {
        assert_eq!(origin_host("http://localhost:3000"), Some("localhost"));
        assert_eq!(origin_host("https://127.0.0.1"), Some("127.0.0.1"));
        assert_eq!(origin_host("http://[::1]:8080"), Some("::1"));
        assert_eq!(origin_host("null"), None);
    }

    #[tokio::test]
    async fn test_ping() {
        let app = test_app(pool()).await;
        let request = Request::builder()
            .uri("/api/ping")
            .body(Body::empty())
            .unwrap();

        let response = app.router.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_cors_only_for_allowed_hosts() {
        let app = test_app(pool()).await;
        let request = |origin: &str| {
            Request::builder()
                .uri("/api/ping")
                .header("origin", origin)
                .body(Body::empty())
                .unwrap()
        };

        let allowed = app
            .router
            .clone()
            .oneshot(request("http://localhost:5173"))
            .await
            .unwrap();
        assert_eq!(
            allowed.headers().get("access-control-allow-origin").unwrap(),
            "http://localhost:5173"
        );

        let denied = app
            .router
            .clone()
            .oneshot(request("http://evil.example.com"))
            .await
            .unwrap();
        assert!(denied.headers().get("access-control-allow-origin").is_none());
    }

    #[tokio::test]
    async fn test_generate_then_serve_artifact() {
        let app = test_app(pool()).await;
        let body = post_json(&app.router, "/api/generate", json!({ "text": "你好，世界。" })).await;

        assert_eq!(body["errno"], 0);
        let url = body["data"]["audio_url"].as_str().unwrap().to_string();
        assert!(url.starts_with("/uploads/tts_"));
        assert_eq!(body["data"]["duration"], "0:00");

        let response = app
            .router
            .clone()
            .oneshot(Request::builder().uri(&url).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&bytes[0..4], b"RIFF");
    }

    #[tokio::test]
    async fn test_generate_without_credentials() {
        let app = test_app(None).await;
        let body = post_json(&app.router, "/api/generate", json!({ "text": "hi" })).await;

        assert_eq!(body["errno"], 400);
        assert_eq!(body["error"], "No API Key provided");

        let body = post_json(
            &app.router,
            "/api/generate",
            json!({ "text": "hi", "apiKey": "request-key" }),
        )
        .await;
        assert_eq!(body["errno"], 0);
    }

    #[tokio::test]
    async fn test_merge_endpoint() {
        let app = test_app(pool()).await;
        let first = post_json(&app.router, "/api/generate", json!({ "text": "第一段。" })).await;
        let second = post_json(&app.router, "/api/generate", json!({ "text": "第二段。" })).await;

        let body = post_json(
            &app.router,
            "/api/merge",
            json!({
                "files": [
                    first["data"]["audio_url"],
                    second["data"]["audio_ref"],
                    "missing.wav"
                ]
            }),
        )
        .await;

        assert_eq!(body["errno"], 0);
        assert_eq!(body["data"]["merged_count"], 2);
        assert_eq!(body["data"]["skipped"], json!(["missing.wav"]));
        assert!(body["data"]["url"].as_str().unwrap().starts_with("/uploads/merged_"));

        let empty = post_json(&app.router, "/api/merge", json!({ "files": [] })).await;
        assert_eq!(empty["errno"], 400);
    }

    #[tokio::test]
    async fn test_segment_preview() {
        let app = test_app(pool()).await;
        let text = format!("{}\n{}", "甲".repeat(45), "乙".repeat(45));
        let body = post_json(
            &app.router,
            "/api/segment",
            json!({ "text": text, "segment_length": 10 }),
        )
        .await;

        assert_eq!(body["errno"], 0);
        assert_eq!(body["data"]["segment_length"], 50);
        assert_eq!(body["data"]["total"], 2);
    }

    #[tokio::test]
    async fn test_job_flow() {
        let app = test_app(pool()).await;
        let text = format!("{}\n{}\n{}", "甲".repeat(40), "乙".repeat(40), "丙".repeat(40));

        let started = post_json(
            &app.router,
            "/api/job/start",
            json!({ "text": text, "segment_length": 50 }),
        )
        .await;
        assert_eq!(started["errno"], 0);
        assert_eq!(started["data"]["total_segments"], 3);
        let job_id = started["data"]["job_id"].clone();

        let mut status = Value::Null;
        for _ in 0..100 {
            status = post_json(&app.router, "/api/job/status", json!({ "job_id": job_id })).await;
            if status["data"]["ready"] == 3 && status["data"]["running"] == false {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert_eq!(status["data"]["ready"], 3);
        assert_eq!(status["data"]["segments"][0]["status"], "ready");

        let merged = post_json(&app.router, "/api/job/merge", json!({ "job_id": job_id })).await;
        assert_eq!(merged["errno"], 0);
        assert_eq!(merged["data"]["merged_count"], 3);

        let retry = post_json(
            &app.router,
            "/api/job/retry",
            json!({ "job_id": job_id, "index": 7 }),
        )
        .await;
        assert_eq!(retry["errno"], 400);

        let closed = post_json(&app.router, "/api/job/close", json!({ "job_id": job_id })).await;
        assert_eq!(closed["errno"], 0);

        let gone = post_json(&app.router, "/api/job/status", json!({ "job_id": job_id })).await;
        assert_eq!(gone["errno"], 404);
    }
}
