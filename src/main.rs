//! Narrator - 长文本语音合成服务
//!
//! 启动流程：加载配置 -> 初始化日志 -> 组装适配器与处理器 -> 启动 Worker 与 HTTP 服务

use std::sync::Arc;
use std::time::Duration;

use narrator::application::ports::SpeechApiPort;
use narrator::application::services::{
    ArtifactGenerator, GenerationScheduler, RetryPolicy, SegmentLengthPolicy, SynthesisClient,
    SynthesisDefaults,
};
use narrator::config::{load_config, print_config, AppConfig, TtsProvider};
use narrator::domain::voice::{CredentialPool, VoiceParams};
use narrator::infrastructure::adapters::{
    FakeTtsClient, FileArtifactStorage, GeminiTtsClient, GeminiTtsClientConfig,
};
use narrator::infrastructure::events::EventPublisher;
use narrator::infrastructure::http::{AppState, HttpServer, ServerConfig};
use narrator::infrastructure::memory::InMemoryJobRegistry;
use narrator::infrastructure::worker::{GenerationWorker, GenerationWorkerConfig};
use tokio::sync::mpsc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置（优先级：环境变量 > 配置文件 > 默认值）
    let config = load_config().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    // 初始化日志，RUST_LOG 优先
    let log_filter = format!(
        "{},narrator={},tower_http=debug",
        config.log.level, config.log.level
    );
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_filter)),
        )
        .init();

    tracing::info!("Narrator - 长文本语音合成服务");
    print_config(&config);

    // 存储
    let storage = Arc::new(
        FileArtifactStorage::new(&config.storage.uploads_dir, &config.storage.public_path).await?,
    );

    // 语音合成
    let speech_api = create_speech_api(&config)?;
    let retry_policy = RetryPolicy {
        attempt_timeout: Duration::from_secs(config.tts.timeout_secs),
        backoff: Duration::from_millis(config.tts.backoff_ms),
        min_attempts: config.tts.min_attempts,
        retry_permanent_errors: config.tts.retry_permanent_errors,
    };
    let renderer = Arc::new(ArtifactGenerator::new(
        SynthesisClient::new(speech_api, retry_policy),
        storage.clone(),
    ));

    // 默认参数与凭证
    let params = VoiceParams {
        voice: config.tts.default_voice.clone(),
        model: config.tts.default_model.clone(),
        voice_profile: None,
    };
    params.validate()?;
    let credentials = CredentialPool::new(config.tts.effective_api_keys()).ok();
    if credentials.is_none() {
        tracing::warn!("No server-side API key configured, requests must carry apiKey");
    }
    let defaults = Arc::new(SynthesisDefaults::new(params, credentials));
    let length_policy = SegmentLengthPolicy {
        default_length: config.generation.segment_length,
        min_length: config.generation.min_segment_length,
    };

    // 事件与工作队列
    let event_publisher = EventPublisher::new().arc();
    let (work_tx, work_rx) = mpsc::channel(config.generation.queue_capacity);
    let registry = InMemoryJobRegistry::new(work_tx).arc();

    let scheduler = Arc::new(GenerationScheduler::new(
        renderer.clone(),
        config.generation.concurrency,
    ));
    let worker = GenerationWorker::new(
        GenerationWorkerConfig::default(),
        work_rx,
        registry.clone(),
        scheduler,
        event_publisher.clone(),
    );
    tokio::spawn(worker.run());

    // HTTP 服务器
    let state = AppState::new(
        renderer,
        storage,
        registry,
        event_publisher,
        defaults,
        length_policy,
    );
    let server = HttpServer::new(server_config(&config), state);

    server
        .run_with_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for ctrl-c");
                std::future::pending::<()>().await;
            }
            tracing::info!("Received shutdown signal");
        })
        .await?;

    tracing::info!("Server shutdown complete");

    Ok(())
}

fn create_speech_api(config: &AppConfig) -> anyhow::Result<Arc<dyn SpeechApiPort>> {
    match config.tts.provider {
        TtsProvider::Gemini => {
            let client_config = GeminiTtsClientConfig::new(&config.tts.base_url)
                .with_timeout(config.tts.timeout_secs)
                .with_proxy(config.tts.proxy.clone());
            Ok(Arc::new(GeminiTtsClient::new(client_config)?))
        }
        TtsProvider::Fake => {
            tracing::warn!("Using fake TTS provider, generated audio is silence");
            Ok(Arc::new(FakeTtsClient::with_defaults()))
        }
    }
}

fn server_config(config: &AppConfig) -> ServerConfig {
    let static_files = &config.server.static_files;
    ServerConfig {
        host: config.server.host.clone(),
        port: config.server.port,
        body_limit_bytes: config.server.body_limit_bytes,
        allowed_origin_hosts: config.server.allowed_origin_hosts.clone(),
        uploads_dir: config.storage.uploads_dir.clone(),
        public_path: config.storage.public_path.clone(),
        static_dir: static_files.enabled.then(|| static_files.dir.clone()),
        static_path: static_files.path.clone(),
    }
}
