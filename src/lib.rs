//! Narrator - 长文本语音合成服务
//!
//! 架构设计: DDD + CQRS + Hexagonal Architecture
//!
//! 领域层 (domain/):
//! - 文本分段、片段状态机
//! - 合成参数与凭证池
//! - 音频容器编解码与合并
//!
//! 应用层 (application/):
//! - Ports: SpeechApi, ArtifactStorage, SegmentEvent, JobRegistry
//! - Services: 重试/轮换、并发调度、产物生成与合并
//! - Commands / Queries: CQRS 处理器
//!
//! 基础设施层 (infrastructure/):
//! - HTTP: RESTful API + WebSocket
//! - Adapters: Gemini TTS Client, 文件存储
//! - Memory: JobRegistry 内存实现
//! - Worker: GenerationWorker 后台调度
//! - Events: WebSocket 事件发布

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::{load_config, AppConfig};
