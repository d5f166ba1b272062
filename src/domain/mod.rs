//! Domain Layer - 领域层
//!
//! 包含三个限界上下文:
//! - Segment Context: 片段与状态机
//! - Voice Context: 合成参数与凭证
//! - Audio Context: 音频容器与合并

pub mod audio;
pub mod segment;
pub mod voice;

// 共享的文本分割器
mod text_segmenter;

pub use text_segmenter::segment_text;
