//! Audio Context - 音频容器
//!
//! 职责:
//! - PCM 格式描述
//! - RIFF/WAVE 块解析与标准头生成
//! - 多段音频无损拼接

pub mod container;
mod format;
mod merger;

pub use container::{
    build_header, is_container, locate_data_chunk, parse_format, wrap_pcm, ContainerError,
    DataChunk, CANONICAL_HEADER_LEN,
};
pub use format::AudioFormat;
pub use merger::{merge_containers, MergeError, MergedAudio};
