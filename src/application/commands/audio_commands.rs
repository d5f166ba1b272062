//! Audio Commands - 单段合成与文件合并

use crate::domain::segment::AudioRef;

/// 合成一段文本
#[derive(Debug, Clone, Default)]
pub struct GenerateAudioCommand {
    pub text: String,
    pub voice: Option<String>,
    pub model: Option<String>,
    pub api_key: Option<String>,
    pub voice_profile: Option<String>,
}

/// 合成响应
#[derive(Debug, Clone)]
pub struct GenerateAudioResponse {
    pub audio_ref: AudioRef,
    pub audio_url: String,
    pub duration_secs: f64,
}

/// 按顺序合并已有音频文件
#[derive(Debug, Clone)]
pub struct MergeAudioCommand {
    /// 文件名或 URL
    pub files: Vec<String>,
}

/// 合并响应
#[derive(Debug, Clone)]
pub struct MergeAudioResponse {
    pub audio_ref: AudioRef,
    pub audio_url: String,
    pub merged_count: usize,
    pub skipped: Vec<String>,
    pub duration_secs: f64,
}
