//! Segment Context - Value Objects

use serde::{Deserialize, Serialize};

/// 音频产物引用
///
/// 存储层中的文件名（不含目录），对领域层不透明
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AudioRef(String);

impl AudioRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AudioRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 合成完成的音频
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedAudio {
    pub audio_ref: AudioRef,
    /// 音频时长（秒）
    pub duration_secs: f64,
}

impl GeneratedAudio {
    pub fn new(audio_ref: AudioRef, duration_secs: f64) -> Self {
        Self {
            audio_ref,
            duration_secs,
        }
    }

    /// 格式化时长为 `m:ss`
    pub fn duration_label(&self) -> String {
        format_duration(self.duration_secs)
    }
}

/// 格式化秒数为 `m:ss`
pub fn format_duration(secs: f64) -> String {
    let whole = if secs.is_finite() && secs > 0.0 {
        secs.floor() as u64
    } else {
        0
    };
    format!("{}:{:02}", whole / 60, whole % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0.0), "0:00");
        assert_eq!(format_duration(5.9), "0:05");
        assert_eq!(format_duration(61.2), "1:01");
        assert_eq!(format_duration(-3.0), "0:00");
    }
}
