//! 音频格式描述

use serde::{Deserialize, Serialize};

/// 线性 PCM 的编码标识
pub const PCM_ENCODING: u16 = 1;

const DEFAULT_SAMPLE_RATE: u32 = 24_000;
const DEFAULT_CHANNELS: u16 = 1;
const DEFAULT_BITS_PER_SAMPLE: u16 = 16;

/// 音频格式描述符（对应容器中 `fmt ` 块的 16 字节载荷）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioFormat {
    pub encoding: u16,
    pub channels: u16,
    pub sample_rate: u32,
    pub byte_rate: u32,
    pub block_align: u16,
    pub bits_per_sample: u16,
}

impl AudioFormat {
    /// 由采样参数推导出完整的 PCM 描述符
    pub fn pcm(sample_rate: u32, channels: u16, bits_per_sample: u16) -> Self {
        let block_align = channels.saturating_mul(bits_per_sample / 8);
        Self {
            encoding: PCM_ENCODING,
            channels,
            sample_rate,
            byte_rate: sample_rate.saturating_mul(u32::from(block_align)),
            block_align,
            bits_per_sample,
        }
    }

    /// 从 MIME 类型中解析采样率，例如 `audio/L16;codec=pcm;rate=24000`
    ///
    /// 只识别 `rate=`，其余参数沿用默认的单声道 16 位
    pub fn from_mime_type(mime_type: &str) -> Self {
        let sample_rate = mime_type
            .split(';')
            .filter_map(|param| param.trim().strip_prefix("rate="))
            .find_map(|rate| rate.trim().parse::<u32>().ok())
            .filter(|rate| *rate > 0)
            .unwrap_or(DEFAULT_SAMPLE_RATE);

        Self::pcm(sample_rate, DEFAULT_CHANNELS, DEFAULT_BITS_PER_SAMPLE)
    }

    /// 给定字节数的播放时长（秒）
    pub fn duration_secs(&self, payload_len: usize) -> f64 {
        if self.byte_rate == 0 {
            return 0.0;
        }
        payload_len as f64 / f64::from(self.byte_rate)
    }
}

impl Default for AudioFormat {
    /// 单声道 24000Hz 16 位 PCM
    fn default() -> Self {
        Self::pcm(DEFAULT_SAMPLE_RATE, DEFAULT_CHANNELS, DEFAULT_BITS_PER_SAMPLE)
    }
}
