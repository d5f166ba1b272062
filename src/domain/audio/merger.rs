//! 无损拼接多个容器

use thiserror::Error;

use super::container::{self, ContainerError};
use super::AudioFormat;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MergeError {
    #[error("没有可合并的音频")]
    NothingToMerge,

    #[error("第 {index} 个音频格式与首个音频不一致")]
    FormatMismatch {
        index: usize,
        expected: AudioFormat,
        found: AudioFormat,
    },

    #[error(transparent)]
    Container(#[from] ContainerError),
}

/// 合并结果
#[derive(Debug, Clone, PartialEq)]
pub struct MergedAudio {
    pub bytes: Vec<u8>,
    pub format: AudioFormat,
    pub payload_len: usize,
}

impl MergedAudio {
    pub fn duration_secs(&self) -> f64 {
        self.format.duration_secs(self.payload_len)
    }
}

/// 按输入顺序拼接采样数据并重新生成头部
///
/// 格式取自第一个输入；其余输入若携带 `fmt ` 块则必须与之一致，
/// 没有 `fmt ` 块的输入按首个格式处理。输出永远是标准双块容器
pub fn merge_containers<B: AsRef<[u8]>>(inputs: &[B]) -> Result<MergedAudio, MergeError> {
    let first = inputs.first().ok_or(MergeError::NothingToMerge)?;
    let format = container::parse_format(first.as_ref());

    let mut payload = Vec::new();
    for (index, input) in inputs.iter().enumerate() {
        let bytes = input.as_ref();
        if index > 0 {
            if let Some(found) = container::find_format(bytes) {
                if found != format {
                    return Err(MergeError::FormatMismatch {
                        index,
                        expected: format,
                        found,
                    });
                }
            }
        }
        payload.extend_from_slice(container::locate_data_chunk(bytes).slice(bytes));
    }

    let payload_len = payload.len();
    let mut bytes = container::build_header(&format, payload_len)?;
    bytes.extend_from_slice(&payload);

    Ok(MergedAudio {
        bytes,
        format,
        payload_len,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::audio::container::tests::container_with_extra_chunk;
    use crate::domain::audio::container::{locate_data_chunk, wrap_pcm};

    #[test]
    fn test_merge_two_segments() {
        let format = AudioFormat::default();
        let a = wrap_pcm(&format, &[0x01, 0x02, 0x03, 0x04]).unwrap();
        let b = wrap_pcm(&format, &[0x05, 0x06, 0x07, 0x08]).unwrap();

        let merged = merge_containers(&[a, b]).unwrap();

        assert_eq!(merged.bytes.len(), 52);
        assert_eq!(&merged.bytes[4..8], &44u32.to_le_bytes());
        assert_eq!(&merged.bytes[40..44], &8u32.to_le_bytes());
        assert_eq!(
            &merged.bytes[44..],
            &[0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08]
        );
        assert_eq!(merged.payload_len, 8);
    }

    #[test]
    fn test_merge_drops_metadata_chunks() {
        let format = AudioFormat::default();
        let a = container_with_extra_chunk(&format, b"LIST", b"meta", &[1, 2]);
        let b = wrap_pcm(&format, &[3, 4]).unwrap();

        let merged = merge_containers(&[a, b]).unwrap();

        assert_eq!(merged.bytes.len(), 48);
        let chunk = locate_data_chunk(&merged.bytes);
        assert_eq!(chunk.offset, 44);
        assert_eq!(chunk.slice(&merged.bytes), &[1, 2, 3, 4]);
    }

    #[test]
    fn test_merge_nothing() {
        let inputs: Vec<Vec<u8>> = Vec::new();
        assert_eq!(merge_containers(&inputs), Err(MergeError::NothingToMerge));
    }

    #[test]
    fn test_merge_rejects_format_mismatch() {
        let a = wrap_pcm(&AudioFormat::default(), &[1, 2]).unwrap();
        let b = wrap_pcm(&AudioFormat::pcm(44_100, 2, 16), &[3, 4]).unwrap();

        let err = merge_containers(&[a, b]).unwrap_err();
        assert!(matches!(err, MergeError::FormatMismatch { index: 1, .. }));
    }

    #[test]
    fn test_merge_accepts_headerless_followers() {
        let a = wrap_pcm(&AudioFormat::pcm(16_000, 1, 16), &[1, 2]).unwrap();
        // 没有 fmt 块的输入使用首个格式
        let mut b = vec![0u8; 44];
        b.extend_from_slice(&[3, 4]);

        let merged = merge_containers(&[a, b]).unwrap();
        assert_eq!(merged.format.sample_rate, 16_000);
        assert_eq!(&merged.bytes[44..], &[1, 2, 3, 4]);
    }
}
