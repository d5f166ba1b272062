//! RIFF/WAVE 容器编解码
//!
//! 容器结构: 12 字节主头（`RIFF` + 大小 + `WAVE`），随后是一串
//! `{4 字节标签, 4 字节小端长度, 载荷}` 块，载荷按偶数字节对齐。
//!
//! 解析永远不会失败：找不到 `data` 块时按 44 字节标准头处理，
//! 找不到 `fmt ` 块时使用默认格式

use thiserror::Error;

use super::AudioFormat;

/// 主头长度
pub const RIFF_HEADER_LEN: usize = 12;

/// 标准双块容器的头部长度
pub const CANONICAL_HEADER_LEN: usize = 44;

const CHUNK_HEADER_LEN: usize = 8;
const FMT_PAYLOAD_LEN: usize = 16;

const TAG_RIFF: &[u8; 4] = b"RIFF";
const TAG_WAVE: &[u8; 4] = b"WAVE";
const TAG_FMT: &[u8; 4] = b"fmt ";
const TAG_DATA: &[u8; 4] = b"data";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ContainerError {
    #[error("音频数据过大，无法写入容器: {0} 字节")]
    PayloadTooLarge(usize),
}

/// 采样数据在缓冲区中的位置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataChunk {
    pub offset: usize,
    pub length: usize,
}

impl DataChunk {
    /// 截取采样数据；声明长度超出缓冲区时截断到实际末尾
    pub fn slice<'a>(&self, buffer: &'a [u8]) -> &'a [u8] {
        let start = self.offset.min(buffer.len());
        let end = self.offset.saturating_add(self.length).min(buffer.len());
        &buffer[start..end]
    }
}

/// 块头
struct Chunk<'a> {
    tag: &'a [u8],
    payload_offset: usize,
    declared_len: usize,
}

/// 顺序遍历块，遇到截断或溢出时停止
struct Chunks<'a> {
    buffer: &'a [u8],
    cursor: usize,
}

impl<'a> Chunks<'a> {
    fn new(buffer: &'a [u8]) -> Self {
        Self {
            buffer,
            cursor: RIFF_HEADER_LEN,
        }
    }
}

impl<'a> Iterator for Chunks<'a> {
    type Item = Chunk<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let payload_offset = self.cursor.checked_add(CHUNK_HEADER_LEN)?;
        if payload_offset > self.buffer.len() {
            return None;
        }

        let tag = &self.buffer[self.cursor..self.cursor + 4];
        let declared_len = read_u32(self.buffer, self.cursor + 4)? as usize;

        let padded = declared_len.checked_add(declared_len & 1)?;
        self.cursor = payload_offset.checked_add(padded)?;

        Some(Chunk {
            tag,
            payload_offset,
            declared_len,
        })
    }
}

fn read_u16(buffer: &[u8], at: usize) -> Option<u16> {
    let bytes = buffer.get(at..at.checked_add(2)?)?;
    Some(u16::from_le_bytes([bytes[0], bytes[1]]))
}

fn read_u32(buffer: &[u8], at: usize) -> Option<u32> {
    let bytes = buffer.get(at..at.checked_add(4)?)?;
    Some(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

/// 是否以 `RIFF....WAVE` 开头
pub fn is_container(buffer: &[u8]) -> bool {
    buffer.len() >= RIFF_HEADER_LEN && &buffer[0..4] == TAG_RIFF && &buffer[8..12] == TAG_WAVE
}

/// 定位 `data` 块
///
/// 找不到时退化为 `{offset: 44, length: len - 44}`
pub fn locate_data_chunk(buffer: &[u8]) -> DataChunk {
    Chunks::new(buffer)
        .find(|chunk| chunk.tag == TAG_DATA)
        .map(|chunk| DataChunk {
            offset: chunk.payload_offset,
            length: chunk.declared_len,
        })
        .unwrap_or(DataChunk {
            offset: CANONICAL_HEADER_LEN,
            length: buffer.len().saturating_sub(CANONICAL_HEADER_LEN),
        })
}

/// 查找 `fmt ` 块；载荷不足 16 字节视为不存在
pub fn find_format(buffer: &[u8]) -> Option<AudioFormat> {
    let chunk = Chunks::new(buffer).find(|chunk| chunk.tag == TAG_FMT)?;
    if chunk.declared_len < FMT_PAYLOAD_LEN {
        return None;
    }

    let at = chunk.payload_offset;
    Some(AudioFormat {
        encoding: read_u16(buffer, at)?,
        channels: read_u16(buffer, at + 2)?,
        sample_rate: read_u32(buffer, at + 4)?,
        byte_rate: read_u32(buffer, at + 8)?,
        block_align: read_u16(buffer, at + 12)?,
        bits_per_sample: read_u16(buffer, at + 14)?,
    })
}

/// 解析格式，找不到时使用默认格式
pub fn parse_format(buffer: &[u8]) -> AudioFormat {
    find_format(buffer).unwrap_or_default()
}

/// 构造标准 44 字节头部（一个 `fmt ` 块 + 一个 `data` 块）
pub fn build_header(format: &AudioFormat, payload_len: usize) -> Result<Vec<u8>, ContainerError> {
    let data_len =
        u32::try_from(payload_len).map_err(|_| ContainerError::PayloadTooLarge(payload_len))?;
    let riff_len = data_len
        .checked_add((CANONICAL_HEADER_LEN - 8) as u32)
        .ok_or(ContainerError::PayloadTooLarge(payload_len))?;

    let mut header = Vec::with_capacity(CANONICAL_HEADER_LEN);
    header.extend_from_slice(TAG_RIFF);
    header.extend_from_slice(&riff_len.to_le_bytes());
    header.extend_from_slice(TAG_WAVE);

    header.extend_from_slice(TAG_FMT);
    header.extend_from_slice(&(FMT_PAYLOAD_LEN as u32).to_le_bytes());
    header.extend_from_slice(&format.encoding.to_le_bytes());
    header.extend_from_slice(&format.channels.to_le_bytes());
    header.extend_from_slice(&format.sample_rate.to_le_bytes());
    header.extend_from_slice(&format.byte_rate.to_le_bytes());
    header.extend_from_slice(&format.block_align.to_le_bytes());
    header.extend_from_slice(&format.bits_per_sample.to_le_bytes());

    header.extend_from_slice(TAG_DATA);
    header.extend_from_slice(&data_len.to_le_bytes());

    Ok(header)
}

/// 把裸 PCM 数据封装为标准容器
pub fn wrap_pcm(format: &AudioFormat, pcm: &[u8]) -> Result<Vec<u8>, ContainerError> {
    let mut out = build_header(format, pcm.len())?;
    out.extend_from_slice(pcm);
    Ok(out)
}
