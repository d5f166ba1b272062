//! Segment Context - Entities

use serde::{Deserialize, Serialize};

use super::{GeneratedAudio, SegmentError};
use crate::domain::text_segmenter::segment_text;

/// 片段状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentStatus {
    /// 等待合成
    Pending,
    /// 正在合成
    Generating,
    /// 合成完成
    Ready,
    /// 合成失败
    Error,
}

impl SegmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SegmentStatus::Pending => "pending",
            SegmentStatus::Generating => "generating",
            SegmentStatus::Ready => "ready",
            SegmentStatus::Error => "error",
        }
    }
}

impl std::fmt::Display for SegmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 文本片段 - 最小合成单位
///
/// 不变量:
/// - index 创建后不可变，决定播放与合并顺序
/// - content 不可为空且不可变
/// - 当且仅当状态为 Ready 时持有音频
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    index: usize,
    content: String,
    status: SegmentStatus,
    audio: Option<GeneratedAudio>,
    /// 最近一次失败的用户可读信息（仅 Error 状态）
    last_error: Option<String>,
}

impl Segment {
    pub fn new(index: usize, content: impl Into<String>) -> Result<Self, SegmentError> {
        let content = content.into();
        if content.is_empty() {
            return Err(SegmentError::EmptyContent(index));
        }
        Ok(Self {
            index,
            content,
            status: SegmentStatus::Pending,
            audio: None,
            last_error: None,
        })
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn status(&self) -> SegmentStatus {
        self.status
    }

    pub fn audio(&self) -> Option<&GeneratedAudio> {
        self.audio.as_ref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn is_ready(&self) -> bool {
        self.status == SegmentStatus::Ready
    }

    /// 调度器领取：Pending → Generating
    pub fn claim(&mut self) -> Result<(), SegmentError> {
        self.expect(SegmentStatus::Pending, "claim")?;
        self.status = SegmentStatus::Generating;
        Ok(())
    }

    /// 单片段重试：任意非 Generating 状态 → Generating
    ///
    /// 已完成的片段会丢弃旧音频重新合成
    pub fn begin_retry(&mut self) -> Result<(), SegmentError> {
        if self.status == SegmentStatus::Generating {
            return Err(self.invalid("retry"));
        }
        self.status = SegmentStatus::Generating;
        self.audio = None;
        self.last_error = None;
        Ok(())
    }

    /// Generating → Ready
    pub fn complete(&mut self, audio: GeneratedAudio) -> Result<(), SegmentError> {
        self.expect(SegmentStatus::Generating, "complete")?;
        self.status = SegmentStatus::Ready;
        self.audio = Some(audio);
        self.last_error = None;
        Ok(())
    }

    /// Generating → Error
    pub fn fail(&mut self, message: impl Into<String>) -> Result<(), SegmentError> {
        self.expect(SegmentStatus::Generating, "fail")?;
        self.status = SegmentStatus::Error;
        self.last_error = Some(message.into());
        Ok(())
    }

    /// 取消回滚：Generating → Pending
    pub fn roll_back(&mut self) -> Result<(), SegmentError> {
        self.expect(SegmentStatus::Generating, "roll back")?;
        self.status = SegmentStatus::Pending;
        Ok(())
    }

    /// Error → Pending，返回是否发生变更
    pub fn reset_error(&mut self) -> bool {
        if self.status != SegmentStatus::Error {
            return false;
        }
        self.status = SegmentStatus::Pending;
        self.last_error = None;
        true
    }

    fn expect(&self, status: SegmentStatus, action: &'static str) -> Result<(), SegmentError> {
        if self.status == status {
            Ok(())
        } else {
            Err(self.invalid(action))
        }
    }

    fn invalid(&self, action: &'static str) -> SegmentError {
        SegmentError::InvalidTransition {
            index: self.index,
            from: self.status,
            action,
        }
    }
}

/// 从原始文本批量创建片段（全部为 Pending）
pub fn segments_from_text(text: &str, max_length: usize) -> Vec<Segment> {
    segment_text(text, max_length)
        .into_iter()
        .enumerate()
        .filter_map(|(index, content)| Segment::new(index, content).ok())
        .collect()
}
