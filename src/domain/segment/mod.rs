//! Segment Context - 片段限界上下文
//!
//! 职责:
//! - 片段实体与状态机（pending / generating / ready / error）
//! - 音频产物引用

mod entities;
mod errors;
mod value_objects;

pub use entities::{segments_from_text, Segment, SegmentStatus};
pub use errors::SegmentError;
pub use value_objects::{format_duration, AudioRef, GeneratedAudio};
