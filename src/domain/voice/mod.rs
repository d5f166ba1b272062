//! Voice Context - 音色限界上下文
//!
//! 职责:
//! - 合成参数（音色、模型、风格描述）
//! - API 凭证池与轮换

mod credentials;
mod errors;
mod value_objects;

pub use credentials::{mask_credential, CredentialPool, RotationCursor};
pub use errors::VoiceError;
pub use value_objects::{VoiceParams, DEFAULT_MODEL, DEFAULT_VOICE};
