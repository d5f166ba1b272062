//! 请求参数的默认值与解析

use crate::domain::voice::{CredentialPool, VoiceError, VoiceParams};

/// 分段长度策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentLengthPolicy {
    pub default_length: usize,
    pub min_length: usize,
}

impl Default for SegmentLengthPolicy {
    fn default() -> Self {
        Self {
            default_length: 300,
            min_length: 50,
        }
    }
}

impl SegmentLengthPolicy {
    /// 未提供时使用默认值，过小时提升到下限
    pub fn resolve(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or(self.default_length)
            .max(self.min_length)
    }
}

/// 合成请求的服务端默认值
#[derive(Debug, Clone)]
pub struct SynthesisDefaults {
    pub params: VoiceParams,
    /// 配置中的凭证；未配置时请求必须自带
    pub credentials: Option<CredentialPool>,
}

impl SynthesisDefaults {
    pub fn new(params: VoiceParams, credentials: Option<CredentialPool>) -> Self {
        Self {
            params,
            credentials,
        }
    }

    /// 请求携带的凭证单独使用，否则使用配置中的凭证池
    pub fn resolve_credentials(
        &self,
        request_key: Option<&str>,
    ) -> Result<CredentialPool, VoiceError> {
        match request_key.map(str::trim).filter(|k| !k.is_empty()) {
            Some(key) => CredentialPool::single(key),
            None => self.credentials.clone().ok_or(VoiceError::NoCredential),
        }
    }

    pub fn resolve_params(
        &self,
        voice: Option<String>,
        model: Option<String>,
        voice_profile: Option<String>,
    ) -> Result<VoiceParams, VoiceError> {
        VoiceParams::resolve(voice, model, voice_profile, &self.params)
    }
}
