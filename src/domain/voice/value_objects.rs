//! Voice Context - Value Objects

use serde::{Deserialize, Serialize};

use super::VoiceError;

pub const DEFAULT_VOICE: &str = "Puck";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-preview-tts";

/// 未提供音色描述时使用的朗读指令
const DEFAULT_INSTRUCTION: &str = "Please read the following text exactly as it is written. \
Do not generate any conversational response. \
Maintain a consistent, steady narrator voice throughout.";

/// 合成参数
///
/// 一次生成任务内所有片段共享同一组参数
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceParams {
    /// 预置音色名
    pub voice: String,
    /// 模型标识
    pub model: String,
    /// 自由文本的音色/风格描述，会作为前缀拼入提示词
    pub voice_profile: Option<String>,
}

impl Default for VoiceParams {
    fn default() -> Self {
        Self {
            voice: DEFAULT_VOICE.to_string(),
            model: DEFAULT_MODEL.to_string(),
            voice_profile: None,
        }
    }
}

impl VoiceParams {
    /// 以默认值补全可选字段；空白字符串视为未提供
    pub fn resolve(
        voice: Option<String>,
        model: Option<String>,
        voice_profile: Option<String>,
        defaults: &VoiceParams,
    ) -> Result<Self, VoiceError> {
        let non_blank = |value: Option<String>| {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let params = Self {
            voice: non_blank(voice).unwrap_or_else(|| defaults.voice.clone()),
            model: non_blank(model).unwrap_or_else(|| defaults.model.clone()),
            voice_profile: non_blank(voice_profile),
        };
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<(), VoiceError> {
        if self.voice.trim().is_empty() {
            return Err(VoiceError::InvalidParams("音色名称不能为空".to_string()));
        }
        // 模型名会被拼入请求路径
        if self.model.trim().is_empty() || self.model.contains(['/', '?', '#']) {
            return Err(VoiceError::InvalidParams(format!(
                "无效的模型名称: {}",
                self.model
            )));
        }
        Ok(())
    }

    /// 构造发送给模型的提示词
    pub fn prompt_for(&self, text: &str) -> String {
        match &self.voice_profile {
            Some(profile) => format!("{}\n\n{}", profile, text),
            None => format!("{}\n\n{}", DEFAULT_INSTRUCTION, text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_falls_back_to_defaults() {
        let params =
            VoiceParams::resolve(None, Some("  ".into()), None, &VoiceParams::default()).unwrap();
        assert_eq!(params.voice, DEFAULT_VOICE);
        assert_eq!(params.model, DEFAULT_MODEL);
        assert!(params.voice_profile.is_none());
    }

    #[test]
    fn test_resolve_rejects_model_with_path_chars() {
        let result = VoiceParams::resolve(
            None,
            Some("../models/x".into()),
            None,
            &VoiceParams::default(),
        );
        assert!(matches!(result, Err(VoiceError::InvalidParams(_))));
    }

    #[test]
    fn test_prompt_uses_profile_prefix() {
        let params = VoiceParams {
            voice_profile: Some("低沉的男声".into()),
            ..Default::default()
        };
        assert_eq!(params.prompt_for("你好"), "低沉的男声\n\n你好");
    }

    #[test]
    fn test_prompt_default_instruction() {
        let prompt = VoiceParams::default().prompt_for("Hello");
        assert!(prompt.starts_with("Please read the following text exactly as it is written."));
        assert!(prompt.ends_with("throughout.\n\nHello"));
    }
}
