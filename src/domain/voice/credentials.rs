//! Voice Context - 凭证池
//!
//! 凭证按配置顺序轮换，每个合成请求持有独立的轮换游标

use super::VoiceError;

/// 日志中展示凭证时保留的前缀长度
const VISIBLE_PREFIX: usize = 5;

/// 有序凭证池（不可为空）
#[derive(Clone, PartialEq, Eq)]
pub struct CredentialPool {
    keys: Vec<String>,
}

impl CredentialPool {
    /// 去除空白并过滤空项
    pub fn new<I, S>(keys: I) -> Result<Self, VoiceError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keys: Vec<String> = keys
            .into_iter()
            .map(|k| k.as_ref().trim().to_string())
            .filter(|k| !k.is_empty())
            .collect();

        if keys.is_empty() {
            return Err(VoiceError::NoCredential);
        }
        Ok(Self { keys })
    }

    /// 解析逗号分隔的凭证列表
    pub fn from_csv(raw: &str) -> Result<Self, VoiceError> {
        Self::new(raw.split(','))
    }

    pub fn single(key: impl AsRef<str>) -> Result<Self, VoiceError> {
        Self::new([key])
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn get(&self, position: usize) -> &str {
        &self.keys[position % self.keys.len()]
    }

    pub fn cursor(&self) -> RotationCursor {
        RotationCursor {
            position: 0,
            len: self.keys.len(),
        }
    }
}

impl std::fmt::Debug for CredentialPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.keys.iter().map(|k| mask_credential(k)))
            .finish()
    }
}

/// 轮换游标，始终落在 `[0, len)` 内
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotationCursor {
    position: usize,
    len: usize,
}

impl RotationCursor {
    pub fn current(&self) -> usize {
        self.position
    }

    pub fn advance(&mut self) -> usize {
        self.position = (self.position + 1) % self.len.max(1);
        self.position
    }
}

/// 凭证脱敏：只保留前 5 个字符
pub fn mask_credential(key: &str) -> String {
    let prefix: String = key.chars().take(VISIBLE_PREFIX).collect();
    format!("{}...", prefix)
}
