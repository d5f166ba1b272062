//! Synthesis Client - 带重试与凭证轮换的合成调用
//!
//! 策略:
//! - 最多 `max(2 × 凭证数, min_attempts)` 次尝试
//! - 配额耗尽：切换到下一个凭证立即重试（只有一个凭证时退避后重试同一个）
//! - 其他可重试失败（网络、超时、5xx）：固定退避后重试，不切换凭证
//! - 凭证级拒绝（Key 无效、权限不足）：切换凭证，全部被拒后失败
//! - 请求级拒绝（参数错误、模型不存在）、无音频、内容拦截：立即失败
//! - 取消：立即返回 `Cancelled`，不计入失败

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::application::ports::{SpeechApiPort, SpeechAudio, SpeechRequest, SynthesisError};
use crate::domain::voice::{mask_credential, CredentialPool};

/// 重试策略
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// 单次尝试超时
    pub attempt_timeout: Duration,
    /// 非配额失败后的退避间隔
    pub backoff: Duration,
    /// 最少尝试次数
    pub min_attempts: usize,
    /// 是否把服务端明确拒绝的请求也当作可重试错误
    pub retry_permanent_errors: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempt_timeout: Duration::from_secs(120),
            backoff: Duration::from_secs(1),
            min_attempts: 5,
            retry_permanent_errors: false,
        }
    }
}

impl RetryPolicy {
    pub fn max_attempts(&self, credential_count: usize) -> usize {
        (2 * credential_count).max(self.min_attempts).max(1)
    }
}

/// 失败后的下一步
enum NextStep {
    /// 切换凭证立即重试
    Rotate,
    /// 退避后重试
    Backoff,
    /// 放弃
    Abort,
}

/// 合成客户端
#[derive(Clone)]
pub struct SynthesisClient {
    api: Arc<dyn SpeechApiPort>,
    policy: RetryPolicy,
}

impl SynthesisClient {
    pub fn new(api: Arc<dyn SpeechApiPort>, policy: RetryPolicy) -> Self {
        Self { api, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// 合成一段文本
    ///
    /// 每次调用持有独立的轮换游标，并发调用之间互不影响
    pub async fn synthesize(
        &self,
        request: &SpeechRequest,
        credentials: &CredentialPool,
        cancel: &CancellationToken,
    ) -> Result<SpeechAudio, SynthesisError> {
        let max_attempts = self.policy.max_attempts(credentials.len());
        let mut cursor = credentials.cursor();
        let mut rejected = vec![false; credentials.len()];
        let mut last_error = SynthesisError::NoCredential;

        for attempt in 1..=max_attempts {
            if cancel.is_cancelled() {
                return Err(SynthesisError::Cancelled);
            }

            let credential = credentials.get(cursor.current());
            tracing::debug!(
                attempt,
                max_attempts,
                credential = %mask_credential(credential),
                "Synthesis attempt"
            );

            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(SynthesisError::Cancelled),
                result = tokio::time::timeout(
                    self.policy.attempt_timeout,
                    self.api.synthesize_once(request, credential),
                ) => result.unwrap_or(Err(SynthesisError::Timeout)),
            };

            let err = match outcome {
                Ok(audio) => {
                    if attempt > 1 {
                        tracing::info!(attempt, "Synthesis succeeded after retry");
                    }
                    return Ok(audio);
                }
                Err(SynthesisError::Cancelled) => return Err(SynthesisError::Cancelled),
                Err(err) => err,
            };

            let step = self.classify(&err, credentials.len(), cursor.current(), &mut rejected);
            tracing::warn!(
                attempt,
                max_attempts,
                credential = %mask_credential(credential),
                error = %err,
                "Synthesis attempt failed"
            );
            last_error = err;

            match step {
                NextStep::Abort => return Err(last_error),
                NextStep::Rotate => {
                    // 跳过已被拒绝的凭证
                    for _ in 0..credentials.len() {
                        cursor.advance();
                        if !rejected[cursor.current()] {
                            break;
                        }
                    }
                }
                NextStep::Backoff => {
                    if attempt < max_attempts {
                        tokio::select! {
                            biased;
                            _ = cancel.cancelled() => return Err(SynthesisError::Cancelled),
                            _ = tokio::time::sleep(self.policy.backoff) => {}
                        }
                    }
                }
            }
        }

        tracing::error!(max_attempts, error = %last_error, "Synthesis attempts exhausted");
        Err(last_error)
    }

    fn classify(
        &self,
        err: &SynthesisError,
        credential_count: usize,
        position: usize,
        rejected: &mut [bool],
    ) -> NextStep {
        match err {
            SynthesisError::QuotaExceeded(_) if credential_count > 1 => NextStep::Rotate,
            SynthesisError::NoAudioReturned
            | SynthesisError::ContentFiltered(_)
            | SynthesisError::NoCredential => NextStep::Abort,
            SynthesisError::Rejected { .. } if self.policy.retry_permanent_errors => {
                NextStep::Backoff
            }
            SynthesisError::Rejected { kind, .. } if kind.is_credential_scoped() => {
                rejected[position] = true;
                if rejected.iter().all(|r| *r) {
                    NextStep::Abort
                } else {
                    NextStep::Rotate
                }
            }
            SynthesisError::Rejected { .. } => NextStep::Abort,
            _ => NextStep::Backoff,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::RejectionKind;
    use crate::domain::audio::AudioFormat;
    use crate::domain::voice::VoiceParams;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// 按脚本返回结果，并记录每次使用的凭证
    struct ScriptedApi {
        script: Mutex<VecDeque<Result<(), SynthesisError>>>,
        calls: Mutex<Vec<String>>,
        delay: Duration,
    }

    impl ScriptedApi {
        fn new(script: Vec<Result<(), SynthesisError>>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                calls: Mutex::new(Vec::new()),
                delay: Duration::ZERO,
            }
        }

        fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl SpeechApiPort for ScriptedApi {
        async fn synthesize_once(
            &self,
            _request: &SpeechRequest,
            credential: &str,
        ) -> Result<SpeechAudio, SynthesisError> {
            self.calls.lock().unwrap().push(credential.to_string());
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            let next = self.script.lock().unwrap().pop_front().unwrap_or(Ok(()));
            next.map(|_| SpeechAudio {
                bytes: vec![0; 48],
                format: AudioFormat::default(),
            })
        }
    }

    fn quota() -> Result<(), SynthesisError> {
        Err(SynthesisError::QuotaExceeded("RESOURCE_EXHAUSTED".into()))
    }

    fn network() -> Result<(), SynthesisError> {
        Err(SynthesisError::Network("connection reset".into()))
    }

    fn rejected(kind: RejectionKind) -> Result<(), SynthesisError> {
        Err(SynthesisError::Rejected {
            kind,
            status: 400,
            message: "rejected".into(),
        })
    }

    fn request() -> SpeechRequest {
        SpeechRequest::new("你好", VoiceParams::default())
    }

    fn client(api: Arc<ScriptedApi>) -> SynthesisClient {
        SynthesisClient::new(api, RetryPolicy::default())
    }

    #[tokio::test(start_paused = true)]
    async fn test_quota_rotates_without_delay() {
        let api = Arc::new(ScriptedApi::new(vec![quota(), quota()]));
        let pool = CredentialPool::new(["k1", "k2", "k3"]).unwrap();

        let started = tokio::time::Instant::now();
        let result = client(api.clone())
            .synthesize(&request(), &pool, &CancellationToken::new())
            .await;

        assert!(result.is_ok());
        assert_eq!(api.calls(), vec!["k1", "k2", "k3"]);
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_credential_retries_quota_until_budget() {
        let api = Arc::new(ScriptedApi::new(vec![quota(); 10]));
        let pool = CredentialPool::single("only").unwrap();

        let result = client(api.clone())
            .synthesize(&request(), &pool, &CancellationToken::new())
            .await;

        assert!(matches!(result, Err(SynthesisError::QuotaExceeded(_))));
        assert_eq!(api.calls(), vec!["only"; 5]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_attempt_budget_scales_with_pool() {
        let api = Arc::new(ScriptedApi::new(vec![network(); 20]));
        let pool = CredentialPool::new(["a", "b", "c", "d"]).unwrap();

        let started = tokio::time::Instant::now();
        let result = client(api.clone())
            .synthesize(&request(), &pool, &CancellationToken::new())
            .await;

        assert!(matches!(result, Err(SynthesisError::Network(_))));
        // 8 次尝试，不切换凭证，7 次退避
        assert_eq!(api.calls(), vec!["a"; 8]);
        assert_eq!(started.elapsed(), Duration::from_secs(7));
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_failure_then_success() {
        let api = Arc::new(ScriptedApi::new(vec![network()]));
        let pool = CredentialPool::new(["a", "b"]).unwrap();

        let started = tokio::time::Instant::now();
        let result = client(api.clone())
            .synthesize(&request(), &pool, &CancellationToken::new())
            .await;

        assert!(result.is_ok());
        assert_eq!(api.calls(), vec!["a", "a"]);
        assert_eq!(started.elapsed(), Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_attempt_timeout_is_retried() {
        let api = Arc::new(ScriptedApi::new(vec![]).with_delay(Duration::from_secs(200)));
        let pool = CredentialPool::single("k").unwrap();

        let result = client(api.clone())
            .synthesize(&request(), &pool, &CancellationToken::new())
            .await;

        assert_eq!(result.unwrap_err(), SynthesisError::Timeout);
        assert_eq!(api.calls().len(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_aborts_in_flight_attempt() {
        let api = Arc::new(ScriptedApi::new(vec![]).with_delay(Duration::from_secs(60)));
        let pool = CredentialPool::single("k").unwrap();
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            trigger.cancel();
        });

        let result = client(api.clone()).synthesize(&request(), &pool, &cancel).await;

        assert_eq!(result.unwrap_err(), SynthesisError::Cancelled);
        assert_eq!(api.calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_audio_is_not_retried() {
        let api = Arc::new(ScriptedApi::new(vec![Err(SynthesisError::NoAudioReturned)]));
        let pool = CredentialPool::new(["a", "b"]).unwrap();

        let result = client(api.clone())
            .synthesize(&request(), &pool, &CancellationToken::new())
            .await;

        assert_eq!(result.unwrap_err(), SynthesisError::NoAudioReturned);
        assert_eq!(api.calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_bad_request_fails_fast() {
        let api = Arc::new(ScriptedApi::new(vec![rejected(RejectionKind::BadRequest)]));
        let pool = CredentialPool::new(["a", "b"]).unwrap();

        let result = client(api.clone())
            .synthesize(&request(), &pool, &CancellationToken::new())
            .await;

        assert!(matches!(result, Err(SynthesisError::Rejected { .. })));
        assert_eq!(api.calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_credential_moves_to_next_key() {
        let api = Arc::new(ScriptedApi::new(vec![
            rejected(RejectionKind::InvalidCredential),
            quota(),
            rejected(RejectionKind::InvalidCredential),
        ]));
        let pool = CredentialPool::new(["bad1", "good", "bad2"]).unwrap();

        let result = client(api.clone())
            .synthesize(&request(), &pool, &CancellationToken::new())
            .await;

        // bad1 被拒 → good 配额耗尽 → bad2 被拒 → 跳过 bad1 回到 good
        assert!(result.is_ok());
        assert_eq!(api.calls(), vec!["bad1", "good", "bad2", "good"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_all_credentials_rejected() {
        let api = Arc::new(ScriptedApi::new(vec![
            rejected(RejectionKind::PermissionDenied),
            rejected(RejectionKind::InvalidCredential),
        ]));
        let pool = CredentialPool::new(["a", "b"]).unwrap();

        let result = client(api.clone())
            .synthesize(&request(), &pool, &CancellationToken::new())
            .await;

        assert!(matches!(
            result,
            Err(SynthesisError::Rejected {
                kind: RejectionKind::InvalidCredential,
                ..
            })
        ));
        assert_eq!(api.calls(), vec!["a", "b"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_permanent_errors_retried_when_enabled() {
        let api = Arc::new(ScriptedApi::new(vec![rejected(RejectionKind::BadRequest); 10]));
        let pool = CredentialPool::single("k").unwrap();
        let policy = RetryPolicy {
            retry_permanent_errors: true,
            ..RetryPolicy::default()
        };

        let result = SynthesisClient::new(api.clone(), policy)
            .synthesize(&request(), &pool, &CancellationToken::new())
            .await;

        assert!(result.is_err());
        assert_eq!(api.calls().len(), 5);
    }
}
