//! Generation Job - 一组片段及其运行控制
//!
//! 每个 job 同时最多有一次调度运行。运行的取消信号在提交运行时准备好，
//! 因此运行还在队列中时的 stop 同样生效；关闭 job 会取消当前及之后的所有运行

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::SegmentBoard;
use crate::application::ports::SegmentEventPort;
use crate::domain::segment::Segment;
use crate::domain::voice::{CredentialPool, VoiceParams};

pub struct GenerationJob {
    id: Uuid,
    board: SegmentBoard,
    params: VoiceParams,
    credentials: CredentialPool,
    created_at: DateTime<Utc>,
    /// job 生命周期信号，关闭时触发
    lifetime: CancellationToken,
    /// 已提交（排队或进行中）运行的取消信号
    run_token: Mutex<CancellationToken>,
    running: AtomicBool,
}

impl GenerationJob {
    pub fn new(
        segments: Vec<Segment>,
        params: VoiceParams,
        credentials: CredentialPool,
        events: Arc<dyn SegmentEventPort>,
    ) -> Self {
        let id = Uuid::new_v4();
        let lifetime = CancellationToken::new();
        Self {
            id,
            board: SegmentBoard::new(id, segments, events),
            params,
            credentials,
            created_at: Utc::now(),
            run_token: Mutex::new(lifetime.child_token()),
            lifetime,
            running: AtomicBool::new(false),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn board(&self) -> &SegmentBoard {
        &self.board
    }

    pub fn params(&self) -> &VoiceParams {
        &self.params
    }

    pub fn credentials(&self) -> &CredentialPool {
        &self.credentials
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn is_closed(&self) -> bool {
        self.lifetime.is_cancelled()
    }

    /// 为即将提交的运行准备新的取消信号，之前的 stop 不再影响它
    pub fn prepare_run(&self) {
        let token = self.lifetime.child_token();
        *self.run_token.lock().unwrap_or_else(PoisonError::into_inner) = token;
    }

    /// 开始一次运行，返回提交时准备的取消信号
    ///
    /// 已有运行在进行或 job 已关闭时返回 None；
    /// 运行开始前已被 stop 的信号原样返回，调度会立即结束
    pub fn begin_run(&self) -> Option<CancellationToken> {
        if self.is_closed() {
            return None;
        }
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return None;
        }

        Some(
            self.run_token
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone(),
        )
    }

    pub fn finish_run(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// 取消已提交的运行（排队中或进行中），返回是否有运行在进行
    pub fn stop(&self) -> bool {
        self.run_token
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .cancel();
        self.is_running()
    }

    /// 单片段重试使用的取消信号：随 job 关闭而取消，不受 stop 影响
    pub fn retry_token(&self) -> CancellationToken {
        self.lifetime.child_token()
    }

    /// 关闭 job，取消所有运行与重试
    pub fn close(&self) {
        self.lifetime.cancel();
    }
}
