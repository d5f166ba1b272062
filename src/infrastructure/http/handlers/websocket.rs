//! WebSocket Handler - 片段事件推送

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use uuid::Uuid;

use crate::application::SegmentEvent;
use crate::infrastructure::http::state::AppState;

/// 可选的订阅过滤条件
#[derive(Debug, Default, Deserialize)]
pub struct EventFilter {
    /// 只接收该 job 的事件
    pub job_id: Option<Uuid>,
}

impl EventFilter {
    fn accepts(&self, event: &SegmentEvent) -> bool {
        let Some(wanted) = self.job_id else {
            return true;
        };
        match event {
            SegmentEvent::SegmentStateChanged { job_id, .. }
            | SegmentEvent::RunFinished { job_id, .. } => *job_id == wanted,
        }
    }
}

/// 事件 WebSocket 连接处理
pub async fn events_websocket_handler(
    ws: WebSocketUpgrade,
    Query(filter): Query<EventFilter>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_events_socket(socket, filter, state))
}

async fn handle_events_socket(socket: WebSocket, filter: EventFilter, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();
    let mut event_rx = state.event_publisher.subscribe();

    tracing::info!(job_id = ?filter.job_id, "Events WebSocket connected");

    // 事件转发任务
    let forward_task = tokio::spawn(async move {
        loop {
            let event = match event_rx.recv().await {
                Ok(event) => event,
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Events WebSocket lagged, events dropped");
                    continue;
                }
                Err(RecvError::Closed) => break,
            };
            if !filter.accepts(&event) {
                continue;
            }

            let msg = match serde_json::to_string(&event) {
                Ok(json) => Message::Text(json),
                Err(e) => {
                    tracing::error!(error = %e, "Failed to serialize event");
                    continue;
                }
            };

            if let Err(e) = sender.send(msg).await {
                tracing::debug!(error = %e, "Failed to send WebSocket message");
                break;
            }
        }
    });

    // 接收客户端消息（心跳）
    let receive_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Close(_)) => {
                    tracing::info!("Events WebSocket closed by client");
                    break;
                }
                Err(e) => {
                    tracing::debug!(error = %e, "Events WebSocket error");
                    break;
                }
                _ => {}
            }
        }
    });

    // 等待任一任务完成
    tokio::select! {
        _ = forward_task => {}
        _ = receive_task => {}
    }

    tracing::info!("Events WebSocket disconnected");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::segment::SegmentStatus;

    #[test]
    fn test_filter_by_job() {
        let job_a = Uuid::new_v4();
        let job_b = Uuid::new_v4();
        let event = SegmentEvent::SegmentStateChanged {
            job_id: job_a,
            index: 0,
            status: SegmentStatus::Generating,
            duration_secs: None,
            error: None,
        };

        assert!(EventFilter::default().accepts(&event));
        assert!(EventFilter { job_id: Some(job_a) }.accepts(&event));
        assert!(!EventFilter { job_id: Some(job_b) }.accepts(&event));
    }
}
