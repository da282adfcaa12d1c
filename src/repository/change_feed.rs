// ==========================================
// 人力资源批量导入 - 作业变更广播
// ==========================================
// 基于 tokio::sync::broadcast
// 无订阅者时发送不报错（直接丢弃）
// ==========================================

use crate::domain::JobChange;
use crate::repository::import_gateway::JobChangeSource;
use tokio::sync::broadcast;

/// 默认广播容量
pub const DEFAULT_CHANGE_CAPACITY: usize = 256;

#[derive(Debug, Clone)]
pub struct JobChangeBroadcaster {
    sender: broadcast::Sender<JobChange>,
}

impl JobChangeBroadcaster {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANGE_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// 发布变更
    ///
    /// # 返回
    /// - 收到通知的订阅者数量
    pub fn send(&self, change: JobChange) -> usize {
        tracing::debug!(kind = %change.kind, job_id = %change.job_id, "发布作业变更");
        self.sender.send(change).unwrap_or(0)
    }

    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for JobChangeBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

impl JobChangeSource for JobChangeBroadcaster {
    fn subscribe(&self) -> broadcast::Receiver<JobChange> {
        self.sender.subscribe()
    }
}
