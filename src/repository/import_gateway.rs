// ==========================================
// 人力资源批量导入 - 导入网关 Trait
// ==========================================
// 职责: 定义远程导入边界的四个操作（不包含客户端逻辑）
// 红线: 作业/行状态由网关另一侧驱动，客户端只提交新作业或发起重试
// ==========================================

use crate::domain::{
    ImportJob, ImportMode, ImportRow, JobChange, JobFilter, PageRequest, RetryAck, RowQuery,
    RowRecord, SubmissionAck,
};
use crate::repository::error::GatewayResult;
use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::broadcast;

/// 提交请求（与远程约定的请求体一致）
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubmitRequest {
    pub mode: ImportMode,
    pub rows: Vec<RowRecord>,
    pub tenant_id: String,
    pub dry_run: bool,
    /// 各行的源文件位置；为空时按提交顺序 1..n
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub row_indexes: Vec<u64>,
}

impl SubmitRequest {
    /// 行位置与行数不一致时返回错误描述
    pub fn check_row_indexes(&self) -> Result<(), String> {
        if self.row_indexes.is_empty() || self.row_indexes.len() == self.rows.len() {
            Ok(())
        } else {
            Err(format!(
                "row_indexes has {} entries for {} rows",
                self.row_indexes.len(),
                self.rows.len()
            ))
        }
    }

    /// 第 i 行的源文件位置
    pub fn row_index_at(&self, i: usize) -> u64 {
        self.row_indexes.get(i).copied().unwrap_or(i as u64 + 1)
    }
}

// ==========================================
// ImportGateway Trait
// ==========================================
// 实现者:
// - RpcImportGateway（托管后端，HTTP）
// - LocalImportGateway（内嵌后端，rusqlite）
#[async_trait]
pub trait ImportGateway: Send + Sync {
    /// 提交导入
    ///
    /// # 返回
    /// - Ok(SubmissionAck): 作业已创建（dry_run=false）或校验报告（dry_run=true）
    /// - Err: 远程拒绝或传输失败，消息原样保留
    async fn submit_import(&self, request: SubmitRequest) -> GatewayResult<SubmissionAck>;

    /// 分页查询作业（按创建时间倒序，排序由网关负责）
    async fn list_jobs(&self, filter: &JobFilter, page: PageRequest)
        -> GatewayResult<Vec<ImportJob>>;

    /// 分页查询作业的行（按 row_index 升序）
    ///
    /// # 说明
    /// - 未知 job_id 返回空列表，不是错误
    async fn list_rows(&self, job_id: &str, query: &RowQuery) -> GatewayResult<Vec<ImportRow>>;

    /// 重试作业
    ///
    /// # 参数
    /// - row_ids: 为空时重试整个作业，否则只重试指定行
    async fn retry_job(&self, job_id: &str, row_ids: &[String]) -> GatewayResult<RetryAck>;
}

/// 作业集合变更通知来源
pub trait JobChangeSource: Send + Sync {
    fn subscribe(&self) -> broadcast::Receiver<JobChange>;
}
