// ==========================================
// 人力资源批量导入 - 重试客户端
// ==========================================
// 职责: 重新提交整个作业或指定行
// 说明:
// - 只选择失败行是调用方的责任，此处不校验
// - 不返回部分成功信息，结果以随后的行查询为准
// - 作业处理中时发起重试的行为由远程约定决定，客户端不加锁
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::domain::{ImportRow, RetryAck};
use crate::repository::ImportGateway;
use std::sync::Arc;

pub struct RetryClient {
    gateway: Arc<dyn ImportGateway>,
}

impl RetryClient {
    pub fn new(gateway: Arc<dyn ImportGateway>) -> Self {
        Self { gateway }
    }

    /// 重试作业
    ///
    /// # 参数
    /// - job_id: 作业 ID
    /// - row_ids: None 或空列表时重试整个作业
    pub async fn retry(&self, job_id: &str, row_ids: Option<&[String]>) -> ApiResult<RetryAck> {
        if job_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("job id is empty".to_string()));
        }

        let row_ids = row_ids.unwrap_or(&[]);
        tracing::info!(job_id, scoped_rows = row_ids.len(), "发起重试");

        self.gateway.retry_job(job_id, row_ids).await.map_err(|e| {
            tracing::warn!(job_id, error = %e, "重试失败");
            ApiError::Retry(e.message())
        })
    }

    /// 重试给定行中的失败行
    pub async fn retry_failed(&self, job_id: &str, rows: &[ImportRow]) -> ApiResult<RetryAck> {
        let failed: Vec<String> = rows
            .iter()
            .filter(|r| r.job_id == job_id && r.is_failed())
            .map(|r| r.id.clone())
            .collect();

        if failed.is_empty() {
            return Err(ApiError::InvalidInput(format!(
                "job {} has no failed rows to retry",
                job_id
            )));
        }
        self.retry(job_id, Some(failed.as_slice())).await
    }
}
