// ==========================================
// 人力资源批量导入 - 导入提交客户端
// ==========================================
// 职责: 将解析后的行连同租户、模式、试运行标志提交到网关
// 红线:
// - 无租户不发起提交
// - 失败不自动重试（重试是显式的用户操作）
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::context::ImportContext;
use crate::domain::{ImportMode, ParsedSheet, RowRecord, SubmissionAck};
use crate::repository::{ImportGateway, SubmitRequest};
use std::sync::Arc;

pub struct ImportSubmissionClient {
    gateway: Arc<dyn ImportGateway>,
}

impl ImportSubmissionClient {
    pub fn new(gateway: Arc<dyn ImportGateway>) -> Self {
        Self { gateway }
    }

    /// 提交导入
    ///
    /// # 参数
    /// - ctx: 导入上下文（提供租户）
    /// - rows: 行记录（顺序即 row_index 顺序）
    /// - mode: 导入模式
    /// - dry_run: true 时只校验，不落库
    ///
    /// # 返回
    /// - Ok(SubmissionAck): 远程确认
    /// - Err(TenantResolution): 无租户，未发起请求
    /// - Err(Submission): 远程拒绝，消息原样
    pub async fn submit(
        &self,
        ctx: &ImportContext,
        rows: Vec<RowRecord>,
        mode: ImportMode,
        dry_run: bool,
    ) -> ApiResult<SubmissionAck> {
        self.send(ctx, rows, Vec::new(), mode, dry_run).await
    }

    /// 提交一个工作表的全部行（携带各行的源文件位置）
    pub async fn submit_sheet(
        &self,
        ctx: &ImportContext,
        sheet: ParsedSheet,
        mode: ImportMode,
        dry_run: bool,
    ) -> ApiResult<SubmissionAck> {
        tracing::debug!(sheet = %sheet.sheet_name, rows = sheet.row_count(), "提交工作表");
        self.send(ctx, sheet.rows, sheet.row_indexes, mode, dry_run).await
    }

    async fn send(
        &self,
        ctx: &ImportContext,
        rows: Vec<RowRecord>,
        row_indexes: Vec<u64>,
        mode: ImportMode,
        dry_run: bool,
    ) -> ApiResult<SubmissionAck> {
        let tenant = ctx.tenant()?;

        if rows.is_empty() {
            return Err(ApiError::InvalidInput("no rows to submit".to_string()));
        }

        let total = rows.len();
        tracing::info!(tenant = %tenant, mode = %mode, dry_run, rows = total, "提交导入");

        let request = SubmitRequest {
            mode,
            rows,
            tenant_id: tenant.as_str().to_string(),
            dry_run,
            row_indexes,
        };
        request.check_row_indexes().map_err(ApiError::InvalidInput)?;

        let ack = self.gateway.submit_import(request).await.map_err(|e| {
            tracing::warn!(tenant = %tenant, mode = %mode, error = %e, "导入提交失败");
            ApiError::Submission(e.message())
        })?;

        tracing::info!(
            job_id = ack.job_id.as_deref().unwrap_or("-"),
            dry_run = ack.dry_run,
            row_errors = ack.row_errors.len(),
            "导入提交已确认"
        );
        Ok(ack)
    }
}
