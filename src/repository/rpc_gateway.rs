// ==========================================
// 人力资源批量导入 - 托管后端网关
// ==========================================
// 职责: 通过 HTTP 调用托管后端（Edge Function / PostgREST / RPC）
// 约定:
// - 提交: POST /functions/v1/{submit_function}
// - 作业: GET  /rest/v1/{jobs_table}
// - 行:   GET  /rest/v1/{rows_table}
// - 重试: POST /rest/v1/rpc/{retry_function}
// 红线: 失败不自动重试；远程错误消息原样保留
// ==========================================

use crate::config::BackendSettings;
use crate::domain::{
    ImportJob, ImportRow, JobFilter, PageRequest, RetryAck, RowQuery, SubmissionAck,
};
use crate::repository::error::{GatewayError, GatewayResult};
use crate::repository::import_gateway::{ImportGateway, SubmitRequest};
use crate::repository::wire::{parse_jobs, parse_retry_ack, parse_rows, parse_submission_ack};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde_json::{json, Value};

/// 远程错误体中可能携带消息的字段（按优先级）
const ERROR_MESSAGE_FIELDS: [&str; 5] = ["message", "error", "msg", "error_description", "hint"];

/// 从错误响应体提取消息
///
/// # 规则
/// - JSON 对象: 取第一个非空的消息字段
/// - 其他: 原文（去除首尾空白）
/// - 空响应体: HTTP 状态描述
pub fn extract_error_message(status: u16, body: &str) -> String {
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(body) {
        for field in ERROR_MESSAGE_FIELDS {
            match map.get(field) {
                Some(Value::String(s)) if !s.trim().is_empty() => return s.trim().to_string(),
                Some(Value::Object(inner)) => {
                    if let Some(Value::String(s)) = inner.get("message") {
                        return s.trim().to_string();
                    }
                }
                _ => {}
            }
        }
    }

    let text = body.trim();
    if text.is_empty() {
        format!("HTTP {}", status)
    } else {
        text.to_string()
    }
}

// ==========================================
// RpcImportGateway
// ==========================================
pub struct RpcImportGateway {
    client: Client,
    settings: BackendSettings,
}

impl RpcImportGateway {
    pub fn new(settings: BackendSettings) -> GatewayResult<Self> {
        let client = Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()?;
        Ok(Self { client, settings })
    }

    pub fn settings(&self) -> &BackendSettings {
        &self.settings
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("apikey", &self.settings.anon_key)
            .bearer_auth(self.settings.bearer_token())
    }

    /// 发送请求并读取 JSON 响应（空响应体返回 Null）
    async fn send(&self, operation: &str, builder: RequestBuilder) -> GatewayResult<Value> {
        let response: Response = self.authorized(builder).send().await.map_err(|e| {
            tracing::warn!(operation, error = %e, "远程调用传输失败");
            GatewayError::Transport(e.to_string())
        })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        if !status.is_success() {
            let message = extract_error_message(status.as_u16(), &body);
            tracing::warn!(operation, status = status.as_u16(), message = %message, "远程调用被拒绝");
            return Err(GatewayError::Remote {
                status: status.as_u16(),
                message,
            });
        }

        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&body)?)
    }

    fn page_params(page: PageRequest) -> [(&'static str, String); 2] {
        [
            ("limit", page.limit.to_string()),
            ("offset", page.offset.to_string()),
        ]
    }
}

#[async_trait]
impl ImportGateway for RpcImportGateway {
    async fn submit_import(&self, request: SubmitRequest) -> GatewayResult<SubmissionAck> {
        let url = self
            .settings
            .endpoint(&format!("functions/v1/{}", self.settings.submit_function));
        let submitted_rows = request.rows.len() as u64;
        let dry_run = request.dry_run;

        let body = self
            .send("submit_import", self.client.post(url).json(&request))
            .await?;
        parse_submission_ack(body, dry_run, submitted_rows)
    }

    async fn list_jobs(
        &self,
        filter: &JobFilter,
        page: PageRequest,
    ) -> GatewayResult<Vec<ImportJob>> {
        let url = self
            .settings
            .endpoint(&format!("rest/v1/{}", self.settings.jobs_table));

        let mut query: Vec<(&str, String)> = vec![("select", "*".to_string())];
        if let Some(status) = filter.status {
            query.push(("status", format!("eq.{}", status.as_str())));
        }
        if let Some(mode) = filter.mode {
            query.push(("mode", format!("eq.{}", mode.as_str())));
        }
        query.push(("order", "created_at.desc".to_string()));
        query.extend(Self::page_params(page));

        let body = self
            .send("list_jobs", self.client.get(url).query(&query))
            .await?;
        parse_jobs(body)
    }

    async fn list_rows(&self, job_id: &str, row_query: &RowQuery) -> GatewayResult<Vec<ImportRow>> {
        let url = self
            .settings
            .endpoint(&format!("rest/v1/{}", self.settings.rows_table));

        let mut query: Vec<(&str, String)> = vec![
            ("select", "*".to_string()),
            ("job_id", format!("eq.{}", job_id)),
        ];
        if row_query.only_errors {
            query.push(("error", "not.is.null".to_string()));
        }
        query.push(("order", "row_index.asc".to_string()));
        query.extend(Self::page_params(row_query.page));

        let body = self
            .send("list_rows", self.client.get(url).query(&query))
            .await?;
        parse_rows(job_id, body)
    }

    async fn retry_job(&self, job_id: &str, row_ids: &[String]) -> GatewayResult<RetryAck> {
        let url = self
            .settings
            .endpoint(&format!("rest/v1/rpc/{}", self.settings.retry_function));
        // 空列表表示整个作业
        let payload = json!({
            "p_job_id": job_id,
            "p_row_ids": if row_ids.is_empty() { Value::Null } else { json!(row_ids) },
        });

        let body = self
            .send("retry_job", self.client.post(url).json(&payload))
            .await?;
        parse_retry_ack(body, row_ids.len() as u64)
    }
}
