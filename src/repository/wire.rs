// ==========================================
// 人力资源批量导入 - 远程数据边界校验
// ==========================================
// 远程返回先反序列化为 Wire 结构，再经 TryFrom 校验
// 未通过校验的数据不会被当作 ImportJob / ImportRow 使用
// ==========================================

use crate::domain::{
    ImportJob, ImportMode, ImportRow, JobStatus, RetryAck, RowOutcome, RowRecord, SubmissionAck,
};
use crate::repository::error::{GatewayError, GatewayResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// ID 兼容字符串与数字
fn id_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {}",
            other
        ))),
    }
}

fn non_negative(field: &str, value: i64) -> GatewayResult<u64> {
    u64::try_from(value)
        .map_err(|_| GatewayError::Schema(format!("{} must be non-negative, got {}", field, value)))
}

// ==========================================
// 作业
// ==========================================
#[derive(Debug, Clone, Deserialize)]
pub struct WireImportJob {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    pub mode: String,
    pub status: String,
    #[serde(default)]
    pub total_rows: i64,
    #[serde(default)]
    pub processed_rows: i64,
    #[serde(default)]
    pub success_rows: i64,
    #[serde(default)]
    pub failed_rows: i64,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub finished_at: Option<DateTime<Utc>>,
}

impl TryFrom<WireImportJob> for ImportJob {
    type Error = GatewayError;

    fn try_from(wire: WireImportJob) -> Result<Self, Self::Error> {
        let mode = ImportMode::parse(&wire.mode)
            .ok_or_else(|| GatewayError::Schema(format!("unknown import mode '{}'", wire.mode)))?;
        let status = JobStatus::parse(&wire.status)
            .ok_or_else(|| GatewayError::Schema(format!("unknown job status '{}'", wire.status)))?;

        let job = ImportJob {
            id: wire.id,
            mode,
            status,
            total_rows: non_negative("total_rows", wire.total_rows)?,
            processed_rows: non_negative("processed_rows", wire.processed_rows)?,
            success_rows: non_negative("success_rows", wire.success_rows)?,
            failed_rows: non_negative("failed_rows", wire.failed_rows)?,
            created_at: wire.created_at,
            finished_at: wire.finished_at,
        };
        job.validate().map_err(GatewayError::Schema)?;
        Ok(job)
    }
}

// ==========================================
// 行
// ==========================================
#[derive(Debug, Clone, Deserialize)]
pub struct WireImportRow {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(deserialize_with = "id_string")]
    pub job_id: String,
    pub row_index: i64,
    pub raw: Value,
    #[serde(default)]
    pub normalized: Option<Value>,
    #[serde(default)]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
}

fn as_record(field: &str, value: Value) -> GatewayResult<RowRecord> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(GatewayError::Schema(format!(
            "{} must be an object, got {}",
            field, other
        ))),
    }
}

impl TryFrom<WireImportRow> for ImportRow {
    type Error = GatewayError;

    fn try_from(wire: WireImportRow) -> Result<Self, Self::Error> {
        let normalized = match wire.normalized {
            None | Some(Value::Null) => None,
            Some(v) => Some(as_record("normalized", v)?),
        };

        Ok(ImportRow {
            id: wire.id,
            job_id: wire.job_id,
            row_index: non_negative("row_index", wire.row_index)?,
            raw: as_record("raw", wire.raw)?,
            normalized,
            // 空字符串不算错误
            error: wire.error.filter(|e| !e.trim().is_empty()),
            created_at: wire.created_at,
        })
    }
}

/// 解析作业数组
pub fn parse_jobs(body: Value) -> GatewayResult<Vec<ImportJob>> {
    let wires: Vec<WireImportJob> = serde_json::from_value(body)?;
    wires.into_iter().map(ImportJob::try_from).collect()
}

/// 解析行数组，并确认全部属于请求的作业
pub fn parse_rows(job_id: &str, body: Value) -> GatewayResult<Vec<ImportRow>> {
    let wires: Vec<WireImportRow> = serde_json::from_value(body)?;
    let rows = wires
        .into_iter()
        .map(ImportRow::try_from)
        .collect::<GatewayResult<Vec<_>>>()?;

    if let Some(stray) = rows.iter().find(|r| r.job_id != job_id) {
        return Err(GatewayError::Schema(format!(
            "row {} belongs to job {}, expected {}",
            stray.id, stray.job_id, job_id
        )));
    }
    Ok(rows)
}

// ==========================================
// 确认
// ==========================================

fn job_id_field(map: &serde_json::Map<String, Value>) -> Option<String> {
    ["job_id", "id"].iter().find_map(|key| match map.get(*key) {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

fn u64_field(map: &serde_json::Map<String, Value>, key: &str) -> Option<u64> {
    map.get(key).and_then(Value::as_u64)
}

#[derive(Debug, Deserialize)]
struct WireRowOutcome {
    row_index: i64,
    #[serde(default)]
    error: Option<String>,
}

/// 解析提交确认
///
/// # 规则
/// - 正式提交必须能定位作业（job_id 或 id）
/// - 试运行不要求 job_id，行级结果取 row_errors（或 errors）
/// - total_rows 缺失时取提交的行数
pub fn parse_submission_ack(
    body: Value,
    dry_run: bool,
    submitted_rows: u64,
) -> GatewayResult<SubmissionAck> {
    let map = match body {
        Value::Object(map) => map,
        // 部分函数直接返回作业 ID
        Value::String(id) if !dry_run && !id.trim().is_empty() => {
            return Ok(SubmissionAck {
                job_id: Some(id),
                dry_run,
                total_rows: submitted_rows,
                row_errors: Vec::new(),
            });
        }
        Value::Null if dry_run => serde_json::Map::new(),
        other => {
            return Err(GatewayError::Schema(format!(
                "unexpected submission acknowledgement: {}",
                other
            )))
        }
    };

    let job_id = job_id_field(&map);
    if !dry_run && job_id.is_none() {
        return Err(GatewayError::Schema(
            "submission acknowledgement carries no job id".to_string(),
        ));
    }

    let outcomes = map
        .get("row_errors")
        .or_else(|| map.get("errors"))
        .cloned()
        .unwrap_or(Value::Array(Vec::new()));
    let outcomes: Vec<WireRowOutcome> = serde_json::from_value(outcomes)?;
    let row_errors = outcomes
        .into_iter()
        .map(|o| {
            Ok(RowOutcome {
                row_index: non_negative("row_index", o.row_index)?,
                error: o.error.filter(|e| !e.trim().is_empty()),
            })
        })
        .collect::<GatewayResult<Vec<_>>>()?;

    Ok(SubmissionAck {
        job_id: if dry_run { None } else { job_id },
        dry_run,
        total_rows: u64_field(&map, "total_rows").unwrap_or(submitted_rows),
        row_errors,
    })
}

/// 解析重试确认（空响应视为已受理）
pub fn parse_retry_ack(body: Value, requested_rows: u64) -> GatewayResult<RetryAck> {
    match body {
        Value::Null => Ok(RetryAck {
            job_id: None,
            retried_rows: requested_rows,
        }),
        Value::String(id) => Ok(RetryAck {
            job_id: Some(id).filter(|s| !s.trim().is_empty()),
            retried_rows: requested_rows,
        }),
        Value::Object(map) => Ok(RetryAck {
            job_id: job_id_field(&map),
            retried_rows: u64_field(&map, "retried_rows").unwrap_or(requested_rows),
        }),
        other => Err(GatewayError::Schema(format!(
            "unexpected retry acknowledgement: {}",
            other
        ))),
    }
}
