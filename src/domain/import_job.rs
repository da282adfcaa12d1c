// ==========================================
// 人力资源批量导入 - 导入作业实体
// ==========================================
// ImportJob / ImportRow: 远程系统拥有，客户端只读
// ParsedSheet: 客户端临时数据，不落库
// ==========================================

use crate::domain::types::{ChangeKind, ImportMode, JobStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 行记录: 列名 → 值（保持列的插入顺序）
pub type RowRecord = serde_json::Map<String, Value>;

// ==========================================
// ImportJob - 导入作业
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportJob {
    pub id: String,                          // 远程系统分配
    pub mode: ImportMode,                    // 创建后不可变
    pub status: JobStatus,                   // 只能前进
    pub total_rows: u64,
    pub processed_rows: u64,
    pub success_rows: u64,
    pub failed_rows: u64,
    pub created_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,  // 终态时设置且仅设置一次
}

impl ImportJob {
    /// 校验计数不变式: success + failed ≤ processed ≤ total
    pub fn check_counters(&self) -> Result<(), String> {
        if self.processed_rows > self.total_rows {
            return Err(format!(
                "job {}: processed_rows ({}) exceeds total_rows ({})",
                self.id, self.processed_rows, self.total_rows
            ));
        }
        let outcomes = self.success_rows.saturating_add(self.failed_rows);
        if outcomes > self.processed_rows {
            return Err(format!(
                "job {}: success_rows + failed_rows ({}) exceeds processed_rows ({})",
                self.id, outcomes, self.processed_rows
            ));
        }
        Ok(())
    }

    /// 校验 finished_at 与状态一致: 非终态必须为空，终态必须已设置
    pub fn check_finished_at(&self) -> Result<(), String> {
        match (self.status.is_terminal(), self.finished_at) {
            (false, Some(_)) => Err(format!(
                "job {}: finished_at is set while status is {}",
                self.id, self.status
            )),
            (true, None) => Err(format!(
                "job {}: terminal status {} without finished_at",
                self.id, self.status
            )),
            _ => Ok(()),
        }
    }

    /// 完整校验（在边界处调用，未通过的数据不被视为 ImportJob）
    pub fn validate(&self) -> Result<(), String> {
        if self.id.trim().is_empty() {
            return Err("job id is empty".to_string());
        }
        self.check_counters()?;
        self.check_finished_at()
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

// ==========================================
// ImportRow - 导入行
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportRow {
    pub id: String,
    pub job_id: String,
    pub row_index: u64,                  // 源文件中的位置，用于错误定位
    pub raw: RowRecord,                  // 原样保留，用于审计与 CSV 导出
    pub normalized: Option<RowRecord>,   // 规范化失败时为空
    pub error: Option<String>,           // 成功为空，失败为可读原因
    pub created_at: DateTime<Utc>,
}

impl ImportRow {
    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }
}

// ==========================================
// ParsedSheet - 解析后的工作表
// ==========================================
// 生命周期: 单次文件读取产生，提交或放弃后丢弃
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedSheet {
    pub sheet_name: String,
    pub header: Vec<String>,
    pub rows: Vec<RowRecord>,
    /// 每行在源文件中的数据行号（1 起，跳过的空白行同样计数），与 rows 一一对应
    #[serde(default)]
    pub row_indexes: Vec<u64>,
}

impl ParsedSheet {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// 第 i 行的源文件位置
    pub fn row_index_at(&self, i: usize) -> u64 {
        self.row_indexes.get(i).copied().unwrap_or(i as u64 + 1)
    }
}

// ==========================================
// 查询参数
// ==========================================

/// 作业列表过滤条件
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobFilter {
    pub status: Option<JobStatus>,
    pub mode: Option<ImportMode>,
}

impl JobFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with_status(mut self, status: JobStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_mode(mut self, mode: ImportMode) -> Self {
        self.mode = Some(mode);
        self
    }
}

/// 分页参数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub limit: u32,
    pub offset: u32,
}

impl PageRequest {
    pub fn new(limit: u32, offset: u32) -> Self {
        Self { limit, offset }
    }

    pub fn first(limit: u32) -> Self {
        Self { limit, offset: 0 }
    }

    pub fn next(&self) -> Self {
        Self {
            limit: self.limit,
            offset: self.offset.saturating_add(self.limit),
        }
    }

    /// 限制每页数量在 [1, max] 之间
    pub fn clamped(&self, max: u32) -> Self {
        Self {
            limit: self.limit.max(1).min(max.max(1)),
            offset: self.offset,
        }
    }
}

/// 行查询参数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowQuery {
    pub only_errors: bool,
    pub page: PageRequest,
}

impl RowQuery {
    pub fn all(page: PageRequest) -> Self {
        Self {
            only_errors: false,
            page,
        }
    }

    pub fn errors(page: PageRequest) -> Self {
        Self {
            only_errors: true,
            page,
        }
    }
}

// ==========================================
// 远程确认
// ==========================================

/// 单行校验结果（试运行报告）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowOutcome {
    pub row_index: u64,
    pub error: Option<String>,
}

/// 提交确认
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionAck {
    /// 已创建作业的 ID（试运行不创建作业，为 None）
    pub job_id: Option<String>,
    pub dry_run: bool,
    pub total_rows: u64,
    /// 行级校验失败明细（试运行时由远程系统返回）
    #[serde(default)]
    pub row_errors: Vec<RowOutcome>,
}

/// 重试确认
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryAck {
    /// 承载重试的作业 ID（如远程系统返回）
    pub job_id: Option<String>,
    pub retried_rows: u64,
}

/// 作业集合变更通知
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobChange {
    pub kind: ChangeKind,
    pub job_id: String,
}

impl JobChange {
    pub fn inserted(job_id: impl Into<String>) -> Self {
        Self {
            kind: ChangeKind::Insert,
            job_id: job_id.into(),
        }
    }

    pub fn updated(job_id: impl Into<String>) -> Self {
        Self {
            kind: ChangeKind::Update,
            job_id: job_id.into(),
        }
    }

    pub fn deleted(job_id: impl Into<String>) -> Self {
        Self {
            kind: ChangeKind::Delete,
            job_id: job_id.into(),
        }
    }
}
