// ==========================================
// 人力资源批量导入 - 领域类型定义
// ==========================================
// 导入模式 / 作业状态 / 变更通知类型
// 序列化格式: 小写（与远程后端一致）
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 导入模式 (Import Mode)
// ==========================================
// 作业创建时确定，之后不可变
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportMode {
    Employees, // 员工主数据
    Gov,       // 政府平台数据
}

impl ImportMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImportMode::Employees => "employees",
            ImportMode::Gov => "gov",
        }
    }

    /// 从字符串解析（大小写不敏感）
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "employees" => Some(ImportMode::Employees),
            "gov" => Some(ImportMode::Gov),
            _ => None,
        }
    }

    pub fn all() -> [ImportMode; 2] {
        [ImportMode::Employees, ImportMode::Gov]
    }
}

impl fmt::Display for ImportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ==========================================
// 作业状态 (Job Status)
// ==========================================
// 只能前进: queued → processing → succeeded | failed | partial
// 状态由远程系统驱动，客户端从不修改
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Processing,
    Succeeded,
    Failed,
    Partial, // 部分成功，属于正常终态
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Processing => "processing",
            JobStatus::Succeeded => "succeeded",
            JobStatus::Failed => "failed",
            JobStatus::Partial => "partial",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "queued" => Some(JobStatus::Queued),
            "processing" => Some(JobStatus::Processing),
            "succeeded" => Some(JobStatus::Succeeded),
            "failed" => Some(JobStatus::Failed),
            "partial" => Some(JobStatus::Partial),
            _ => None,
        }
    }

    /// 是否终态（终态后不再处理）
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Succeeded | JobStatus::Failed | JobStatus::Partial
        )
    }

    fn stage(&self) -> u8 {
        match self {
            JobStatus::Queued => 0,
            JobStatus::Processing => 1,
            JobStatus::Succeeded | JobStatus::Failed | JobStatus::Partial => 2,
        }
    }

    /// 判断状态迁移是否合法（只允许前进，终态之间不可互转）
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        next.stage() > self.stage()
    }

    /// 根据计数推导终态
    ///
    /// # 规则
    /// - 无失败行 → succeeded（包括 0 行作业）
    /// - 无成功行 → failed
    /// - 其他 → partial
    pub fn terminal_for(success_rows: u64, failed_rows: u64) -> JobStatus {
        if failed_rows == 0 {
            JobStatus::Succeeded
        } else if success_rows == 0 {
            JobStatus::Failed
        } else {
            JobStatus::Partial
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ==========================================
// 作业集合变更类型
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeKind::Insert => write!(f, "INSERT"),
            ChangeKind::Update => write!(f, "UPDATE"),
            ChangeKind::Delete => write!(f, "DELETE"),
        }
    }
}
