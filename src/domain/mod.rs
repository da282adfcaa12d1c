// ==========================================
// 人力资源批量导入 - 领域层
// ==========================================
// 职责: 导入作业/导入行/解析结果等实体与类型
// ==========================================

pub mod import_job;
pub mod types;

// 重导出核心类型
pub use import_job::{
    ImportJob, ImportRow, JobChange, JobFilter, PageRequest, ParsedSheet, RetryAck, RowOutcome,
    RowQuery, RowRecord, SubmissionAck,
};
pub use types::{ChangeKind, ImportMode, JobStatus};
