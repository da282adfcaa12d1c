// ==========================================
// 人力资源批量导入 - API 层
// ==========================================
// 职责: 提交 / 查询 / 重试 / 导出，供宿主视图调用
// 每个调用显式接收 ImportContext，不读取全局状态
// ==========================================

pub mod error;
pub mod job_store;
pub mod retry_client;
pub mod submission_client;

// 重导出核心类型
pub use error::{ApiError, ApiResult};
pub use job_store::JobStoreAccessor;
pub use retry_client::RetryClient;
pub use submission_client::ImportSubmissionClient;
