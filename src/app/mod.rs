// ==========================================
// 人力资源批量导入 - 应用层
// ==========================================
// 职责: 装配各层组件，提供作业列表实时刷新
// ==========================================

pub mod live_refresh;
pub mod state;

// 重导出
pub use live_refresh::{FetchTicket, InvalidateCallback, JobListCache, LiveRefreshBinding};
pub use state::{get_default_db_path, AppState};
