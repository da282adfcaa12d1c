// ==========================================
// 人力资源批量导入 - 核心库
// ==========================================
// 工作流: 文件解析 → 提交 → 远程处理 → 作业查询（实时刷新）→ 重试 → CSV 导出
// 技术栈: Rust + reqwest（托管后端）/ SQLite（内嵌后端）
// 语言: 英文（默认）/ 阿拉伯文（RTL）
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "en");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 导入层 - 文件解析 / 行校验 / CSV 导出
pub mod importer;

// 网关层 - 远程导入边界
pub mod repository;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// 导入上下文（租户 + 语言）
pub mod context;

// API 层 - 提交 / 查询 / 重试
pub mod api;

// 应用层 - 组件装配与实时刷新
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::{
    ChangeKind, ImportJob, ImportMode, ImportRow, JobChange, JobFilter, JobStatus, PageRequest,
    ParsedSheet, RetryAck, RowQuery, RowRecord, SubmissionAck,
};

// 导入层
pub use importer::{CsvExporter, ExportRow, ParseError, WorkbookParser};

// 网关
pub use repository::{GatewayError, ImportGateway, LocalImportGateway, RpcImportGateway};

// API
pub use api::{ApiError, ApiResult, ImportSubmissionClient, JobStoreAccessor, RetryClient};

// 上下文与国际化
pub use context::{ImportContext, TenantId, TenantResolutionError};
pub use i18n::{Direction, Lang, MissingKey};

// 应用层
pub use app::{AppState, JobListCache, LiveRefreshBinding};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
