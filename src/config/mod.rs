// ==========================================
// 人力资源批量导入 - 配置层
// ==========================================
// 职责: 系统配置管理
// 存储: config_kv 表（导入参数）+ 环境变量（远程后端连接）
// ==========================================

pub mod backend_settings;
pub mod config_manager;
pub mod import_config_trait;

// 重导出核心配置管理器
pub use backend_settings::{BackendSettings, SettingsError};
pub use config_manager::{config_keys, ConfigManager};
pub use import_config_trait::{ConfigResult, ImportConfigReader};
