// ==========================================
// 人力资源批量导入 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::import_config_trait::{ConfigResult, ImportConfigReader};
use crate::db::open_sqlite_connection;
use crate::domain::ImportMode;
use rusqlite::{params, Connection};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// 默认值
pub mod defaults {
    pub const DEFAULT_PAGE_SIZE: u32 = 50;
    pub const MAX_PAGE_SIZE: u32 = 500;
    pub const REQUIRED_COLUMNS_EMPLOYEES: &str = "employee_no,full_name";
    pub const REQUIRED_COLUMNS_GOV: &str = "national_id";
    pub const AUTO_PROCESS: bool = true;
}

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> ConfigResult<Self> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> ConfigResult<Self> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 共享连接（内嵌后端与配置共用同一数据库）
    pub fn connection(&self) -> Arc<Mutex<Connection>> {
        Arc::clone(&self.conn)
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    fn get_config_value(&self, key: &str) -> ConfigResult<Option<String>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 读取 global scope 的配置值（公开方法，供其他模块复用）
    pub fn get_global_config_value(&self, key: &str) -> ConfigResult<Option<String>> {
        self.get_config_value(key)
    }

    /// 写入 global scope 的配置值（UPSERT）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> ConfigResult<()> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;

        tracing::info!(config_key = key, "配置已更新");
        Ok(())
    }

    /// 从 config_kv 表读取配置值，带默认值
    fn get_config_or_default(&self, key: &str, default: &str) -> ConfigResult<String> {
        Ok(self
            .get_config_value(key)?
            .unwrap_or_else(|| default.to_string()))
    }

    /// 读取数值配置，格式错误时告警并回退默认值
    fn get_u32_or_default(&self, key: &str, default: u32) -> ConfigResult<u32> {
        let value = self.get_config_or_default(key, &default.to_string())?;
        Ok(value.trim().parse::<u32>().unwrap_or_else(|_| {
            tracing::warn!(config_key = key, raw_value = %value, "数值配置格式错误，使用默认值");
            default
        }))
    }

    /// 获取所有 global 配置的快照
    pub fn get_config_snapshot(&self) -> ConfigResult<HashMap<String, String>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")?;

        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut config_map = HashMap::new();
        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }
        Ok(config_map)
    }
}

// ==========================================
// ImportConfigReader Trait 实现
// ==========================================
impl ImportConfigReader for ConfigManager {
    fn get_default_page_size(&self) -> ConfigResult<u32> {
        self.get_u32_or_default(config_keys::DEFAULT_PAGE_SIZE, defaults::DEFAULT_PAGE_SIZE)
    }

    fn get_max_page_size(&self) -> ConfigResult<u32> {
        self.get_u32_or_default(config_keys::MAX_PAGE_SIZE, defaults::MAX_PAGE_SIZE)
    }

    fn get_required_columns(&self, mode: ImportMode) -> ConfigResult<Vec<String>> {
        let (key, default) = match mode {
            ImportMode::Employees => (
                config_keys::REQUIRED_COLUMNS_EMPLOYEES,
                defaults::REQUIRED_COLUMNS_EMPLOYEES,
            ),
            ImportMode::Gov => (
                config_keys::REQUIRED_COLUMNS_GOV,
                defaults::REQUIRED_COLUMNS_GOV,
            ),
        };

        let value = self.get_config_or_default(key, default)?;
        Ok(value
            .split(',')
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect())
    }

    fn get_auto_process(&self) -> ConfigResult<bool> {
        let value = self.get_config_or_default(
            config_keys::AUTO_PROCESS,
            if defaults::AUTO_PROCESS { "1" } else { "0" },
        )?;
        match value.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" => Ok(true),
            "0" | "false" | "no" => Ok(false),
            _ => {
                tracing::warn!(config_key = config_keys::AUTO_PROCESS, raw_value = %value, "布尔配置格式错误，使用默认值");
                Ok(defaults::AUTO_PROCESS)
            }
        }
    }

    fn get_default_tenant(&self) -> ConfigResult<Option<String>> {
        Ok(self
            .get_config_value(config_keys::DEFAULT_TENANT)?
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty()))
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 分页
    pub const DEFAULT_PAGE_SIZE: &str = "import.default_page_size";
    pub const MAX_PAGE_SIZE: &str = "import.max_page_size";

    // 行校验（逗号分隔的列名）
    pub const REQUIRED_COLUMNS_EMPLOYEES: &str = "import.required_columns.employees";
    pub const REQUIRED_COLUMNS_GOV: &str = "import.required_columns.gov";

    // 内嵌后端
    pub const AUTO_PROCESS: &str = "import.auto_process";

    // 租户
    pub const DEFAULT_TENANT: &str = "tenant.default_id";
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_schema;

    fn manager() -> ConfigManager {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        ConfigManager::from_connection(Arc::new(Mutex::new(conn))).unwrap()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = manager();
        assert_eq!(config.get_default_page_size().unwrap(), 50);
        assert_eq!(config.get_max_page_size().unwrap(), 500);
        assert!(config.get_auto_process().unwrap());
        assert_eq!(config.get_default_tenant().unwrap(), None);
        assert_eq!(
            config.get_required_columns(ImportMode::Employees).unwrap(),
            vec!["employee_no", "full_name"]
        );
    }

    #[test]
    fn test_overrides_and_bad_values() {
        let config = manager();
        config
            .set_global_config_value(config_keys::REQUIRED_COLUMNS_GOV, " national_id , iqama_no ,")
            .unwrap();
        config
            .set_global_config_value(config_keys::DEFAULT_PAGE_SIZE, "abc")
            .unwrap();
        config
            .set_global_config_value(config_keys::AUTO_PROCESS, "false")
            .unwrap();
        config
            .set_global_config_value(config_keys::DEFAULT_TENANT, "  acme ")
            .unwrap();

        assert_eq!(
            config.get_required_columns(ImportMode::Gov).unwrap(),
            vec!["national_id", "iqama_no"]
        );
        assert_eq!(config.get_default_page_size().unwrap(), 50);
        assert!(!config.get_auto_process().unwrap());
        assert_eq!(config.get_default_tenant().unwrap().as_deref(), Some("acme"));
        assert_eq!(config.get_config_snapshot().unwrap().len(), 4);
    }
}
