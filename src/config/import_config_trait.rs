// ==========================================
// 人力资源批量导入 - 导入配置读取 Trait
// ==========================================
// 职责: 定义导入模块所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::domain::ImportMode;
use std::error::Error;

/// 配置读取结果
pub type ConfigResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

// ==========================================
// ImportConfigReader Trait
// ==========================================
// 实现者: ConfigManager（从 config_kv 表读取）
pub trait ImportConfigReader: Send + Sync {
    // ===== 分页配置 =====

    /// 获取默认每页记录数
    ///
    /// # 默认值
    /// - 50
    fn get_default_page_size(&self) -> ConfigResult<u32>;

    /// 获取每页记录数上限（超出时截断）
    ///
    /// # 默认值
    /// - 500
    fn get_max_page_size(&self) -> ConfigResult<u32>;

    // ===== 行校验配置 =====

    /// 获取指定导入模式的必填列
    ///
    /// # 默认值
    /// - employees: employee_no, full_name
    /// - gov: national_id
    ///
    /// # 说明
    /// - 首列同时作为作业内去重主键
    fn get_required_columns(&self, mode: ImportMode) -> ConfigResult<Vec<String>>;

    // ===== 内嵌后端配置 =====

    /// 提交后是否立即处理（内嵌后端）
    ///
    /// # 默认值
    /// - true
    fn get_auto_process(&self) -> ConfigResult<bool>;

    // ===== 租户配置 =====

    /// 获取默认租户（会话无法提供租户时的回退值）
    ///
    /// # 默认值
    /// - None（不回退）
    fn get_default_tenant(&self) -> ConfigResult<Option<String>>;
}
