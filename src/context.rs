// ==========================================
// 人力资源批量导入 - 导入上下文
// ==========================================
// 租户与语言显式传入每个客户端调用，不读取全局状态
// 租户来源: 会话 → 配置默认租户 → 无（提交时失败）
// ==========================================

use crate::config::ImportConfigReader;
use crate::i18n::{Direction, Lang};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// 租户标识（非空、已去除首尾空白）
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantId(String);

impl TenantId {
    /// 空白字符串视为无租户
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 无法确定租户
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TenantResolutionError {
    #[error("no tenant is associated with the current session")]
    Missing,

    #[error("failed to read the default tenant: {0}")]
    Config(String),
}

// ==========================================
// ImportContext
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ImportContext {
    tenant_id: Option<TenantId>,
    lang: Lang,
}

impl ImportContext {
    pub fn new(tenant_id: Option<TenantId>, lang: Lang) -> Self {
        Self { tenant_id, lang }
    }

    /// 已知租户
    pub fn for_tenant(tenant_id: &str, lang: Lang) -> Self {
        Self::new(TenantId::parse(tenant_id), lang)
    }

    /// 解析上下文
    ///
    /// # 规则
    /// - 会话租户非空 → 使用会话租户
    /// - 否则读取配置 tenant.default_id
    /// - 配置读取失败 → TenantResolutionError::Config
    pub fn resolve(
        session_tenant: Option<&str>,
        config: &dyn ImportConfigReader,
        lang: Lang,
    ) -> Result<Self, TenantResolutionError> {
        if let Some(tenant) = session_tenant.and_then(TenantId::parse) {
            return Ok(Self::new(Some(tenant), lang));
        }

        let fallback = config
            .get_default_tenant()
            .map_err(|e| TenantResolutionError::Config(e.to_string()))?
            .as_deref()
            .and_then(TenantId::parse);

        if fallback.is_some() {
            tracing::debug!("会话未携带租户，使用默认租户");
        }
        Ok(Self::new(fallback, lang))
    }

    /// 获取租户（提交前必须调用）
    pub fn tenant(&self) -> Result<&TenantId, TenantResolutionError> {
        self.tenant_id.as_ref().ok_or(TenantResolutionError::Missing)
    }

    pub fn lang(&self) -> Lang {
        self.lang
    }

    pub fn direction(&self) -> Direction {
        self.lang.direction()
    }

    pub fn with_lang(mut self, lang: Lang) -> Self {
        self.lang = lang;
        self
    }
}
