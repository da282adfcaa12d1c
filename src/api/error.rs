// ==========================================
// 人力资源批量导入 - API层错误类型
// ==========================================
// 职责: 面向用户的错误分类，网关错误消息原样保留
// 行级失败（ImportRow.error）是正常数据，不在此处表达
// ==========================================

use crate::context::TenantResolutionError;
use crate::i18n::{translate, translate_with_args, Lang};
use crate::importer::{ExportError, ParseError};
use crate::repository::GatewayError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 导入流程错误
    // ==========================================
    /// 文件无法读取，需重新选择文件
    #[error("文件解析失败: {0}")]
    Parse(#[from] ParseError),

    /// 无租户，提交未发起
    #[error(transparent)]
    TenantResolution(#[from] TenantResolutionError),

    /// 远程拒绝提交（消息原样）
    #[error("{0}")]
    Submission(String),

    /// 远程拒绝重试（消息原样）
    #[error("{0}")]
    Retry(String),

    /// 查询类调用的网关错误（不做转换）
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("CSV 导出失败: {0}")]
    Export(#[from] ExportError),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("内部错误: {0}")]
    InternalError(String),
}

impl ApiError {
    /// 本地化的用户提示
    ///
    /// 翻译缺失时回退到错误自身的消息
    pub fn localized_message(&self, lang: Lang) -> String {
        let detail = match self {
            ApiError::Submission(msg) | ApiError::Retry(msg) | ApiError::InvalidInput(msg) => {
                msg.clone()
            }
            ApiError::Gateway(e) => e.message(),
            ApiError::Parse(e) => e.to_string(),
            _ => self.to_string(),
        };
        let args = [("message", detail.as_str())];

        let localized = match self {
            ApiError::Parse(_) => translate_with_args(lang, "import.error.parse", &args),
            ApiError::TenantResolution(_) => translate(lang, "import.error.tenant"),
            ApiError::Submission(_) => translate_with_args(lang, "import.error.submission", &args),
            ApiError::Retry(_) => translate_with_args(lang, "import.error.retry", &args),
            ApiError::Gateway(_) => translate_with_args(lang, "import.error.gateway", &args),
            ApiError::InvalidInput(_) => {
                translate_with_args(lang, "import.error.invalid_input", &args)
            }
            ApiError::Export(_) | ApiError::InternalError(_) => {
                translate_with_args(lang, "import.error.internal", &args)
            }
        };

        localized.unwrap_or_else(|missing| {
            tracing::warn!(key = %missing.key, locale = %missing.locale, "翻译缺失");
            self.to_string()
        })
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;
