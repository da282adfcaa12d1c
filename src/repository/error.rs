// ==========================================
// 人力资源批量导入 - 网关层错误类型
// ==========================================
// 工具: thiserror 派生宏
// 远程错误消息原样保留，不做改写
// ==========================================

use thiserror::Error;

/// 网关层错误类型（远程 RPC 与内嵌后端共用）
#[derive(Error, Debug)]
pub enum GatewayError {
    // ===== 传输错误 =====
    #[error("传输失败: {0}")]
    Transport(String),

    #[error("远程调用失败 (status={status}): {message}")]
    Remote { status: u16, message: String },

    // ===== 边界校验错误 =====
    #[error("远程数据不符合约定: {0}")]
    Schema(String),

    // ===== 数据库错误（内嵌后端） =====
    #[error("记录未找到: {entity} with id={id}")]
    NotFound { entity: String, id: String },

    #[error("数据库操作失败: {0}")]
    Database(String),

    #[error("数据库锁获取失败: {0}")]
    Lock(String),
}

impl GatewayError {
    /// 面向用户的原始消息（远程错误返回远程系统给出的原文）
    pub fn message(&self) -> String {
        match self {
            GatewayError::Remote { message, .. } => message.clone(),
            GatewayError::Transport(msg)
            | GatewayError::Schema(msg)
            | GatewayError::Database(msg)
            | GatewayError::Lock(msg) => msg.clone(),
            GatewayError::NotFound { .. } => self.to_string(),
        }
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            GatewayError::Remote {
                status: status.as_u16(),
                message: err.to_string(),
            }
        } else if err.is_decode() {
            GatewayError::Schema(err.to_string())
        } else {
            GatewayError::Transport(err.to_string())
        }
    }
}

impl From<rusqlite::Error> for GatewayError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::QueryReturnedNoRows => GatewayError::NotFound {
                entity: "Unknown".to_string(),
                id: "Unknown".to_string(),
            },
            other => GatewayError::Database(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(err: serde_json::Error) -> Self {
        GatewayError::Schema(err.to_string())
    }
}

/// Result 类型别名
pub type GatewayResult<T> = Result<T, GatewayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_message_is_verbatim() {
        let err = GatewayError::Remote {
            status: 400,
            message: "tenant quota exceeded".to_string(),
        };
        assert_eq!(err.message(), "tenant quota exceeded");
        assert!(err.to_string().contains("400"));
    }

    #[test]
    fn test_from_rusqlite() {
        let err: GatewayError = rusqlite::Error::QueryReturnedNoRows.into();
        assert!(matches!(err, GatewayError::NotFound { .. }));
    }
}
