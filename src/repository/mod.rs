// ==========================================
// 人力资源批量导入 - 网关层
// ==========================================
// 职责: 远程导入边界（托管后端 / 内嵌后端）与变更通知
// 红线: 网关不含客户端逻辑；远程数据在此层校验后才可信
// ==========================================

pub mod change_feed;
pub mod error;
pub mod import_gateway;
pub mod local_gateway;
pub mod rpc_gateway;
pub mod wire;

// 重导出核心类型
pub use change_feed::JobChangeBroadcaster;
pub use error::{GatewayError, GatewayResult};
pub use import_gateway::{ImportGateway, JobChangeSource, SubmitRequest};
pub use local_gateway::LocalImportGateway;
pub use rpc_gateway::RpcImportGateway;
