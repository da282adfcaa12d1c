// ==========================================
// 人力资源批量导入 - 应用状态
// ==========================================
// 职责: 组装配置、网关、各客户端与导出器，供宿主视图使用
// 两种装配:
// - 内嵌后端: 本地 SQLite（离线运行）
// - 托管后端: HTTP（变更通知由宿主提供）
// ==========================================

use anyhow::Context;
use std::sync::{Arc, Mutex};

use crate::api::{ApiResult, ImportSubmissionClient, JobStoreAccessor, RetryClient};
use crate::app::live_refresh::{InvalidateCallback, JobListCache, LiveRefreshBinding};
use crate::config::{BackendSettings, ConfigManager, ImportConfigReader};
use crate::context::{ImportContext, TenantResolutionError};
use crate::db::{init_schema, open_sqlite_connection};
use crate::i18n::Lang;
use crate::importer::{CsvExporter, RequiredColumnsValidator, WorkbookParser};
use crate::repository::{
    ImportGateway, JobChangeSource, LocalImportGateway, RpcImportGateway,
};

/// 应用状态
pub struct AppState {
    /// 数据库路径（配置表 / 内嵌后端）
    pub db_path: String,

    /// 配置管理器
    pub config: Arc<ConfigManager>,

    /// 导入网关
    pub gateway: Arc<dyn ImportGateway>,

    /// 作业变更通知来源
    pub changes: Arc<dyn JobChangeSource>,

    /// 内嵌后端（托管模式下为 None）
    pub local_backend: Option<Arc<LocalImportGateway>>,

    pub parser: WorkbookParser,
    pub submission: ImportSubmissionClient,
    pub job_store: JobStoreAccessor,
    pub retry: RetryClient,
    pub exporter: CsvExporter,
}

impl AppState {
    /// 使用内嵌后端初始化
    pub fn new_embedded(db_path: String) -> anyhow::Result<Self> {
        tracing::info!("初始化AppState（内嵌后端），数据库路径: {}", db_path);

        let config = Self::open_config(&db_path)?;
        let conn = config.connection();

        let validator = RequiredColumnsValidator::from_config(config.as_ref())
            .map_err(|e| anyhow::anyhow!("无法读取必填列配置: {}", e))?;
        let auto_process = config.get_auto_process().unwrap_or_else(|e| {
            tracing::warn!("读取自动处理配置失败，使用默认值: {}", e);
            true
        });

        let local = Arc::new(
            LocalImportGateway::from_connection(conn, Arc::new(validator))
                .context("无法创建LocalImportGateway")?
                .with_auto_process(auto_process),
        );

        let gateway: Arc<dyn ImportGateway> = local.clone();
        let changes: Arc<dyn JobChangeSource> = local.clone();
        Ok(Self::assemble(db_path, config, gateway, changes, Some(local)))
    }

    /// 使用托管后端初始化
    ///
    /// # 参数
    /// - changes: 宿主提供的变更通知来源（例如实时订阅通道）
    pub fn new_remote(
        db_path: String,
        settings: BackendSettings,
        changes: Arc<dyn JobChangeSource>,
    ) -> anyhow::Result<Self> {
        tracing::info!(
            "初始化AppState（托管后端），后端地址: {}，数据库路径: {}",
            settings.base_url,
            db_path
        );

        let config = Self::open_config(&db_path)?;
        let gateway: Arc<dyn ImportGateway> = Arc::new(
            RpcImportGateway::new(settings).context("无法创建RpcImportGateway")?,
        );
        Ok(Self::assemble(db_path, config, gateway, changes, None))
    }

    fn open_config(db_path: &str) -> anyhow::Result<Arc<ConfigManager>> {
        let conn = open_sqlite_connection(db_path)
            .with_context(|| format!("无法打开数据库: {}", db_path))?;
        init_schema(&conn).context("数据库初始化失败")?;
        let config = ConfigManager::from_connection(Arc::new(Mutex::new(conn)))
            .map_err(|e| anyhow::anyhow!("无法创建ConfigManager: {}", e))?;
        Ok(Arc::new(config))
    }

    fn assemble(
        db_path: String,
        config: Arc<ConfigManager>,
        gateway: Arc<dyn ImportGateway>,
        changes: Arc<dyn JobChangeSource>,
        local_backend: Option<Arc<LocalImportGateway>>,
    ) -> Self {
        let config_reader: Arc<dyn ImportConfigReader> = config.clone();
        Self {
            db_path,
            config,
            submission: ImportSubmissionClient::new(gateway.clone()),
            job_store: JobStoreAccessor::new(gateway.clone(), config_reader),
            retry: RetryClient::new(gateway.clone()),
            gateway,
            changes,
            local_backend,
            parser: WorkbookParser,
            exporter: CsvExporter,
        }
    }

    /// 为当前会话构造导入上下文
    pub fn context(
        &self,
        session_tenant: Option<&str>,
        lang: Lang,
    ) -> Result<ImportContext, TenantResolutionError> {
        ImportContext::resolve(session_tenant, self.config.as_ref(), lang)
    }

    /// 创建作业列表缓存（首页，每页数量取配置）
    pub fn job_list(&self, filter: crate::domain::JobFilter) -> Arc<JobListCache> {
        Arc::new(JobListCache::new(filter, self.job_store.first_page()))
    }

    /// 绑定作业列表到变更通知
    pub fn bind_job_list(
        &self,
        cache: Arc<JobListCache>,
        on_invalidate: Option<InvalidateCallback>,
    ) -> ApiResult<LiveRefreshBinding> {
        match on_invalidate {
            Some(callback) => {
                LiveRefreshBinding::bind_with_callback(self.changes.as_ref(), cache, callback)
            }
            None => LiveRefreshBinding::bind(self.changes.as_ref(), cache),
        }
    }

    /// 导出作业全部失败行为 CSV
    pub async fn export_error_csv(&self, job_id: &str) -> ApiResult<String> {
        let rows = self.job_store.collect_error_rows(job_id).await?;
        Ok(self.exporter.export_rows(&rows)?)
    }
}

/// 获取默认数据库路径
///
/// # 优先级
/// 1. 环境变量 HR_BULK_IMPORT_DB_PATH
/// 2. 用户数据目录 hr-bulk-import/hr_bulk_import.db
/// 3. 当前目录 ./hr_bulk_import.db
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    if let Ok(path) = std::env::var("HR_BULK_IMPORT_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./hr_bulk_import.db");

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("hr-bulk-import");
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("hr_bulk_import.db");
        }
    }

    path.to_string_lossy().to_string()
}
