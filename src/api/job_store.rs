// ==========================================
// 人力资源批量导入 - 作业查询
// ==========================================
// 职责: 分页查询作业与作业行
// 排序由网关负责（作业按创建时间倒序，行按 row_index 升序），客户端不重排
// 网关错误原样向上传递；除刷新绑定外不做本地缓存
// ==========================================

use crate::api::error::ApiResult;
use crate::config::ImportConfigReader;
use crate::domain::{ImportJob, ImportRow, JobFilter, PageRequest, RowQuery};
use crate::repository::ImportGateway;
use std::sync::Arc;

pub struct JobStoreAccessor {
    gateway: Arc<dyn ImportGateway>,
    config: Arc<dyn ImportConfigReader>,
}

impl JobStoreAccessor {
    pub fn new(gateway: Arc<dyn ImportGateway>, config: Arc<dyn ImportConfigReader>) -> Self {
        Self { gateway, config }
    }

    fn max_page_size(&self) -> u32 {
        self.config.get_max_page_size().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "读取每页上限失败，使用默认值");
            crate::config::config_manager::defaults::MAX_PAGE_SIZE
        })
    }

    /// 首页分页参数（每页数量取配置）
    pub fn first_page(&self) -> PageRequest {
        let size = self.config.get_default_page_size().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "读取默认每页数量失败，使用默认值");
            crate::config::config_manager::defaults::DEFAULT_PAGE_SIZE
        });
        PageRequest::first(size).clamped(self.max_page_size())
    }

    /// 分页查询作业
    pub async fn list_jobs(&self, filter: &JobFilter, page: PageRequest) -> ApiResult<Vec<ImportJob>> {
        let page = page.clamped(self.max_page_size());
        let jobs = self.gateway.list_jobs(filter, page).await?;
        tracing::debug!(
            status = ?filter.status,
            mode = ?filter.mode,
            limit = page.limit,
            offset = page.offset,
            returned = jobs.len(),
            "查询导入作业"
        );
        Ok(jobs)
    }

    /// 分页查询作业行
    ///
    /// # 说明
    /// - 未知 job_id 返回空列表
    pub async fn get_rows(&self, job_id: &str, query: RowQuery) -> ApiResult<Vec<ImportRow>> {
        let query = RowQuery {
            page: query.page.clamped(self.max_page_size()),
            ..query
        };
        let rows = self.gateway.list_rows(job_id, &query).await?;
        tracing::debug!(
            job_id,
            only_errors = query.only_errors,
            returned = rows.len(),
            "查询导入行"
        );
        Ok(rows)
    }

    /// 逐页拉取作业的全部失败行（用于导出诊断 CSV）
    pub async fn collect_error_rows(&self, job_id: &str) -> ApiResult<Vec<ImportRow>> {
        let mut page = self.first_page();
        let mut collected = Vec::new();

        loop {
            let batch = self.get_rows(job_id, RowQuery::errors(page)).await?;
            let fetched = batch.len();
            collected.extend(batch);
            if fetched < page.limit as usize {
                break;
            }
            page = page.next();
        }

        tracing::info!(job_id, error_rows = collected.len(), "失败行收集完成");
        Ok(collected)
    }
}
