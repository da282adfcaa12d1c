// ==========================================
// 人力资源批量导入 - 作业列表实时刷新
// ==========================================
// 职责:
// - JobListCache: 客户端持有的作业列表（一个过滤条件 + 一页）
// - LiveRefreshBinding: 订阅作业变更通知，收到任何变更即失效缓存
// 约束:
// - 失效后下一次读取重新查询
// - 视图销毁（dispose / drop）后不再触发任何回调
// - 销毁后到达的查询结果被丢弃
// - 通知与查询之间不保证顺序（刷新可能短暂返回旧数据）
// ==========================================

use crate::api::{ApiError, ApiResult, JobStoreAccessor};
use crate::domain::{ImportJob, JobChange, JobFilter, PageRequest};
use crate::repository::JobChangeSource;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

fn lock_ignoring_poison<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

// ==========================================
// JobListCache
// ==========================================

/// 查询凭证（记录发起查询时的代数）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    generation: u64,
}

#[derive(Debug, Default)]
struct CacheInner {
    generation: u64,
    jobs: Option<Vec<ImportJob>>,
    closed: bool,
}

#[derive(Debug)]
pub struct JobListCache {
    filter: JobFilter,
    page: PageRequest,
    inner: Mutex<CacheInner>,
}

impl JobListCache {
    pub fn new(filter: JobFilter, page: PageRequest) -> Self {
        Self {
            filter,
            page,
            inner: Mutex::new(CacheInner::default()),
        }
    }

    pub fn filter(&self) -> &JobFilter {
        &self.filter
    }

    pub fn page(&self) -> PageRequest {
        self.page
    }

    /// 当前缓存内容（None 表示需要重新查询）
    pub fn read(&self) -> Option<Vec<ImportJob>> {
        lock_ignoring_poison(&self.inner).jobs.clone()
    }

    pub fn generation(&self) -> u64 {
        lock_ignoring_poison(&self.inner).generation
    }

    pub fn is_closed(&self) -> bool {
        lock_ignoring_poison(&self.inner).closed
    }

    /// 开始查询（已关闭返回 None）
    pub fn begin_fetch(&self) -> Option<FetchTicket> {
        let inner = lock_ignoring_poison(&self.inner);
        if inner.closed {
            None
        } else {
            Some(FetchTicket {
                generation: inner.generation,
            })
        }
    }

    /// 应用查询结果
    ///
    /// # 返回
    /// - true: 已写入缓存
    /// - false: 期间发生失效或缓存已关闭，结果被丢弃
    pub fn complete_fetch(&self, ticket: FetchTicket, jobs: Vec<ImportJob>) -> bool {
        let mut inner = lock_ignoring_poison(&self.inner);
        if inner.closed || inner.generation != ticket.generation {
            tracing::debug!(
                ticket = ticket.generation,
                current = inner.generation,
                closed = inner.closed,
                "丢弃过期的作业列表结果"
            );
            return false;
        }
        inner.jobs = Some(jobs);
        true
    }

    /// 失效缓存
    ///
    /// # 返回
    /// - 新的代数
    pub fn invalidate(&self) -> u64 {
        let mut inner = lock_ignoring_poison(&self.inner);
        inner.generation += 1;
        inner.jobs = None;
        inner.generation
    }

    /// 关闭缓存（视图销毁）
    pub fn close(&self) {
        let mut inner = lock_ignoring_poison(&self.inner);
        inner.closed = true;
        inner.jobs = None;
    }

    /// 读取作业列表（缓存有效时直接返回，否则查询）
    ///
    /// 查询期间若发生失效，本次结果照常返回给调用方，但不写入缓存
    pub async fn load(&self, store: &JobStoreAccessor) -> ApiResult<Vec<ImportJob>> {
        if let Some(jobs) = self.read() {
            return Ok(jobs);
        }

        let ticket = self
            .begin_fetch()
            .ok_or_else(|| ApiError::InvalidInput("job list view has been disposed".to_string()))?;
        let jobs = store.list_jobs(&self.filter, self.page).await?;
        self.complete_fetch(ticket, jobs.clone());
        Ok(jobs)
    }
}

// ==========================================
// LiveRefreshBinding
// ==========================================

/// 失效回调（通知宿主视图重新读取）
///
/// 回调内可以读取缓存与 is_active，但不能调用 dispose（会等待回调自身结束）
pub type InvalidateCallback = Arc<dyn Fn() + Send + Sync>;

struct BindingState {
    /// 回调与销毁互斥
    gate: Mutex<()>,
    /// false 后不再触发
    active: AtomicBool,
    cache: Arc<JobListCache>,
    on_invalidate: Option<InvalidateCallback>,
}

impl BindingState {
    /// 处理一次变更
    ///
    /// # 返回
    /// - false: 绑定已销毁，监听任务应退出
    fn fire(&self, change: Option<&JobChange>) -> bool {
        let _gate = lock_ignoring_poison(&self.gate);
        if !self.active.load(Ordering::SeqCst) {
            return false;
        }

        let generation = self.cache.invalidate();
        match change {
            Some(change) => tracing::debug!(
                kind = %change.kind,
                job_id = %change.job_id,
                generation,
                "作业变更，列表已失效"
            ),
            None => tracing::debug!(generation, "变更通知积压，列表已失效"),
        }

        if let Some(callback) = &self.on_invalidate {
            callback();
        }
        true
    }
}

pub struct LiveRefreshBinding {
    state: Arc<BindingState>,
    task: Option<JoinHandle<()>>,
}

impl LiveRefreshBinding {
    /// 绑定缓存到变更通知
    ///
    /// 需在 tokio 运行时内调用
    pub fn bind(source: &dyn JobChangeSource, cache: Arc<JobListCache>) -> ApiResult<Self> {
        Self::bind_inner(source, cache, None)
    }

    /// 绑定并在每次失效后调用 callback
    pub fn bind_with_callback(
        source: &dyn JobChangeSource,
        cache: Arc<JobListCache>,
        callback: InvalidateCallback,
    ) -> ApiResult<Self> {
        Self::bind_inner(source, cache, Some(callback))
    }

    fn bind_inner(
        source: &dyn JobChangeSource,
        cache: Arc<JobListCache>,
        on_invalidate: Option<InvalidateCallback>,
    ) -> ApiResult<Self> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| ApiError::InternalError(format!("无可用的异步运行时: {}", e)))?;

        let state = Arc::new(BindingState {
            gate: Mutex::new(()),
            active: AtomicBool::new(true),
            cache,
            on_invalidate,
        });

        let mut receiver = source.subscribe();
        let task_state = Arc::clone(&state);
        let task = runtime.spawn(async move {
            loop {
                let keep_going = match receiver.recv().await {
                    Ok(change) => task_state.fire(Some(&change)),
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "作业变更通知积压");
                        task_state.fire(None)
                    }
                    Err(RecvError::Closed) => false,
                };
                if !keep_going {
                    break;
                }
            }
            tracing::debug!("作业变更监听已结束");
        });

        tracing::debug!("作业列表已绑定变更通知");
        Ok(Self {
            state,
            task: Some(task),
        })
    }

    pub fn is_active(&self) -> bool {
        self.state.active.load(Ordering::SeqCst)
    }

    /// 解除绑定
    ///
    /// 返回后不会再有回调触发；缓存关闭，在途查询结果被丢弃
    pub fn dispose(&mut self) {
        {
            let _gate = lock_ignoring_poison(&self.state.gate);
            let was_active = self.state.active.swap(false, Ordering::SeqCst);
            if !was_active && self.task.is_none() {
                return;
            }
        }
        self.state.cache.close();

        if let Some(task) = self.task.take() {
            task.abort();
        }
        tracing::debug!("作业列表变更绑定已释放");
    }
}

impl Drop for LiveRefreshBinding {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ImportMode, JobStatus};
    use chrono::Utc;

    fn job(id: &str) -> ImportJob {
        ImportJob {
            id: id.to_string(),
            mode: ImportMode::Gov,
            status: JobStatus::Queued,
            total_rows: 1,
            processed_rows: 0,
            success_rows: 0,
            failed_rows: 0,
            created_at: Utc::now(),
            finished_at: None,
        }
    }

    #[test]
    fn test_stale_fetch_is_discarded() {
        let cache = JobListCache::new(JobFilter::all(), PageRequest::first(10));
        let ticket = cache.begin_fetch().unwrap();
        cache.invalidate();
        assert!(!cache.complete_fetch(ticket, vec![job("old")]));
        assert!(cache.read().is_none());

        let ticket = cache.begin_fetch().unwrap();
        assert!(cache.complete_fetch(ticket, vec![job("new")]));
        assert_eq!(cache.read().unwrap()[0].id, "new");
    }

    #[test]
    fn test_closed_cache_rejects_results() {
        let cache = JobListCache::new(JobFilter::all(), PageRequest::first(10));
        let ticket = cache.begin_fetch().unwrap();
        cache.close();
        assert!(!cache.complete_fetch(ticket, vec![job("late")]));
        assert!(cache.begin_fetch().is_none());
        assert!(cache.is_closed());
    }
}
