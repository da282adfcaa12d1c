// ==========================================
// 作业列表实时刷新测试
// ==========================================
// 测试目标:
// - 变更通知使缓存失效，下一次读取重新查询
// - 解除绑定后不再触发回调
// - 解除绑定后到达的查询结果被丢弃
// ==========================================


use hr_bulk_import::api::JobStoreAccessor;
use hr_bulk_import::app::{JobListCache, LiveRefreshBinding};
use hr_bulk_import::config::ImportConfigReader;
use hr_bulk_import::domain::{ImportMode, JobChange, JobFilter, PageRequest};
use hr_bulk_import::repository::{
    ImportGateway, JobChangeBroadcaster, JobChangeSource, SubmitRequest,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use test_helpers::{create_local_backend, employee};
use tokio::sync::Notify;

/// 等待回调次数达到预期（最长 2 秒）
async fn wait_for(counter: &AtomicUsize, expected: usize) {
    for _ in 0..200 {
        if counter.load(Ordering::SeqCst) >= expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!(
        "callback count stayed at {}, expected {}",
        counter.load(Ordering::SeqCst),
        expected
    );
}

fn counting_callback() -> (Arc<AtomicUsize>, Arc<dyn Fn() + Send + Sync>) {
    let count = Arc::new(AtomicUsize::new(0));
    let inner = Arc::clone(&count);
    (count, Arc::new(move || {
        inner.fetch_add(1, Ordering::SeqCst);
    }))
}

#[tokio::test]
async fn test_change_invalidates_and_next_read_refetches() {
    let backend = create_local_backend(true);
    let config: Arc<dyn ImportConfigReader> = backend.config.clone();
    let store = JobStoreAccessor::new(backend.gateway.clone(), config);

    let cache = Arc::new(JobListCache::new(JobFilter::all(), PageRequest::first(10)));
    let (count, callback) = counting_callback();
    let mut binding = LiveRefreshBinding::bind_with_callback(
        backend.gateway.as_ref(),
        Arc::clone(&cache),
        callback,
    )
    .unwrap();

    assert!(cache.load(&store).await.unwrap().is_empty());
    assert!(cache.read().is_some());

    backend
        .gateway
        .submit_import(SubmitRequest {
            mode: ImportMode::Employees,
            rows: vec![employee("E1", "Alice")],
            tenant_id: "acme".to_string(),
            dry_run: false,
            row_indexes: Vec::new(),
        })
        .await
        .unwrap();

    // insert + processing + 终态
    wait_for(&count, 3).await;
    assert!(cache.read().is_none());

    let jobs = cache.load(&store).await.unwrap();
    assert_eq!(jobs.len(), 1);

    binding.dispose();
    assert!(!binding.is_active());
}

#[tokio::test]
async fn test_no_callback_after_dispose() {
    let feed = JobChangeBroadcaster::new();
    let cache = Arc::new(JobListCache::new(JobFilter::all(), PageRequest::first(10)));
    let (count, callback) = counting_callback();

    let mut binding =
        LiveRefreshBinding::bind_with_callback(&feed, Arc::clone(&cache), callback).unwrap();

    feed.send(JobChange::inserted("j1"));
    wait_for(&count, 1).await;

    binding.dispose();
    feed.send(JobChange::updated("j1"));
    feed.send(JobChange::deleted("j1"));
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(count.load(Ordering::SeqCst), 1);
    // 监听任务已退出，订阅已释放
    assert_eq!(feed.receiver_count(), 0);
}

#[tokio::test]
async fn test_drop_releases_subscription() {
    let feed = JobChangeBroadcaster::new();
    let cache = Arc::new(JobListCache::new(JobFilter::all(), PageRequest::first(10)));
    let (count, callback) = counting_callback();

    {
        let _binding =
            LiveRefreshBinding::bind_with_callback(&feed, Arc::clone(&cache), callback).unwrap();
        assert_eq!(feed.receiver_count(), 1);
    }

    tokio::time::sleep(Duration::from_millis(50)).await;
    feed.send(JobChange::inserted("j1"));
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(count.load(Ordering::SeqCst), 0);
    assert_eq!(feed.receiver_count(), 0);
    assert!(cache.is_closed());
}

#[tokio::test]
async fn test_response_after_teardown_is_discarded() {
    let backend = create_local_backend(true);
    let cache = Arc::new(JobListCache::new(JobFilter::all(), PageRequest::first(10)));
    let mut binding = LiveRefreshBinding::bind(backend.gateway.as_ref(), Arc::clone(&cache)).unwrap();

    // 模拟在途查询: 先取凭证，销毁后再返回结果
    let ticket = cache.begin_fetch().unwrap();
    let in_flight = backend
        .gateway
        .list_jobs(cache.filter(), cache.page())
        .await
        .unwrap();

    binding.dispose();
    assert!(!cache.complete_fetch(ticket, in_flight));
    assert!(cache.read().is_none());
}

#[tokio::test]
async fn test_invalidation_during_fetch_discards_result() {
    let feed = Arc::new(JobChangeBroadcaster::new());
    let cache = Arc::new(JobListCache::new(JobFilter::all(), PageRequest::first(10)));
    let notified = Arc::new(Notify::new());
    let signal = Arc::clone(&notified);
    let _binding = LiveRefreshBinding::bind_with_callback(
        feed.as_ref() as &dyn JobChangeSource,
        Arc::clone(&cache),
        Arc::new(move || signal.notify_one()),
    )
    .unwrap();

    let ticket = cache.begin_fetch().unwrap();
    feed.send(JobChange::updated("j1"));
    tokio::time::timeout(Duration::from_secs(2), notified.notified())
        .await
        .unwrap();

    assert!(!cache.complete_fetch(ticket, Vec::new()));
    let fresh = cache.begin_fetch().unwrap();
    assert!(cache.complete_fetch(fresh, Vec::new()));
    assert_eq!(cache.read(), Some(Vec::new()));
}

#[tokio::test]
async fn test_callback_can_query_binding_state() {
    let feed = JobChangeBroadcaster::new();
    let cache = Arc::new(JobListCache::new(JobFilter::all(), PageRequest::first(10)));
    let slot: Arc<std::sync::Mutex<Option<LiveRefreshBinding>>> =
        Arc::new(std::sync::Mutex::new(None));
    let seen_active = Arc::new(AtomicUsize::new(0));

    let callback_slot = Arc::clone(&slot);
    let callback_seen = Arc::clone(&seen_active);
    let binding = LiveRefreshBinding::bind_with_callback(
        &feed,
        Arc::clone(&cache),
        Arc::new(move || {
            if let Some(binding) = callback_slot.lock().unwrap().as_ref() {
                if binding.is_active() {
                    callback_seen.fetch_add(1, Ordering::SeqCst);
                }
            }
        }),
    )
    .unwrap();
    *slot.lock().unwrap() = Some(binding);

    feed.send(JobChange::inserted("j1"));
    wait_for(&seen_active, 1).await;

    let binding = slot.lock().unwrap().take();
    drop(binding);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(feed.receiver_count(), 0);
}
