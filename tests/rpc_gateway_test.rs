// ==========================================
// 托管后端网关测试
// ==========================================
// 测试目标: HTTP 约定（路径 / 查询参数 / 请求头 / 请求体）与边界校验
// ==========================================

use hr_bulk_import::api::{ApiError, ImportSubmissionClient, RetryClient};
use hr_bulk_import::app::AppState;
use hr_bulk_import::config::BackendSettings;
use hr_bulk_import::context::ImportContext;
use hr_bulk_import::domain::{
    ImportMode, JobChange, JobFilter, JobStatus, PageRequest, ParsedSheet, RowQuery,
};
use hr_bulk_import::i18n::Lang;
use hr_bulk_import::repository::{
    GatewayError, ImportGateway, JobChangeBroadcaster, RpcImportGateway, SubmitRequest,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn gateway(server: &MockServer) -> RpcImportGateway {
    let settings = BackendSettings::new(server.uri(), "anon-key").with_access_token("user-jwt");
    RpcImportGateway::new(settings).unwrap()
}

fn job_json(id: &str, status: &str) -> serde_json::Value {
    json!({
        "id": id,
        "mode": "gov",
        "status": status,
        "total_rows": 2,
        "processed_rows": 2,
        "success_rows": 2,
        "failed_rows": 0,
        "created_at": "2026-05-01T08:00:00Z",
        "finished_at": "2026-05-01T08:00:03Z"
    })
}

#[tokio::test]
async fn submit_posts_to_edge_function() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/functions/v1/process-import"))
        .and(header("apikey", "anon-key"))
        .and(header("authorization", "Bearer user-jwt"))
        .and(body_json(json!({
            "mode": "employees",
            "rows": [{"employee_no": "E1"}],
            "tenant_id": "acme",
            "dry_run": false
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"job_id": "job-77"})))
        .expect(1)
        .mount(&server)
        .await;

    let gw = gateway(&server);
    let ack = gw
        .submit_import(SubmitRequest {
            mode: ImportMode::Employees,
            rows: vec![json!({"employee_no": "E1"}).as_object().cloned().unwrap()],
            tenant_id: "acme".to_string(),
            dry_run: false,
            row_indexes: Vec::new(),
        })
        .await
        .unwrap();

    assert_eq!(ack.job_id.as_deref(), Some("job-77"));
    assert_eq!(ack.total_rows, 1);
}

#[tokio::test]
async fn submit_rejection_keeps_remote_message() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/functions/v1/process-import"))
        .respond_with(
            ResponseTemplate::new(403)
                .set_body_json(json!({"error": "tenant acme may not import gov records"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = ImportSubmissionClient::new(Arc::new(gateway(&server)));
    let ctx = ImportContext::for_tenant("acme", Lang::En);
    let err = client
        .submit(
            &ctx,
            vec![json!({"national_id": "1"}).as_object().cloned().unwrap()],
            ImportMode::Gov,
            false,
        )
        .await
        .unwrap_err();

    match err {
        ApiError::Submission(message) => {
            assert_eq!(message, "tenant acme may not import gov records")
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn list_jobs_uses_rest_filters() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/import_jobs"))
        .and(query_param("select", "*"))
        .and(query_param("status", "eq.succeeded"))
        .and(query_param("mode", "eq.gov"))
        .and(query_param("order", "created_at.desc"))
        .and(query_param("limit", "25"))
        .and(query_param("offset", "25"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([
                job_json("j2", "succeeded"),
                job_json("j1", "succeeded")
            ])),
        )
        .mount(&server)
        .await;

    let gw = gateway(&server);
    let filter = JobFilter::all()
        .with_status(JobStatus::Succeeded)
        .with_mode(ImportMode::Gov);
    let jobs = gw
        .list_jobs(&filter, PageRequest::first(25).next())
        .await
        .unwrap();

    // 顺序保持远程返回的顺序
    assert_eq!(
        jobs.iter().map(|j| j.id.as_str()).collect::<Vec<_>>(),
        vec!["j2", "j1"]
    );
}

#[tokio::test]
async fn list_jobs_rejects_invalid_payload() {
    let server = MockServer::start().await;

    let mut broken = job_json("j1", "succeeded");
    broken["success_rows"] = json!(5);
    Mock::given(method("GET"))
        .and(path("/rest/v1/import_jobs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([broken])))
        .mount(&server)
        .await;

    let err = gateway(&server)
        .list_jobs(&JobFilter::all(), PageRequest::first(10))
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::Schema(_)));
}

#[tokio::test]
async fn list_rows_error_filter() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/import_rows"))
        .and(query_param("job_id", "eq.j1"))
        .and(query_param("error", "not.is.null"))
        .and(query_param("order", "row_index.asc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": 9,
            "job_id": "j1",
            "row_index": 4,
            "raw": {"national_id": ""},
            "normalized": null,
            "error": "missing required field: national_id",
            "created_at": "2026-05-01T08:00:00Z"
        }])))
        .mount(&server)
        .await;

    let rows = gateway(&server)
        .list_rows("j1", &RowQuery::errors(PageRequest::first(50)))
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id, "9");
    assert_eq!(rows[0].row_index, 4);
}

#[tokio::test]
async fn retry_calls_rpc_with_row_ids() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/rpc/retry_import_job"))
        .and(body_json(json!({"p_job_id": "j1", "p_row_ids": ["r1", "r2"]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"job_id": "j1"})))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/rpc/retry_import_job"))
        .and(body_json(json!({"p_job_id": "j1", "p_row_ids": null})))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let client = RetryClient::new(Arc::new(gateway(&server)));
    let ids = vec!["r1".to_string(), "r2".to_string()];
    let ack = client.retry("j1", Some(ids.as_slice())).await.unwrap();
    assert_eq!(ack.retried_rows, 2);
    assert_eq!(ack.job_id.as_deref(), Some("j1"));

    let ack = client.retry("j1", None).await.unwrap();
    assert_eq!(ack.job_id, None);
}

#[tokio::test]
async fn retry_rejection_keeps_remote_message() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/rpc/retry_import_job"))
        .respond_with(ResponseTemplate::new(409).set_body_string("job is still processing"))
        .mount(&server)
        .await;

    let client = RetryClient::new(Arc::new(gateway(&server)));
    let err = client.retry("j1", None).await.unwrap_err();
    assert_eq!(err.to_string(), "job is still processing");
}

#[tokio::test]
async fn submit_sheet_sends_source_positions() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/functions/v1/process-import"))
        .and(body_json(json!({
            "mode": "employees",
            "rows": [{"employee_no": "E1"}, {"employee_no": "E3"}],
            "tenant_id": "acme",
            "dry_run": true,
            "row_indexes": [1, 3]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "errors": [{"row_index": 3, "error": "missing required field: full_name"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let sheet = ParsedSheet {
        sheet_name: "staff".to_string(),
        header: vec!["employee_no".to_string()],
        rows: vec![
            json!({"employee_no": "E1"}).as_object().cloned().unwrap(),
            json!({"employee_no": "E3"}).as_object().cloned().unwrap(),
        ],
        row_indexes: vec![1, 3],
    };

    let client = ImportSubmissionClient::new(Arc::new(gateway(&server)));
    let ctx = ImportContext::for_tenant("acme", Lang::En);
    let ack = client
        .submit_sheet(&ctx, sheet, ImportMode::Employees, true)
        .await
        .unwrap();
    assert_eq!(ack.row_errors.len(), 1);
    assert_eq!(ack.row_errors[0].row_index, 3);
}

#[tokio::test]
async fn remote_app_state_refreshes_bound_job_list() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/import_jobs"))
        .and(query_param("limit", "50"))
        .and(query_param("offset", "0"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([job_json("j1", "succeeded")])),
        )
        .expect(2)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("remote.db").to_string_lossy().to_string();
    let settings = BackendSettings::new(server.uri(), "anon-key");
    let feed = Arc::new(JobChangeBroadcaster::new());

    let state = AppState::new_remote(db_path, settings, feed.clone()).unwrap();
    assert!(state.local_backend.is_none());

    let cache = state.job_list(JobFilter::all());
    let notified = Arc::new(Notify::new());
    let signal = Arc::clone(&notified);
    let mut binding = state
        .bind_job_list(Arc::clone(&cache), Some(Arc::new(move || signal.notify_one())))
        .unwrap();

    let jobs = cache.load(&state.job_store).await.unwrap();
    assert_eq!(jobs.len(), 1);
    // 缓存命中，不再请求
    assert_eq!(cache.load(&state.job_store).await.unwrap(), jobs);

    feed.send(JobChange::updated("j1"));
    tokio::time::timeout(Duration::from_secs(2), notified.notified())
        .await
        .unwrap();
    assert!(cache.read().is_none());

    let reloaded = cache.load(&state.job_store).await.unwrap();
    assert_eq!(reloaded[0].id, "j1");

    binding.dispose();
    assert!(!binding.is_active());
}
