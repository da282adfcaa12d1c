// ==========================================
// 人力资源批量导入 - 内嵌导入后端
// ==========================================
// 职责: 在本地 SQLite 上实现远程导入约定（离线运行 / 全流程测试）
// 状态: queued → processing → succeeded | failed | partial
// 红线:
// - 行结果只写一次（processed=0 才能写入）
// - 重试创建新作业（retry_of 指向原作业），原作业的行不被修改
// - 试运行不写库
// ==========================================

use crate::db::{configure_sqlite_connection, open_sqlite_connection};
use crate::domain::{
    ImportJob, ImportMode, ImportRow, JobChange, JobFilter, JobStatus, PageRequest, RetryAck,
    RowOutcome, RowQuery, RowRecord, SubmissionAck,
};
use crate::importer::RowValidator;
use crate::repository::change_feed::JobChangeBroadcaster;
use crate::repository::error::{GatewayError, GatewayResult};
use crate::repository::import_gateway::{ImportGateway, JobChangeSource, SubmitRequest};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::broadcast;
use uuid::Uuid;

const JOB_COLUMNS: &str = "job_id, mode, status, total_rows, processed_rows, success_rows, \
                           failed_rows, created_at, finished_at";

const ROW_COLUMNS: &str = "row_id, job_id, row_index, raw_json, normalized_json, error, created_at";

fn format_ts(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_ts(idx: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn conversion_error(idx: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, message.into())
}

fn map_job_row(row: &Row) -> rusqlite::Result<ImportJob> {
    let mode_raw: String = row.get(1)?;
    let status_raw: String = row.get(2)?;
    let created_raw: String = row.get(7)?;
    let finished_raw: Option<String> = row.get(8)?;

    Ok(ImportJob {
        id: row.get(0)?,
        mode: ImportMode::parse(&mode_raw)
            .ok_or_else(|| conversion_error(1, format!("unknown import mode '{}'", mode_raw)))?,
        status: JobStatus::parse(&status_raw)
            .ok_or_else(|| conversion_error(2, format!("unknown job status '{}'", status_raw)))?,
        total_rows: row.get::<_, i64>(3)?.max(0) as u64,
        processed_rows: row.get::<_, i64>(4)?.max(0) as u64,
        success_rows: row.get::<_, i64>(5)?.max(0) as u64,
        failed_rows: row.get::<_, i64>(6)?.max(0) as u64,
        created_at: parse_ts(7, &created_raw)?,
        finished_at: finished_raw.as_deref().map(|s| parse_ts(8, s)).transpose()?,
    })
}

fn parse_record(idx: usize, raw: &str) -> rusqlite::Result<RowRecord> {
    serde_json::from_str::<RowRecord>(raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn map_import_row(row: &Row) -> rusqlite::Result<ImportRow> {
    let raw_json: String = row.get(3)?;
    let normalized_json: Option<String> = row.get(4)?;
    let created_raw: String = row.get(6)?;

    Ok(ImportRow {
        id: row.get(0)?,
        job_id: row.get(1)?,
        row_index: row.get::<_, i64>(2)?.max(0) as u64,
        raw: parse_record(3, &raw_json)?,
        normalized: normalized_json
            .as_deref()
            .map(|s| parse_record(4, s))
            .transpose()?,
        error: row.get(5)?,
        created_at: parse_ts(6, &created_raw)?,
    })
}

// ==========================================
// LocalImportGateway
// ==========================================
pub struct LocalImportGateway {
    conn: Arc<Mutex<Connection>>,
    validator: Arc<dyn RowValidator>,
    changes: JobChangeBroadcaster,
    auto_process: bool,
}

impl LocalImportGateway {
    /// 创建新的内嵌后端实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径（需已执行 init_schema）
    /// - validator: 行级校验器
    pub fn new(db_path: &str, validator: Arc<dyn RowValidator>) -> GatewayResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self::build(Arc::new(Mutex::new(conn)), validator))
    }

    /// 从已有连接创建（与 ConfigManager 共享连接）
    pub fn from_connection(
        conn: Arc<Mutex<Connection>>,
        validator: Arc<dyn RowValidator>,
    ) -> GatewayResult<Self> {
        {
            let guard = conn
                .lock()
                .map_err(|e| GatewayError::Lock(e.to_string()))?;
            configure_sqlite_connection(&guard)?;
        }
        Ok(Self::build(conn, validator))
    }

    fn build(conn: Arc<Mutex<Connection>>, validator: Arc<dyn RowValidator>) -> Self {
        Self {
            conn,
            validator,
            changes: JobChangeBroadcaster::new(),
            auto_process: true,
        }
    }

    /// 提交/重试后是否立即处理（关闭后作业停留在 queued，由 process_job 驱动）
    pub fn with_auto_process(mut self, auto_process: bool) -> Self {
        self.auto_process = auto_process;
        self
    }

    pub fn changes(&self) -> &JobChangeBroadcaster {
        &self.changes
    }

    fn lock(&self) -> GatewayResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| GatewayError::Lock(e.to_string()))
    }

    // ==========================================
    // 查询
    // ==========================================

    fn get_job_locked(conn: &Connection, job_id: &str) -> GatewayResult<Option<ImportJob>> {
        let sql = format!("SELECT {} FROM import_job WHERE job_id = ?1", JOB_COLUMNS);
        Ok(conn
            .query_row(&sql, params![job_id], map_job_row)
            .optional()?)
    }

    /// 查询单个作业
    pub fn get_job(&self, job_id: &str) -> GatewayResult<Option<ImportJob>> {
        let conn = self.lock()?;
        Self::get_job_locked(&conn, job_id)
    }

    /// 查询作业所属租户
    pub fn get_job_tenant(&self, job_id: &str) -> GatewayResult<Option<String>> {
        let conn = self.lock()?;
        Ok(conn
            .query_row(
                "SELECT tenant_id FROM import_job WHERE job_id = ?1",
                params![job_id],
                |row| row.get(0),
            )
            .optional()?)
    }

    /// 查询重试来源作业
    pub fn get_retry_origin(&self, job_id: &str) -> GatewayResult<Option<String>> {
        let conn = self.lock()?;
        let origin: Option<Option<String>> = conn
            .query_row(
                "SELECT retry_of FROM import_job WHERE job_id = ?1",
                params![job_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(origin.flatten())
    }

    // ==========================================
    // 写入
    // ==========================================

    /// 在事务中创建 queued 作业及其行
    fn insert_job_tx(
        tx: &Transaction,
        tenant_id: &str,
        mode: ImportMode,
        rows: &[(u64, RowRecord)],
        retry_of: Option<&str>,
    ) -> GatewayResult<String> {
        let job_id = Uuid::new_v4().to_string();
        let now = format_ts(Utc::now());

        tx.execute(
            r#"
            INSERT INTO import_job (
                job_id, tenant_id, mode, status, total_rows,
                processed_rows, success_rows, failed_rows, retry_of, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, 0, 0, 0, ?6, ?7)
            "#,
            params![
                job_id,
                tenant_id,
                mode.as_str(),
                JobStatus::Queued.as_str(),
                rows.len() as i64,
                retry_of,
                now,
            ],
        )?;

        let mut stmt = tx.prepare(
            r#"
            INSERT INTO import_row (row_id, job_id, row_index, raw_json, processed, created_at)
            VALUES (?1, ?2, ?3, ?4, 0, ?5)
            "#,
        )?;
        for (row_index, raw) in rows {
            stmt.execute(params![
                Uuid::new_v4().to_string(),
                job_id,
                *row_index as i64,
                serde_json::to_string(raw)?,
                now,
            ])?;
        }

        Ok(job_id)
    }

    fn set_status_locked(
        conn: &Connection,
        job: &ImportJob,
        next: JobStatus,
    ) -> GatewayResult<()> {
        if !job.status.can_transition_to(next) {
            return Err(GatewayError::Database(format!(
                "invalid status transition for job {}: {} -> {}",
                job.id, job.status, next
            )));
        }
        conn.execute(
            "UPDATE import_job SET status = ?2 WHERE job_id = ?1 AND status = ?3",
            params![job.id, next.as_str(), job.status.as_str()],
        )?;
        Ok(())
    }

    /// 处理一个作业（校验未处理的行并推进到终态）
    ///
    /// # 说明
    /// - 已是终态的作业直接返回，不重复处理
    /// - 每行结果只写一次
    pub fn process_job(&self, job_id: &str) -> GatewayResult<ImportJob> {
        let mut conn = self.lock()?;

        let job = Self::get_job_locked(&conn, job_id)?.ok_or_else(|| GatewayError::NotFound {
            entity: "ImportJob".to_string(),
            id: job_id.to_string(),
        })?;
        if job.is_terminal() {
            return Ok(job);
        }

        let pending: Vec<(String, RowRecord)> = {
            let mut stmt = conn.prepare(
                "SELECT row_id, raw_json FROM import_row
                 WHERE job_id = ?1 AND processed = 0 ORDER BY row_index ASC",
            )?;
            let rows = stmt.query_map(params![job_id], |row| {
                let raw: String = row.get(1)?;
                Ok((row.get::<_, String>(0)?, parse_record(1, &raw)?))
            })?;
            rows.collect::<rusqlite::Result<Vec<_>>>()?
        };

        let records: Vec<RowRecord> = pending.iter().map(|(_, raw)| raw.clone()).collect();
        let verdicts = self.validator.validate_rows(job.mode, &records);
        if verdicts.len() != pending.len() {
            return Err(GatewayError::Database(format!(
                "validator returned {} verdicts for {} rows",
                verdicts.len(),
                pending.len()
            )));
        }

        // 校验结果确定后才离开 queued
        let mut job = job;
        if job.status == JobStatus::Queued {
            Self::set_status_locked(&conn, &job, JobStatus::Processing)?;
            job.status = JobStatus::Processing;
            self.changes.send(JobChange::updated(job_id));
        }

        let tx = conn.transaction()?;
        let (mut ok, mut failed) = (0u64, 0u64);
        {
            let mut stmt = tx.prepare(
                "UPDATE import_row SET normalized_json = ?2, error = ?3, processed = 1
                 WHERE row_id = ?1 AND processed = 0",
            )?;
            for ((row_id, _), verdict) in pending.iter().zip(verdicts.iter()) {
                let normalized = verdict
                    .normalized
                    .as_ref()
                    .map(serde_json::to_string)
                    .transpose()?;
                let changed = stmt.execute(params![row_id, normalized, verdict.error])?;
                if changed == 0 {
                    continue;
                }
                if verdict.error.is_some() {
                    failed += 1;
                } else {
                    ok += 1;
                }
            }
        }

        let processed_rows = job.processed_rows + ok + failed;
        let success_rows = job.success_rows + ok;
        let failed_rows = job.failed_rows + failed;
        let terminal = JobStatus::terminal_for(success_rows, failed_rows);
        if !job.status.can_transition_to(terminal) {
            return Err(GatewayError::Database(format!(
                "invalid status transition for job {}: {} -> {}",
                job.id, job.status, terminal
            )));
        }

        tx.execute(
            r#"
            UPDATE import_job
            SET processed_rows = ?2, success_rows = ?3, failed_rows = ?4,
                status = ?5, finished_at = COALESCE(finished_at, ?6)
            WHERE job_id = ?1
            "#,
            params![
                job_id,
                processed_rows as i64,
                success_rows as i64,
                failed_rows as i64,
                terminal.as_str(),
                format_ts(Utc::now()),
            ],
        )?;
        tx.commit()?;

        let finished = Self::get_job_locked(&conn, job_id)?.ok_or_else(|| GatewayError::NotFound {
            entity: "ImportJob".to_string(),
            id: job_id.to_string(),
        })?;
        drop(conn);

        tracing::info!(
            job_id = %finished.id,
            status = %finished.status,
            success_rows = finished.success_rows,
            failed_rows = finished.failed_rows,
            "导入作业处理完成"
        );
        self.changes.send(JobChange::updated(job_id));
        Ok(finished)
    }

    /// 处理所有 queued 作业（按创建顺序）
    ///
    /// # 返回
    /// - 处理的作业数
    pub fn process_queued(&self) -> GatewayResult<usize> {
        let queued: Vec<String> = {
            let conn = self.lock()?;
            let mut stmt = conn.prepare(
                "SELECT job_id FROM import_job WHERE status = ?1 ORDER BY created_at ASC, rowid ASC",
            )?;
            let ids = stmt.query_map(params![JobStatus::Queued.as_str()], |row| row.get(0))?;
            ids.collect::<rusqlite::Result<Vec<String>>>()?
        };

        for job_id in &queued {
            self.process_job(job_id)?;
        }
        Ok(queued.len())
    }

    /// 删除作业（行级联删除）
    ///
    /// # 返回
    /// - true: 已删除
    /// - false: 作业不存在
    pub fn delete_job(&self, job_id: &str) -> GatewayResult<bool> {
        let deleted = {
            let conn = self.lock()?;
            conn.execute("DELETE FROM import_job WHERE job_id = ?1", params![job_id])?
        };

        if deleted > 0 {
            tracing::info!(job_id = %job_id, "导入作业已删除");
            self.changes.send(JobChange::deleted(job_id));
        }
        Ok(deleted > 0)
    }

    fn dry_run(&self, request: &SubmitRequest) -> SubmissionAck {
        let verdicts = self.validator.validate_rows(request.mode, &request.rows);
        let row_errors = verdicts
            .into_iter()
            .enumerate()
            .filter(|(_, v)| v.error.is_some())
            .map(|(i, v)| RowOutcome {
                row_index: request.row_index_at(i),
                error: v.error,
            })
            .collect();

        SubmissionAck {
            job_id: None,
            dry_run: true,
            total_rows: request.rows.len() as u64,
            row_errors,
        }
    }
}

#[async_trait]
impl ImportGateway for LocalImportGateway {
    async fn submit_import(&self, request: SubmitRequest) -> GatewayResult<SubmissionAck> {
        if request.tenant_id.trim().is_empty() {
            return Err(GatewayError::Remote {
                status: 400,
                message: "tenant_id is required".to_string(),
            });
        }

        if let Err(message) = request.check_row_indexes() {
            return Err(GatewayError::Remote {
                status: 400,
                message,
            });
        }

        if request.dry_run {
            return Ok(self.dry_run(&request));
        }

        let total_rows = request.rows.len() as u64;
        let positions: Vec<u64> = (0..request.rows.len())
            .map(|i| request.row_index_at(i))
            .collect();
        let indexed: Vec<(u64, RowRecord)> = positions.into_iter().zip(request.rows).collect();

        let job_id = {
            let mut conn = self.lock()?;
            let tx = conn.transaction()?;
            let job_id = Self::insert_job_tx(&tx, &request.tenant_id, request.mode, &indexed, None)?;
            tx.commit()?;
            job_id
        };

        tracing::info!(job_id = %job_id, mode = %request.mode, total_rows, "导入作业已创建");
        self.changes.send(JobChange::inserted(&job_id));

        if self.auto_process {
            self.process_job(&job_id)?;
        }

        Ok(SubmissionAck {
            job_id: Some(job_id),
            dry_run: false,
            total_rows,
            row_errors: Vec::new(),
        })
    }

    async fn list_jobs(
        &self,
        filter: &JobFilter,
        page: PageRequest,
    ) -> GatewayResult<Vec<ImportJob>> {
        let conn = self.lock()?;
        let sql = format!(
            "SELECT {} FROM import_job
             WHERE (?1 IS NULL OR status = ?1) AND (?2 IS NULL OR mode = ?2)
             ORDER BY created_at DESC, rowid DESC
             LIMIT ?3 OFFSET ?4",
            JOB_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let jobs = stmt.query_map(
            params![
                filter.status.map(|s| s.as_str()),
                filter.mode.map(|m| m.as_str()),
                page.limit as i64,
                page.offset as i64,
            ],
            map_job_row,
        )?;
        Ok(jobs.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    async fn list_rows(&self, job_id: &str, query: &RowQuery) -> GatewayResult<Vec<ImportRow>> {
        let conn = self.lock()?;
        let sql = format!(
            "SELECT {} FROM import_row
             WHERE job_id = ?1 AND (?2 = 0 OR error IS NOT NULL)
             ORDER BY row_index ASC
             LIMIT ?3 OFFSET ?4",
            ROW_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(
            params![
                job_id,
                query.only_errors as i64,
                query.page.limit as i64,
                query.page.offset as i64,
            ],
            map_import_row,
        )?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    async fn retry_job(&self, job_id: &str, row_ids: &[String]) -> GatewayResult<RetryAck> {
        let (new_job_id, retried_rows) = {
            let mut conn = self.lock()?;

            let (tenant_id, mode_raw): (String, String) = conn
                .query_row(
                    "SELECT tenant_id, mode FROM import_job WHERE job_id = ?1",
                    params![job_id],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?
                .ok_or_else(|| GatewayError::NotFound {
                    entity: "ImportJob".to_string(),
                    id: job_id.to_string(),
                })?;
            let mode = ImportMode::parse(&mode_raw)
                .ok_or_else(|| GatewayError::Database(format!("unknown import mode '{}'", mode_raw)))?;

            let all_rows: Vec<(String, u64, RowRecord)> = {
                let mut stmt = conn.prepare(
                    "SELECT row_id, row_index, raw_json FROM import_row
                     WHERE job_id = ?1 ORDER BY row_index ASC",
                )?;
                let rows = stmt.query_map(params![job_id], |row| {
                    let raw: String = row.get(2)?;
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, i64>(1)?.max(0) as u64,
                        parse_record(2, &raw)?,
                    ))
                })?;
                rows.collect::<rusqlite::Result<Vec<_>>>()?
            };

            let selected: Vec<(u64, RowRecord)> = if row_ids.is_empty() {
                all_rows
                    .into_iter()
                    .map(|(_, index, raw)| (index, raw))
                    .collect()
            } else {
                if let Some(unknown) = row_ids
                    .iter()
                    .find(|id| !all_rows.iter().any(|(row_id, _, _)| row_id == *id))
                {
                    return Err(GatewayError::NotFound {
                        entity: "ImportRow".to_string(),
                        id: unknown.clone(),
                    });
                }
                all_rows
                    .into_iter()
                    .filter(|(row_id, _, _)| row_ids.contains(row_id))
                    .map(|(_, index, raw)| (index, raw))
                    .collect()
            };

            let tx = conn.transaction()?;
            let new_job_id = Self::insert_job_tx(&tx, &tenant_id, mode, &selected, Some(job_id))?;
            tx.commit()?;

            tracing::info!(
                job_id = %job_id,
                retry_job_id = %new_job_id,
                retried_rows = selected.len(),
                "重试作业已创建"
            );
            (new_job_id, selected.len() as u64)
        };

        self.changes.send(JobChange::inserted(&new_job_id));

        if self.auto_process {
            self.process_job(&new_job_id)?;
        }

        Ok(RetryAck {
            job_id: Some(new_job_id),
            retried_rows,
        })
    }
}

impl JobChangeSource for LocalImportGateway {
    fn subscribe(&self) -> broadcast::Receiver<JobChange> {
        self.changes.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_schema;
    use crate::importer::RequiredColumnsValidator;
    use serde_json::json;
    use std::collections::HashMap;

    fn gateway(auto_process: bool) -> LocalImportGateway {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        let mut required = HashMap::new();
        required.insert(ImportMode::Employees, vec!["employee_no".to_string()]);
        required.insert(ImportMode::Gov, vec!["national_id".to_string()]);
        let validator = Arc::new(RequiredColumnsValidator::new(required));
        LocalImportGateway::from_connection(Arc::new(Mutex::new(conn)), validator)
            .unwrap()
            .with_auto_process(auto_process)
    }

    fn record(value: serde_json::Value) -> RowRecord {
        value.as_object().cloned().unwrap()
    }

    fn request(rows: Vec<RowRecord>, dry_run: bool) -> SubmitRequest {
        SubmitRequest {
            mode: ImportMode::Employees,
            rows,
            tenant_id: "acme".to_string(),
            dry_run,
            row_indexes: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_submit_and_process() {
        let gw = gateway(false);
        let ack = gw
            .submit_import(request(
                vec![
                    record(json!({"employee_no": "E1"})),
                    record(json!({"employee_no": ""})),
                ],
                false,
            ))
            .await
            .unwrap();
        let job_id = ack.job_id.unwrap();

        let queued = gw.get_job(&job_id).unwrap().unwrap();
        assert_eq!(queued.status, JobStatus::Queued);
        assert_eq!(queued.total_rows, 2);
        assert!(queued.finished_at.is_none());

        let done = gw.process_job(&job_id).unwrap();
        assert_eq!(done.status, JobStatus::Partial);
        assert_eq!((done.processed_rows, done.success_rows, done.failed_rows), (2, 1, 1));
        assert!(done.validate().is_ok());

        // 终态作业再次处理不改变任何内容
        let again = gw.process_job(&job_id).unwrap();
        assert_eq!(again, done);
        assert_eq!(gw.get_job_tenant(&job_id).unwrap().as_deref(), Some("acme"));
    }

    #[tokio::test]
    async fn test_dry_run_writes_nothing() {
        let gw = gateway(true);
        let ack = gw
            .submit_import(request(
                vec![record(json!({"employee_no": "E1"})), record(json!({"x": 1}))],
                true,
            ))
            .await
            .unwrap();

        assert!(ack.dry_run);
        assert_eq!(ack.job_id, None);
        assert_eq!(ack.row_errors.len(), 1);
        assert_eq!(ack.row_errors[0].row_index, 2);
        assert!(gw
            .list_jobs(&JobFilter::all(), PageRequest::first(10))
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_source_positions_are_kept() {
        let gw = gateway(true);
        let mut req = request(
            vec![
                record(json!({"employee_no": "E1"})),
                record(json!({"employee_no": ""})),
            ],
            true,
        );
        req.row_indexes = vec![1, 3];

        let ack = gw.submit_import(req.clone()).await.unwrap();
        assert_eq!(ack.row_errors.len(), 1);
        assert_eq!(ack.row_errors[0].row_index, 3);

        req.dry_run = false;
        let job_id = gw.submit_import(req).await.unwrap().job_id.unwrap();
        let failed = gw
            .list_rows(&job_id, &RowQuery::errors(PageRequest::first(10)))
            .await
            .unwrap();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].row_index, 3);
    }

    #[tokio::test]
    async fn test_mismatched_positions_rejected() {
        let gw = gateway(true);
        let mut req = request(vec![record(json!({"employee_no": "E1"}))], false);
        req.row_indexes = vec![1, 2];

        let err = gw.submit_import(req).await.unwrap_err();
        assert!(matches!(err, GatewayError::Remote { status: 400, .. }));
    }

    /// 返回的结论数量与行数不符
    struct ShortValidator;

    impl RowValidator for ShortValidator {
        fn validate_rows(&self, _: ImportMode, _: &[RowRecord]) -> Vec<crate::importer::RowVerdict> {
            Vec::new()
        }
    }

    #[tokio::test]
    async fn test_bad_validator_leaves_job_queued() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        let gw = LocalImportGateway::from_connection(
            Arc::new(Mutex::new(conn)),
            Arc::new(ShortValidator),
        )
        .unwrap()
        .with_auto_process(false);

        let job_id = gw
            .submit_import(request(vec![record(json!({"employee_no": "E1"}))], false))
            .await
            .unwrap()
            .job_id
            .unwrap();

        let mut rx = gw.subscribe();
        assert!(matches!(
            gw.process_job(&job_id),
            Err(GatewayError::Database(_))
        ));

        let job = gw.get_job(&job_id).unwrap().unwrap();
        assert_eq!(job.status, JobStatus::Queued);
        assert_eq!(job.processed_rows, 0);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_retry_unknown_job() {
        let gw = gateway(true);
        let err = gw.retry_job("missing", &[]).await.unwrap_err();
        assert!(matches!(err, GatewayError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_delete_job_publishes_change() {
        let gw = gateway(true);
        let ack = gw
            .submit_import(request(vec![record(json!({"employee_no": "E1"}))], false))
            .await
            .unwrap();
        let job_id = ack.job_id.unwrap();

        let mut rx = gw.subscribe();
        assert!(gw.delete_job(&job_id).unwrap());
        assert_eq!(rx.recv().await.unwrap(), JobChange::deleted(&job_id));
        assert!(!gw.delete_job(&job_id).unwrap());

        let rows = gw
            .list_rows(&job_id, &RowQuery::all(PageRequest::first(10)))
            .await
            .unwrap();
        assert!(rows.is_empty());
    }
}
