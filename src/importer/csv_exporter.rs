// ==========================================
// 人力资源批量导入 - CSV 导出器
// ==========================================
// 表头: row_index, raw 中出现过的全部列（首次出现顺序）, error
// 转义: 含逗号/双引号/换行的字段加双引号，内部双引号加倍
// 输出确定: 相同输入产生逐字节相同的输出
// ==========================================

use crate::domain::{ImportRow, RowRecord};
use crate::importer::error::ExportError;
use csv::{QuoteStyle, Terminator, WriterBuilder};
use serde_json::Value;

/// 导出行（ImportRow 的子集）
#[derive(Debug, Clone, PartialEq)]
pub struct ExportRow {
    pub row_index: u64,
    pub raw: RowRecord,
    pub error: Option<String>,
}

impl From<&ImportRow> for ExportRow {
    fn from(row: &ImportRow) -> Self {
        Self {
            row_index: row.row_index,
            raw: row.raw.clone(),
            error: row.error.clone(),
        }
    }
}

pub struct CsvExporter;

impl CsvExporter {
    /// 导出为 CSV 文本
    pub fn export(&self, rows: &[ExportRow]) -> Result<String, ExportError> {
        let columns = union_columns(rows);

        let mut writer = WriterBuilder::new()
            .quote_style(QuoteStyle::Necessary)
            .terminator(Terminator::Any(b'\n'))
            .from_writer(Vec::new());

        let mut header = Vec::with_capacity(columns.len() + 2);
        header.push("row_index");
        header.extend(columns.iter().map(String::as_str));
        header.push("error");
        writer.write_record(&header)?;

        for row in rows {
            let mut record = Vec::with_capacity(columns.len() + 2);
            record.push(row.row_index.to_string());
            for column in &columns {
                record.push(row.raw.get(column).map(render_value).unwrap_or_default());
            }
            record.push(row.error.clone().unwrap_or_default());
            writer.write_record(&record)?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| ExportError::Flush(e.to_string()))?;

        tracing::debug!(rows = rows.len(), columns = columns.len(), "CSV 导出完成");
        Ok(String::from_utf8(bytes)?)
    }

    /// 直接导出 ImportRow 列表
    pub fn export_rows(&self, rows: &[ImportRow]) -> Result<String, ExportError> {
        let export_rows: Vec<ExportRow> = rows.iter().map(ExportRow::from).collect();
        self.export(&export_rows)
    }
}

/// 所有行 raw 列名的并集（首次出现顺序）
fn union_columns(rows: &[ExportRow]) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for row in rows {
        for key in row.raw.keys() {
            if !columns.iter().any(|c| c == key) {
                columns.push(key.clone());
            }
        }
    }
    columns
}

/// 字段值渲染: null → 空字符串，字符串原样，其余按 JSON 文本
fn render_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
