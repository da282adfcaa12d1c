// ==========================================
// 人力资源批量导入 - 文件解析器
// ==========================================
// 支持: Excel (.xlsx/.xlsm/.xlsb/.xls) / ODS / CSV
// 规则: 首行为表头，其余行按位置映射到表头
//       无数据行的工作表整体跳过
// ==========================================

use crate::domain::{ParsedSheet, RowRecord};
use crate::importer::error::{ParseError, ParseResult};
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use csv::ReaderBuilder;
use serde_json::{Number, Value};
use std::collections::HashSet;
use std::io::Cursor;
use std::path::Path;

/// 工作簿类扩展名（由 calamine 自动识别格式）
const WORKBOOK_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xlsb", "xls", "ods"];

/// 整数浮点数安全范围（超出后按浮点输出）
const MAX_EXACT_FLOAT: f64 = 9_007_199_254_740_992.0;

// ==========================================
// WorkbookParser
// ==========================================
pub struct WorkbookParser;

impl WorkbookParser {
    /// 从文件路径解析
    ///
    /// # 返回
    /// - Ok(Vec<ParsedSheet>): 每个含数据行的工作表一项
    /// - Err(ParseError): 任意读取失败，不返回部分结果
    pub fn parse_path<P: AsRef<Path>>(&self, file_path: P) -> ParseResult<Vec<ParsedSheet>> {
        let path = file_path.as_ref();

        if !path.exists() {
            return Err(ParseError::FileNotFound(path.display().to_string()));
        }

        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();

        // 一次性读入内存
        let bytes = std::fs::read(path)?;
        self.parse_bytes(&file_name, bytes)
    }

    /// 从内存中的文件内容解析（上传场景）
    ///
    /// # 参数
    /// - file_name: 原始文件名（用于判断格式与 CSV 工作表名）
    /// - bytes: 文件完整内容
    pub fn parse_bytes(&self, file_name: &str, bytes: Vec<u8>) -> ParseResult<Vec<ParsedSheet>> {
        let ext = Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        let sheets = match ext.as_str() {
            "csv" => {
                let sheet_name = Path::new(file_name)
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .unwrap_or("Sheet1");
                parse_csv(sheet_name, &bytes)?.into_iter().collect()
            }
            e if WORKBOOK_EXTENSIONS.contains(&e) => parse_workbook(bytes)?,
            _ => return Err(ParseError::UnsupportedFormat(ext)),
        };

        tracing::info!(
            file_name = file_name,
            sheets = sheets.len(),
            rows = sheets.iter().map(|s| s.rows.len()).sum::<usize>(),
            "电子表格解析完成"
        );

        Ok(sheets)
    }
}

// ==========================================
// 工作簿解析
// ==========================================
fn parse_workbook(bytes: Vec<u8>) -> ParseResult<Vec<ParsedSheet>> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))?;

    let mut sheets = Vec::new();
    for sheet_name in workbook.sheet_names() {
        let range = workbook.worksheet_range(&sheet_name)?;
        let grid: Vec<Vec<Value>> = range
            .rows()
            .map(|row| row.iter().map(cell_to_value).collect())
            .collect();

        match build_sheet(&sheet_name, grid) {
            Some(sheet) => sheets.push(sheet),
            None => tracing::debug!(sheet = %sheet_name, "工作表无数据行，跳过"),
        }
    }

    Ok(sheets)
}

// ==========================================
// CSV 解析（视为单个工作表）
// ==========================================
fn parse_csv(sheet_name: &str, bytes: &[u8]) -> ParseResult<Option<ParsedSheet>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true) // 允许行长度不一致
        .from_reader(bytes);

    let mut grid = Vec::new();
    for result in reader.records() {
        let record = result?;
        grid.push(
            record
                .iter()
                .map(|v| Value::String(v.to_string()))
                .collect::<Vec<_>>(),
        );
    }

    Ok(build_sheet(sheet_name, grid))
}

/// 单元格 → JSON 值
fn cell_to_value(cell: &Data) -> Value {
    match cell {
        Data::Empty => Value::String(String::new()),
        Data::String(s) => Value::String(s.clone()),
        Data::Int(i) => Value::from(*i),
        Data::Float(f) => float_to_value(*f),
        Data::Bool(b) => Value::Bool(*b),
        Data::Error(_) => Value::Null,
        // 日期/时长按单元格显示文本保留
        other => Value::String(other.to_string()),
    }
}

fn float_to_value(f: f64) -> Value {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < MAX_EXACT_FLOAT {
        Value::from(f as i64)
    } else {
        Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null)
    }
}

fn value_as_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// 由二维网格构建 ParsedSheet
///
/// # 规则
/// - 首行为表头: 单元格转字符串并 TRIM，缺失为空字符串
/// - 重名表头依次改名为 name_1、name_2 ...，保证每个单元格都有独立的键
/// - 其余行按位置映射到表头，缺失单元格为空字符串
/// - 每行记录源文件中的数据行号（空白行也计数）
/// - 表头为空的列不映射到行记录
/// - 完全空白的行跳过
/// - 无数据行 → None（工作表不出现在结果中）
pub(crate) fn build_sheet(sheet_name: &str, grid: Vec<Vec<Value>>) -> Option<ParsedSheet> {
    let mut grid_rows = grid.into_iter();
    let header = unique_header(
        grid_rows
            .next()?
            .iter()
            .map(|cell| value_as_text(cell).trim().to_string())
            .collect(),
    );

    let mut rows = Vec::new();
    let mut row_indexes = Vec::new();
    for (data_idx, cells) in grid_rows.enumerate() {
        if cells.iter().all(is_blank) {
            continue;
        }

        let mut record = RowRecord::new();
        for (col_idx, column) in header.iter().enumerate() {
            if column.is_empty() {
                continue;
            }
            let value = cells
                .get(col_idx)
                .cloned()
                .unwrap_or_else(|| Value::String(String::new()));
            record.insert(column.clone(), value);
        }
        rows.push(record);
        row_indexes.push(data_idx as u64 + 1);
    }

    if rows.is_empty() {
        return None;
    }

    Some(ParsedSheet {
        sheet_name: sheet_name.to_string(),
        header,
        rows,
        row_indexes,
    })
}

/// 重名表头加序号后缀（空表头保持为空，不参与映射）
fn unique_header(raw: Vec<String>) -> Vec<String> {
    let mut taken: HashSet<String> = raw.iter().filter(|c| !c.is_empty()).cloned().collect();
    let mut seen: HashSet<String> = HashSet::new();

    raw.into_iter()
        .map(|column| {
            if column.is_empty() || seen.insert(column.clone()) {
                return column;
            }
            let mut n = 1;
            let renamed = loop {
                let candidate = format!("{}_{}", column, n);
                if !taken.contains(&candidate) {
                    break candidate;
                }
                n += 1;
            };
            tracing::debug!(column = %column, renamed = %renamed, "表头重名，已改名");
            taken.insert(renamed.clone());
            seen.insert(renamed.clone());
            renamed
        })
        .collect()
}
