// ==========================================
// 人力资源批量导入 - 导入层
// ==========================================
// 职责: 本地文件解析、行级校验、CSV 导出
// 支持: Excel, ODS, CSV
// ==========================================

// 模块声明
pub mod csv_exporter;
pub mod error;
pub mod file_parser;
pub mod row_validator;

// 重导出核心类型
pub use csv_exporter::{CsvExporter, ExportRow};
pub use error::{ExportError, ParseError, ParseResult};
pub use file_parser::WorkbookParser;
pub use row_validator::{normalize_record, RequiredColumnsValidator, RowValidator, RowVerdict};
