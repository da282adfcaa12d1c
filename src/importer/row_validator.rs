// ==========================================
// 人力资源批量导入 - 行级校验器
// ==========================================
// 职责: 内嵌导入后端处理行时的规范化与校验
// 规则: 必填列（按导入模式配置）+ 作业内主键去重
// 行级失败是正常数据，不是异常
// ==========================================

use crate::config::ImportConfigReader;
use crate::domain::{ImportMode, RowRecord};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::error::Error;

/// 单行处理结论
#[derive(Debug, Clone, PartialEq)]
pub struct RowVerdict {
    pub normalized: Option<RowRecord>,
    pub error: Option<String>,
}

impl RowVerdict {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

// ==========================================
// RowValidator Trait
// ==========================================
pub trait RowValidator: Send + Sync {
    /// 校验一个作业的全部行
    ///
    /// # 返回
    /// - 与输入等长，顺序一致
    fn validate_rows(&self, mode: ImportMode, rows: &[RowRecord]) -> Vec<RowVerdict>;
}

// ==========================================
// RequiredColumnsValidator
// ==========================================
// 每种模式的首个必填列作为作业内主键参与去重
pub struct RequiredColumnsValidator {
    required: HashMap<ImportMode, Vec<String>>,
}

impl RequiredColumnsValidator {
    pub fn new(required: HashMap<ImportMode, Vec<String>>) -> Self {
        Self { required }
    }

    /// 从配置读取各模式的必填列
    pub fn from_config(
        config: &dyn ImportConfigReader,
    ) -> Result<Self, Box<dyn Error + Send + Sync>> {
        let mut required = HashMap::new();
        for mode in ImportMode::all() {
            required.insert(mode, config.get_required_columns(mode)?);
        }
        Ok(Self::new(required))
    }

    fn required_for(&self, mode: ImportMode) -> &[String] {
        self.required.get(&mode).map(Vec::as_slice).unwrap_or(&[])
    }
}

impl RowValidator for RequiredColumnsValidator {
    fn validate_rows(&self, mode: ImportMode, rows: &[RowRecord]) -> Vec<RowVerdict> {
        let required = self.required_for(mode);
        let key_column = required.first();
        let mut seen_keys: HashSet<String> = HashSet::new();

        rows.iter()
            .map(|raw| {
                let normalized = normalize_record(raw);

                let missing: Vec<&str> = required
                    .iter()
                    .filter(|col| matches!(normalized.get(col.as_str()), None | Some(Value::Null)))
                    .map(String::as_str)
                    .collect();

                if !missing.is_empty() {
                    return RowVerdict {
                        normalized: Some(normalized),
                        error: Some(format!("missing required field: {}", missing.join(", "))),
                    };
                }

                // 作业内主键重复
                if let Some(key) = key_column {
                    if let Some(value) = normalized.get(key.as_str()) {
                        let key_value = text_of(value);
                        if !seen_keys.insert(key_value.clone()) {
                            return RowVerdict {
                                normalized: Some(normalized),
                                error: Some(format!(
                                    "duplicate {} '{}' within this import",
                                    key, key_value
                                )),
                            };
                        }
                    }
                }

                RowVerdict {
                    normalized: Some(normalized),
                    error: None,
                }
            })
            .collect()
    }
}

/// 规范化: 列名 TRIM，字符串值 TRIM，空字符串 → null
pub fn normalize_record(raw: &RowRecord) -> RowRecord {
    raw.iter()
        .map(|(key, value)| {
            let value = match value {
                Value::String(s) => {
                    let trimmed = s.trim();
                    if trimmed.is_empty() {
                        Value::Null
                    } else {
                        Value::String(trimmed.to_string())
                    }
                }
                other => other.clone(),
            };
            (key.trim().to_string(), value)
        })
        .collect()
}

fn text_of(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
