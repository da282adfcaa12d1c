// ==========================================
// 国际化 (i18n) 模块
// ==========================================
// 使用 rust-i18n 库
// 支持英文（默认）和阿拉伯文（RTL）
// ==========================================
// 注意: rust_i18n::i18n! 宏已在 lib.rs 中初始化
// 语言始终显式传入，不读取全局 locale
// ==========================================

use crate::domain::{ImportMode, JobStatus};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// 语言 Cookie 名称
pub const LANG_COOKIE: &str = "lang";

/// 支持的语言
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lang {
    #[default]
    En,
    Ar,
}

/// 书写方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Ltr,
    Rtl,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Ltr => "ltr",
            Direction::Rtl => "rtl",
        }
    }
}

impl Lang {
    pub fn code(&self) -> &'static str {
        match self {
            Lang::En => "en",
            Lang::Ar => "ar",
        }
    }

    /// 解析语言标签（取主子标签，大小写不敏感: "ar-SA" → Ar）
    pub fn parse(tag: &str) -> Option<Lang> {
        let primary = tag.trim().split(['-', '_']).next()?.to_ascii_lowercase();
        match primary.as_str() {
            "en" => Some(Lang::En),
            "ar" => Some(Lang::Ar),
            _ => None,
        }
    }

    pub fn direction(&self) -> Direction {
        match self {
            Lang::En => Direction::Ltr,
            Lang::Ar => Direction::Rtl,
        }
    }
}

impl fmt::Display for Lang {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// 解析当前语言
///
/// # 优先级
/// 1. Cookie（`lang=ar`）
/// 2. URL 路径首段（`/ar/...`）
/// 3. 浏览器 Accept-Language（按 q 值降序）
/// 4. 默认英文
pub fn resolve_lang(cookie_header: Option<&str>, path: &str, accept_language: Option<&str>) -> Lang {
    if let Some(lang) = cookie_header.and_then(lang_from_cookie) {
        return lang;
    }

    if let Some(lang) = lang_from_path(path) {
        return lang;
    }

    accept_language
        .and_then(lang_from_accept_language)
        .unwrap_or_default()
}

fn lang_from_cookie(cookie_header: &str) -> Option<Lang> {
    cookie_header.split(';').find_map(|pair| {
        let (name, value) = pair.split_once('=')?;
        if name.trim() == LANG_COOKIE {
            Lang::parse(value.trim().trim_matches('"'))
        } else {
            None
        }
    })
}

fn lang_from_path(path: &str) -> Option<Lang> {
    let segment = path.trim_start_matches('/').split('/').next()?;
    // 只接受纯语言段，避免 "/english-reports" 之类误判
    if segment.len() == 2 || (segment.len() == 5 && segment.as_bytes()[2] == b'-') {
        Lang::parse(segment)
    } else {
        None
    }
}

fn lang_from_accept_language(header: &str) -> Option<Lang> {
    let mut candidates: Vec<(f32, Lang)> = header
        .split(',')
        .filter_map(|entry| {
            let mut parts = entry.split(';');
            let lang = Lang::parse(parts.next()?)?;
            let quality = parts
                .find_map(|p| p.trim().strip_prefix("q="))
                .and_then(|q| q.parse::<f32>().ok())
                .unwrap_or(1.0);
            Some((quality, lang))
        })
        .filter(|(q, _)| *q > 0.0)
        .collect();

    // 稳定排序: 同权重保持原顺序
    candidates.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
    candidates.first().map(|(_, lang)| *lang)
}

// ==========================================
// 翻译
// ==========================================

/// 翻译键缺失
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("missing translation for key `{key}` in locale `{locale}`")]
pub struct MissingKey {
    pub key: String,
    pub locale: String,
}

/// 翻译消息（无参数）
///
/// 缺失时返回 MissingKey，由调用方决定如何呈现
///
/// # 示例
/// ```no_run
/// use hr_bulk_import::i18n::{translate, Lang};
/// let msg = translate(Lang::Ar, "import.status.partial");
/// ```
pub fn translate(lang: Lang, key: &str) -> Result<String, MissingKey> {
    let locale = lang.code();
    let text = rust_i18n::t!(key, locale = locale).to_string();

    // rust-i18n 未命中时回显键名（可能带 locale 前缀）
    if text.is_empty() || text == key || text == format!("{}.{}", locale, key) {
        return Err(MissingKey {
            key: key.to_string(),
            locale: locale.to_string(),
        });
    }

    Ok(text)
}

/// 翻译消息（带参数，占位符格式 `%{name}`）
pub fn translate_with_args(
    lang: Lang,
    key: &str,
    args: &[(&str, &str)],
) -> Result<String, MissingKey> {
    let mut result = translate(lang, key)?;
    for (k, v) in args {
        let placeholder = format!("%{{{}}}", k);
        result = result.replace(&placeholder, v);
    }
    Ok(result)
}

/// 作业状态显示名
pub fn status_label(lang: Lang, status: JobStatus) -> Result<String, MissingKey> {
    translate(lang, &format!("import.status.{}", status.as_str()))
}

/// 导入模式显示名
pub fn mode_label(lang: Lang, mode: ImportMode) -> Result<String, MissingKey> {
    translate(lang, &format!("import.mode.{}", mode.as_str()))
}
