// ============================================================================
// Weft - 国际化模块
// ============================================================================
//
// 文件: src/i18n/mod.rs
// 职责: 国际化支持和翻译管理
// 边界:
//   - ✅ 当前界面语言的设置与读取
//   - ✅ 翻译宏定义和实现
//   - ✅ 参数化翻译支持
//   - ❌ 不应包含具体翻译内容
//   - ❌ 不应包含业务逻辑
//   - ❌ 不应读取配置文件
//
// ============================================================================

pub mod en_us;
pub mod zh_cn;

use std::sync::{OnceLock, RwLock};

/// 默认界面语言
pub const DEFAULT_LANGUAGE: &str = "en_us";

/// 当前界面语言（由 CLI 在合并配置后设置）
static LANGUAGE: OnceLock<RwLock<String>> = OnceLock::new();

fn language_cell() -> &'static RwLock<String> {
    LANGUAGE.get_or_init(|| RwLock::new(DEFAULT_LANGUAGE.to_string()))
}

/// 设置界面语言，未知语言回退到英文
pub fn set_language(language: &str) {
    let normalized = match language.to_lowercase().replace('-', "_").as_str() {
        "zh_cn" | "zh" => "zh_cn".to_string(),
        _ => DEFAULT_LANGUAGE.to_string(),
    };
    let mut guard = language_cell().write().unwrap_or_else(|p| p.into_inner());
    *guard = normalized;
}

/// 当前界面语言
pub fn current_language() -> String {
    language_cell()
        .read()
        .unwrap_or_else(|p| p.into_inner())
        .clone()
}

/// 获取翻译文本
pub fn get_translation(key: &str) -> String {
    let table = match current_language().as_str() {
        "zh_cn" => zh_cn::TRANSLATIONS,
        _ => en_us::TRANSLATIONS,
    };

    lookup(table, key)
        .or_else(|| lookup(en_us::TRANSLATIONS, key))
        .map(str::to_string)
        .unwrap_or_else(|| format!("Unknown translation key: {}", key))
}

fn lookup(table: &'static [(&'static str, &'static str)], key: &str) -> Option<&'static str> {
    table.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
}

/// 简单翻译宏
#[macro_export]
macro_rules! t {
    ($key:expr) => {
        $crate::i18n::get_translation($key)
    };
}

/// 按顺序替换模板中的 `{}` 占位符
pub fn format_with_args(template: String, args: Vec<String>) -> String {
    let mut result = String::with_capacity(template.len());
    let mut rest = template.as_str();
    let mut args = args.into_iter();

    while let Some(pos) = rest.find("{}") {
        result.push_str(&rest[..pos]);
        match args.next() {
            Some(arg) => result.push_str(&arg),
            None => result.push_str("{}"),
        }
        rest = &rest[pos + 2..];
    }
    result.push_str(rest);
    result
}

/// 带参数的翻译宏
#[macro_export]
macro_rules! tf {
    ($key:expr, $($arg:expr),*) => {{
        let template = $crate::i18n::get_translation($key);
        let args = vec![$(format!("{}", $arg)),*];
        $crate::i18n::format_with_args(template, args)
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_replaces_placeholders_in_order() {
        let out = format_with_args("{} -> {}".to_string(), vec!["a".into(), "b".into()]);
        assert_eq!(out, "a -> b");
    }

    #[test]
    fn format_does_not_expand_placeholders_inside_arguments() {
        let out = format_with_args("{} and {}".to_string(), vec!["{}".into(), "x".into()]);
        assert_eq!(out, "{} and x");
    }

    #[test]
    fn every_english_key_has_a_chinese_translation() {
        for (key, _) in en_us::TRANSLATIONS {
            assert!(
                lookup(zh_cn::TRANSLATIONS, key).is_some(),
                "missing zh_cn translation for {}",
                key
            );
        }
    }
}
