//! ルートパターンのコンパイル
//!
//! `{name}`形式のプレースホルダーを`([A-Za-z0-9_]+)`のキャプチャに置き換え、
//! 前後をアンカーした正規表現を作る。プレースホルダー以外の文字はエスケープする。

use std::sync::OnceLock;

use log::debug;
use regex::Regex;

use crate::error::Error;

/// プレースホルダーにマッチする値（英数字とアンダースコア）
const PARAM_CAPTURE: &str = "([A-Za-z0-9_]+)";

fn placeholder_regex() -> Result<&'static Regex, Error> {
    static PLACEHOLDER: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();
    PLACEHOLDER
        .get_or_init(|| Regex::new(r"\{([A-Za-z]*)\}"))
        .as_ref()
        .map_err(|e| Error::InvalidPattern(format!("placeholder scanner failed to compile: {}", e)))
}

/// コンパイル済みルートパターン
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    source: String,
    regex: Regex,
    placeholders: Vec<String>,
}

impl CompiledPattern {
    /// 元のパターン文字列
    pub fn source(&self) -> &str {
        &self.source
    }

    /// 正規表現
    pub fn regex(&self) -> &Regex {
        &self.regex
    }

    /// プレースホルダー名（出現順）
    pub fn placeholders(&self) -> &[String] {
        &self.placeholders
    }

    /// パス全体がパターンにマッチするか
    pub fn is_match(&self, uri: &str) -> bool {
        self.regex.is_match(uri)
    }
}

/// パターンをコンパイルする
///
/// 空のプレースホルダー`{}`は`Error::InvalidPattern`になる。
/// 名前が英字だけでない`{...}`はプレースホルダーではなくリテラルとして扱う。
pub fn compile(raw: &str) -> Result<CompiledPattern, Error> {
    let mut expr = String::with_capacity(raw.len() + 8);
    let mut placeholders = Vec::new();
    let mut last = 0;

    expr.push('^');
    for caps in placeholder_regex()?.captures_iter(raw) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        if name.as_str().is_empty() {
            return Err(Error::InvalidPattern(format!(
                "empty placeholder '{{}}' in pattern '{}'",
                raw
            )));
        }
        expr.push_str(&regex::escape(&raw[last..whole.start()]));
        expr.push_str(PARAM_CAPTURE);
        placeholders.push(name.as_str().to_string());
        last = whole.end();
    }
    expr.push_str(&regex::escape(&raw[last..]));
    expr.push('$');

    let regex = Regex::new(&expr)
        .map_err(|e| Error::InvalidPattern(format!("pattern '{}': {}", raw, e)))?;

    debug!("Compiled route pattern '{}' to '{}'", raw, expr);
    Ok(CompiledPattern {
        source: raw.to_string(),
        regex,
        placeholders,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_scanner_compiles_once() {
        let first = placeholder_regex().unwrap();
        let second = placeholder_regex().unwrap();
        assert!(std::ptr::eq(first, second));
        assert!(first.is_match("{id}"));
        assert!(!first.is_match("{user_id}"));
    }

    #[test]
    fn test_compile_literal_pattern() {
        let pattern = compile("/about").unwrap();
        assert_eq!(pattern.regex().as_str(), "^/about$");
        assert!(pattern.placeholders().is_empty());
        assert!(pattern.is_match("/about"));
        assert!(!pattern.is_match("/about/us"));
        assert!(!pattern.is_match("/prefix/about"));
    }

    #[test]
    fn test_compile_placeholders() {
        let pattern = compile("/users/{id}/posts/{slug}").unwrap();
        assert_eq!(pattern.placeholders(), &["id".to_string(), "slug".to_string()]);
        assert!(pattern.is_match("/users/42/posts/hello_world"));
        assert!(!pattern.is_match("/users/42/posts/"));
        assert!(!pattern.is_match("/users/4-2/posts/x"));
        assert_eq!(pattern.source(), "/users/{id}/posts/{slug}");
    }

    #[test]
    fn test_empty_placeholder_is_rejected() {
        let result = compile("/users/{}");
        assert!(matches!(result, Err(Error::InvalidPattern(_))));
    }

    #[test]
    fn test_literals_are_escaped() {
        let pattern = compile("/files/{name}.json").unwrap();
        assert!(pattern.is_match("/files/report.json"));
        // `.`は任意文字ではない
        assert!(!pattern.is_match("/files/reportxjson"));

        let pattern = compile("/v1+/status").unwrap();
        assert!(pattern.is_match("/v1+/status"));
        assert!(!pattern.is_match("/v11/status"));
    }

    #[test]
    fn test_non_alphabetic_braces_are_literal() {
        let pattern = compile("/items/{user_id}").unwrap();
        assert!(pattern.placeholders().is_empty());
        assert!(pattern.is_match("/items/{user_id}"));
        assert!(!pattern.is_match("/items/42"));

        let pattern = compile("/x/{1}").unwrap();
        assert!(pattern.is_match("/x/{1}"));
    }

    #[test]
    fn test_root_pattern() {
        let pattern = compile("/").unwrap();
        assert!(pattern.is_match("/"));
        assert!(!pattern.is_match("/a"));
    }
}
