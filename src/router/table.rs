//! before/afterのルートテーブル

use std::collections::HashMap;
use std::fmt;

#[cfg(debug_assertions)]
use log::info;
use log::{debug, warn};

use crate::error::Error;

use super::handler::HandlerRef;
use super::pattern::{compile, CompiledPattern};

/// ルートが属するフェーズ
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// 先に評価され、レスポンスを確定させて処理を打ち切れる
    Before,
    /// 最終的なディスパッチ先を決める
    After,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Before => f.write_str("before"),
            Phase::After => f.write_str("after"),
        }
    }
}

/// ルートテーブルの1エントリ
#[derive(Clone)]
pub struct RouteEntry {
    pattern: CompiledPattern,
    handler: HandlerRef,
}

impl RouteEntry {
    pub fn new(pattern: CompiledPattern, handler: HandlerRef) -> Self {
        Self { pattern, handler }
    }

    pub fn pattern(&self) -> &CompiledPattern {
        &self.pattern
    }

    pub fn handler(&self) -> &HandlerRef {
        &self.handler
    }
}

impl fmt::Debug for RouteEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteEntry")
            .field("pattern", &self.pattern.source())
            .finish()
    }
}

/// メソッドごとの登録順ルート一覧を2フェーズ分持つテーブル
///
/// マウント中のプレフィックスとサフィックスも保持する。登録は単一スレッドで
/// ディスパッチ開始前に済ませる前提。
#[derive(Debug, Default)]
pub struct RouteTable {
    before: HashMap<String, Vec<RouteEntry>>,
    after: HashMap<String, Vec<RouteEntry>>,
    prefix: String,
    suffix: String,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// 登録用にパターンを正規化する
    ///
    /// `prefix + "/" + trim(pattern + suffix, "/")`、プレフィックスがあれば末尾の`/`も落とす。
    pub fn normalize(&self, pattern: &str) -> String {
        let with_suffix = format!("{}{}", pattern, self.suffix);
        let normalized = format!("{}/{}", self.prefix, with_suffix.trim_matches('/'));
        if self.prefix.is_empty() {
            normalized
        } else {
            normalized.trim_end_matches('/').to_string()
        }
    }

    /// `|`区切りのメソッドすべてにルートを登録
    pub fn insert(
        &mut self,
        phase: Phase,
        methods: &str,
        pattern: &str,
        handler: HandlerRef,
    ) -> Result<(), Error> {
        let normalized = self.normalize(pattern);
        let compiled = compile(&normalized)?;

        let table = match phase {
            Phase::Before => &mut self.before,
            Phase::After => &mut self.after,
        };

        for method in methods.split('|') {
            if method.is_empty() {
                warn!("Skipping empty method name in '{}' for pattern {}", methods, normalized);
                continue;
            }

            // 開発時はinfo、本番相当ではdebugに落とす
            #[cfg(debug_assertions)]
            info!("Registering {} route for {} with pattern: {}", phase, method, normalized);
            #[cfg(not(debug_assertions))]
            debug!("Registering {} route for {} with pattern: {}", phase, method, normalized);

            table
                .entry(method.to_string())
                .or_default()
                .push(RouteEntry::new(compiled.clone(), handler.clone()));
        }
        Ok(())
    }

    /// フェーズとメソッドに対応するルート（登録順）
    pub fn routes(&self, phase: Phase, method: &str) -> &[RouteEntry] {
        let table = match phase {
            Phase::Before => &self.before,
            Phase::After => &self.after,
        };
        table.get(method).map(Vec::as_slice).unwrap_or(&[])
    }

    /// フェーズ全体のエントリ数
    pub fn len(&self, phase: Phase) -> usize {
        let table = match phase {
            Phase::Before => &self.before,
            Phase::After => &self.after,
        };
        table.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.before.is_empty() && self.after.is_empty()
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// プレフィックスを置き換え、直前の値を返す
    pub fn replace_prefix(&mut self, prefix: String) -> String {
        debug!("Route prefix changed: '{}' -> '{}'", self.prefix, prefix);
        std::mem::replace(&mut self.prefix, prefix)
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    pub fn set_suffix(&mut self, suffix: impl Into<String>) {
        self.suffix = suffix.into();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::handler::handler;
    use std::sync::Arc;

    fn noop() -> HandlerRef {
        Arc::new(handler(|_, _| Ok(())))
    }

    #[test]
    fn test_normalize_without_prefix() {
        let table = RouteTable::new();
        assert_eq!(table.normalize("/users/{id}/"), "/users/{id}");
        assert_eq!(table.normalize("users"), "/users");
        assert_eq!(table.normalize("/"), "/");
        assert_eq!(table.normalize(""), "/");
    }

    #[test]
    fn test_normalize_with_prefix_and_suffix() {
        let mut table = RouteTable::new();
        table.replace_prefix("/api".to_string());
        assert_eq!(table.normalize("/"), "/api");
        assert_eq!(table.normalize("/users/"), "/api/users");

        table.set_suffix(".json");
        assert_eq!(table.normalize("/users"), "/api/users.json");
        assert_eq!(table.suffix(), ".json");
    }

    #[test]
    fn test_insert_splits_methods_in_order() {
        let mut table = RouteTable::new();
        table.insert(Phase::After, "GET|POST", "/a", noop()).unwrap();
        table.insert(Phase::After, "GET", "/b", noop()).unwrap();
        table.insert(Phase::Before, "GET||", "/c", noop()).unwrap();

        let get: Vec<&str> = table
            .routes(Phase::After, "GET")
            .iter()
            .map(|r| r.pattern().source())
            .collect();
        assert_eq!(get, vec!["/a", "/b"]);
        assert_eq!(table.routes(Phase::After, "POST").len(), 1);
        assert_eq!(table.routes(Phase::Before, "GET").len(), 1);
        assert_eq!(table.routes(Phase::Before, "").len(), 0);
        assert_eq!(table.len(Phase::After), 3);
        assert!(table.routes(Phase::After, "get").is_empty());
    }

    #[test]
    fn test_insert_rejects_bad_pattern() {
        let mut table = RouteTable::new();
        let result = table.insert(Phase::After, "GET", "/x/{}", noop());
        assert!(matches!(result, Err(Error::InvalidPattern(_))));
        assert!(table.is_empty());
    }
}
