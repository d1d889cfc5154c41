//! ルートテーブルからのマッチングとパラメータ抽出

use log::debug;
use regex::Captures;

use super::handler::HandlerRef;
use super::table::RouteEntry;

/// 位置順のルートパラメータ
///
/// マッチに参加しなかったキャプチャは`None`になる。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params(Vec<Option<String>>);

impl Params {
    /// i番目のパラメータ値
    pub fn get(&self, index: usize) -> Option<&str> {
        self.0.get(index).and_then(|v| v.as_deref())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Option<&str>> {
        self.0.iter().map(|v| v.as_deref())
    }

    pub fn as_slice(&self) -> &[Option<String>] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<Option<String>> {
        self.0
    }
}

impl From<Vec<Option<String>>> for Params {
    fn from(values: Vec<Option<String>>) -> Self {
        Self(values)
    }
}

/// マッチ結果
#[derive(Clone)]
pub struct RouteMatch {
    handler: HandlerRef,
    params: Params,
    pattern: String,
}

impl RouteMatch {
    /// マッチしたルートのハンドラー
    pub fn handler(&self) -> &HandlerRef {
        &self.handler
    }

    /// 抽出したパラメータ
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// マッチしたルートのパターン（正規化済み）
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// ハンドラーとパラメータに分解
    pub fn into_parts(self) -> (HandlerRef, Params) {
        (self.handler, self.params)
    }
}

impl std::fmt::Debug for RouteMatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteMatch")
            .field("pattern", &self.pattern)
            .field("params", &self.params)
            .finish()
    }
}

/// 登録順にルートを試し、最初にマッチしたものを返す
pub fn resolve(routes: &[RouteEntry], uri: &str) -> Option<RouteMatch> {
    for route in routes {
        let Some(caps) = route.pattern().regex().captures(uri) else {
            debug!("Path matching: {} against pattern {}: false", uri, route.pattern().source());
            continue;
        };
        debug!("Path matching: {} against pattern {}: true", uri, route.pattern().source());
        return Some(RouteMatch {
            handler: route.handler().clone(),
            params: extract_params(&caps, uri),
            pattern: route.pattern().source().to_string(),
        });
    }
    None
}

/// キャプチャからパラメータを取り出す
///
/// i番目の値は、i番目のキャプチャ開始位置から次のキャプチャ開始位置までの区間
/// （ただしi番目のキャプチャ自身の終端を超えない）を`/`でトリムしたもの。
fn extract_params(caps: &Captures<'_>, uri: &str) -> Params {
    let groups: Vec<_> = (1..caps.len()).map(|i| caps.get(i)).collect();

    let values = groups
        .iter()
        .enumerate()
        .map(|(i, group)| {
            let m = (*group)?;
            let end = match groups.get(i + 1) {
                Some(Some(next)) => m.end().min(next.start().max(m.start())),
                _ => m.end(),
            };
            Some(uri[m.start()..end].trim_matches('/').to_string())
        })
        .collect();

    Params(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::handler::handler;
    use crate::router::pattern::compile;
    use std::sync::Arc;

    fn entry(pattern: &str, tag: &'static str) -> RouteEntry {
        let h: HandlerRef = Arc::new(handler(move |ctx, _| {
            ctx.write(tag);
            Ok(())
        }));
        RouteEntry::new(compile(pattern).unwrap(), h)
    }

    fn params(values: &[&str]) -> Params {
        Params(values.iter().map(|v| Some(v.to_string())).collect())
    }

    #[test]
    fn test_resolve_single_param() {
        let routes = vec![entry("/users/{id}", "h1")];

        let found = resolve(&routes, "/users/42").unwrap();
        assert_eq!(found.params(), &params(&["42"]));
        assert_eq!(found.pattern(), "/users/{id}");

        assert!(resolve(&routes, "/users/").is_none());
        assert!(resolve(&routes, "/users").is_none());
    }

    #[test]
    fn test_resolve_multiple_params() {
        let routes = vec![entry("/a/{x}/{y}", "h1")];
        let found = resolve(&routes, "/a/foo/bar").unwrap();
        assert_eq!(found.params(), &params(&["foo", "bar"]));
        assert_eq!(found.params().get(1), Some("bar"));
        assert_eq!(found.params().get(2), None);
    }

    #[test]
    fn test_params_with_literal_separator() {
        let routes = vec![entry("/files/{name}.{ext}", "h1")];
        let found = resolve(&routes, "/files/report.pdf").unwrap();
        assert_eq!(found.params(), &params(&["report", "pdf"]));
    }

    #[test]
    fn test_adjacent_placeholders_partition() {
        // 貪欲なキャプチャでも各値が重ならない
        let routes = vec![entry("/{a}{b}", "h1")];
        let found = resolve(&routes, "/abc").unwrap();
        assert_eq!(found.params(), &params(&["ab", "c"]));
    }

    #[test]
    fn test_first_registered_wins() {
        let routes = vec![entry("/items/{id}", "first"), entry("/items/special", "second")];
        let found = resolve(&routes, "/items/special").unwrap();
        assert_eq!(found.pattern(), "/items/{id}");
        assert_eq!(found.params(), &params(&["special"]));
    }

    #[test]
    fn test_no_params_for_literal_route() {
        let routes = vec![entry("/", "root")];
        let found = resolve(&routes, "/").unwrap();
        assert!(found.params().is_empty());
    }

    #[test]
    fn test_empty_table() {
        assert!(resolve(&[], "/anything").is_none());
    }

    #[test]
    fn test_params_accessors() {
        let p = Params::from(vec![Some("a".to_string()), None]);
        assert_eq!(p.len(), 2);
        assert_eq!(p.get(0), Some("a"));
        assert_eq!(p.get(1), None);
        assert_eq!(p.iter().collect::<Vec<_>>(), vec![Some("a"), None]);
        assert_eq!(p.clone().into_vec(), vec![Some("a".to_string()), None]);
        assert_eq!(p.as_slice().len(), 2);
    }
}
