//! ルーターの設定（環境変数から読み込む）

use std::env;

/// ベースパスを固定する環境変数
pub const BASE_PATH_ENV: &str = "ROUTEBRIDGE_BASE_PATH";
/// `X-HTTP-Method-Override`を無効化する環境変数
pub const METHOD_OVERRIDE_ENV: &str = "ROUTEBRIDGE_METHOD_OVERRIDE";

/// ルーターの設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouterConfig {
    /// 固定のベースパス。`None`ならスクリプトパスから算出する
    pub base_path: Option<String>,
    /// POSTでの`X-HTTP-Method-Override`を受け付けるか
    pub method_override: bool,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            base_path: None,
            method_override: true,
        }
    }
}

impl RouterConfig {
    /// 環境変数から設定を構築
    /// 優先順位: 環境変数 -> デフォルト
    pub fn from_env() -> Self {
        let base_path = env::var(BASE_PATH_ENV)
            .ok()
            .filter(|s| !s.is_empty());
        let method_override = env::var(METHOD_OVERRIDE_ENV)
            .map(|v| parse_flag(&v).unwrap_or(true))
            .unwrap_or(true);

        Self {
            base_path,
            method_override,
        }
    }

    /// ベースパスを固定
    pub fn with_base_path(mut self, base_path: impl Into<String>) -> Self {
        self.base_path = Some(base_path.into());
        self
    }

    /// メソッドオーバーライドの有効・無効を設定
    pub fn with_method_override(mut self, enabled: bool) -> Self {
        self.method_override = enabled;
        self
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Some(true),
        "0" | "false" | "off" | "no" => Some(false),
        _ => None,
    }
}
