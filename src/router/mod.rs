//! ルーター本体（登録API）
//!
//! 登録はディスパッチ開始前に単一スレッドで行う。登録後のルーターは読み取り専用として
//! 複数リクエストから共有できる。

pub mod dispatch;
pub mod handler;
pub mod matcher;
pub mod pattern;
pub mod table;

use std::ops::{Deref, DerefMut};
use std::sync::{Arc, OnceLock};

use log::debug;

use crate::common::{Method, Middleware};
use crate::config::RouterConfig;
use crate::error::Error;

pub use dispatch::Outcome;
pub use handler::{async_handler, handler, AsyncFnHandler, FnHandler, HandlerRef, RouteHandler};
pub use matcher::{Params, RouteMatch};
pub use pattern::{compile, CompiledPattern};
pub use table::{Phase, RouteEntry, RouteTable};

/// 2フェーズのルーター
#[derive(Default)]
pub struct Router {
    table: RouteTable,
    not_found: Option<HandlerRef>,
    config: RouterConfig,
    base_path: OnceLock<String>,
}

impl Router {
    /// デフォルト設定でルーターを作成
    pub fn new() -> Self {
        Self::default()
    }

    /// 設定を指定してルーターを作成
    pub fn with_config(config: RouterConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// beforeフェーズにルートを登録
    pub fn before<H>(&mut self, methods: &str, pattern: &str, handler: H) -> Result<(), Error>
    where
        H: RouteHandler + 'static,
    {
        self.table
            .insert(Phase::Before, methods, pattern, Arc::new(handler))
    }

    /// afterフェーズにルートを登録
    pub fn route<H>(&mut self, methods: &str, pattern: &str, handler: H) -> Result<(), Error>
    where
        H: RouteHandler + 'static,
    {
        self.table
            .insert(Phase::After, methods, pattern, Arc::new(handler))
    }

    /// GET/POST/PUT/DELETE/OPTIONS/PATCH/HEADすべてに登録
    pub fn all<H>(&mut self, pattern: &str, handler: H) -> Result<(), Error>
    where
        H: RouteHandler + 'static,
    {
        let methods = Method::ALL
            .iter()
            .map(Method::as_str)
            .collect::<Vec<_>>()
            .join("|");
        self.route(&methods, pattern, handler)
    }

    pub fn get<H: RouteHandler + 'static>(&mut self, pattern: &str, handler: H) -> Result<(), Error> {
        self.route(Method::GET.as_str(), pattern, handler)
    }

    pub fn post<H: RouteHandler + 'static>(&mut self, pattern: &str, handler: H) -> Result<(), Error> {
        self.route(Method::POST.as_str(), pattern, handler)
    }

    pub fn put<H: RouteHandler + 'static>(&mut self, pattern: &str, handler: H) -> Result<(), Error> {
        self.route(Method::PUT.as_str(), pattern, handler)
    }

    pub fn patch<H: RouteHandler + 'static>(&mut self, pattern: &str, handler: H) -> Result<(), Error> {
        self.route(Method::PATCH.as_str(), pattern, handler)
    }

    pub fn delete<H: RouteHandler + 'static>(&mut self, pattern: &str, handler: H) -> Result<(), Error> {
        self.route(Method::DELETE.as_str(), pattern, handler)
    }

    pub fn options<H: RouteHandler + 'static>(&mut self, pattern: &str, handler: H) -> Result<(), Error> {
        self.route(Method::OPTIONS.as_str(), pattern, handler)
    }

    /// `prefix`を付けた状態で`register`内の登録を行う
    ///
    /// `register`がエラーを返しても、panicしても、戻った後のプレフィックスは呼び出し前と同じ。
    pub fn mount<F>(&mut self, prefix: &str, register: F) -> Result<(), Error>
    where
        F: FnOnce(&mut Router) -> Result<(), Error>,
    {
        let saved = self.table.prefix().to_string();
        self.table.replace_prefix(format!("{}{}", saved, prefix));

        let mut scope = MountScope {
            router: self,
            saved: Some(saved),
        };
        let result = register(&mut *scope);
        drop(scope);
        result
    }

    /// 以降に登録するすべてのパターンに付けるサフィックスを設定
    pub fn suffix(&mut self, suffix: impl Into<String>) {
        let suffix = suffix.into();
        debug!("Route suffix set to '{}'", suffix);
        self.table.set_suffix(suffix);
    }

    /// フォールバックハンドラーを保存する
    ///
    /// ディスパッチはこれを呼ばない。未マッチ時は404を設定して`next`へ進む。
    pub fn not_found<H: RouteHandler + 'static>(&mut self, handler: H) {
        self.not_found = Some(Arc::new(handler));
    }

    pub fn not_found_handler(&self) -> Option<&HandlerRef> {
        self.not_found.as_ref()
    }

    /// 現在のマウントプレフィックス
    pub fn prefix(&self) -> &str {
        self.table.prefix()
    }

    /// 現在のサフィックス
    pub fn current_suffix(&self) -> &str {
        self.table.suffix()
    }

    /// フェーズとメソッドに登録済みのルート
    pub fn routes_for(&self, phase: Phase, method: &str) -> &[RouteEntry] {
        self.table.routes(phase, method)
    }

    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    /// ルーターを外側のチェーンに差し込めるミドルウェアに変換
    pub fn routes(self) -> Arc<dyn Middleware> {
        Arc::new(self)
    }
}

/// マウント中のルーター。破棄時にプレフィックスを元に戻す
struct MountScope<'a> {
    router: &'a mut Router,
    saved: Option<String>,
}

impl Deref for MountScope<'_> {
    type Target = Router;

    fn deref(&self) -> &Router {
        self.router
    }
}

impl DerefMut for MountScope<'_> {
    fn deref_mut(&mut self) -> &mut Router {
        self.router
    }
}

impl Drop for MountScope<'_> {
    fn drop(&mut self) {
        if let Some(saved) = self.saved.take() {
            self.router.table.replace_prefix(saved);
        }
    }
}
