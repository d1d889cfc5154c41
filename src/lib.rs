//! RouteBridge: beforeルートとafterルートの2フェーズで動くリクエストルーター
//!
//! beforeルートはステータスを設定することでリクエストを打ち切れる。afterルートが
//! 最終的なハンドラーを決め、どれにもマッチしなければ404を設定して外側のチェーンへ進む。

use std::sync::Arc;

pub mod common;
pub mod config;
pub mod error;
pub mod router;

#[cfg(feature = "cgi")]
pub mod cgi;

pub use common::*;
pub use config::RouterConfig;
pub use error::*;
pub use router::{
    async_handler, handler, HandlerRef, Outcome, Params, Phase, RouteHandler, RouteMatch, Router,
};

/// ミドルウェアチェーンを構築するためのビルダー
#[derive(Default)]
pub struct RouteBridgeBuilder {
    middlewares: Vec<Arc<dyn common::Middleware>>,
}

impl RouteBridgeBuilder {
    /// 新しいRouteBridgeBuilderインスタンスを作成
    pub fn new() -> Self {
        Self::default()
    }

    /// ミドルウェアを追加（登録順に実行される）
    pub fn middleware<M>(mut self, middleware: M) -> Self
    where
        M: common::Middleware + 'static,
    {
        self.middlewares.push(Arc::new(middleware));
        self
    }

    /// ルーターをチェーンに追加
    pub fn router(mut self, router: Router) -> Self {
        self.middlewares.push(router.routes());
        self
    }

    /// チェーンをビルドして返却
    pub fn build(self) -> RouteBridge {
        RouteBridge {
            middlewares: self.middlewares,
        }
    }
}

/// リクエストを処理するミドルウェアチェーン
pub struct RouteBridge {
    middlewares: Vec<Arc<dyn common::Middleware>>,
}

impl RouteBridge {
    /// 新しいRouteBridgeBuilderインスタンスを作成
    pub fn builder() -> RouteBridgeBuilder {
        RouteBridgeBuilder::new()
    }

    /// ミドルウェアのリストを取得
    pub fn middlewares(&self) -> &[Arc<dyn common::Middleware>] {
        &self.middlewares
    }

    /// チェーンの先頭からリクエストを処理
    pub async fn handle(&self, ctx: &mut common::Context) -> Result<(), Error> {
        common::Next::new(&self.middlewares).run(ctx).await
    }
}
