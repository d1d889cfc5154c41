//! ルートハンドラーの定義とクロージャ用アダプタ

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;

use crate::common::{Context, Next};
use crate::error::Error;

use super::matcher::Params;

/// ルートにマッチしたときに呼ばれるハンドラー
///
/// `next`は外側のチェーンの残り。呼ぶかどうかはハンドラー次第。
#[async_trait]
pub trait RouteHandler: Send + Sync {
    /// マッチしたリクエストを処理
    async fn handle(&self, ctx: &mut Context, next: Next<'_>, params: &Params) -> Result<(), Error>;
}

/// ルートテーブルが保持するハンドラー参照
pub type HandlerRef = Arc<dyn RouteHandler>;

#[async_trait]
impl<H> RouteHandler for Arc<H>
where
    H: RouteHandler + ?Sized,
{
    async fn handle(&self, ctx: &mut Context, next: Next<'_>, params: &Params) -> Result<(), Error> {
        (**self).handle(ctx, next, params).await
    }
}

/// 同期クロージャのハンドラー
pub struct FnHandler<F> {
    handler_fn: F,
}

#[async_trait]
impl<F> RouteHandler for FnHandler<F>
where
    F: Fn(&mut Context, &Params) -> Result<(), Error> + Send + Sync + 'static,
{
    async fn handle(&self, ctx: &mut Context, _next: Next<'_>, params: &Params) -> Result<(), Error> {
        (self.handler_fn)(ctx, params)
    }
}

/// 非同期クロージャのハンドラー
pub struct AsyncFnHandler<F> {
    handler_fn: F,
}

#[async_trait]
impl<F> RouteHandler for AsyncFnHandler<F>
where
    F: for<'a> Fn(&'a mut Context, Next<'a>, &'a Params) -> BoxFuture<'a, Result<(), Error>>
        + Send
        + Sync
        + 'static,
{
    async fn handle(&self, ctx: &mut Context, next: Next<'_>, params: &Params) -> Result<(), Error> {
        (self.handler_fn)(ctx, next, params).await
    }
}

/// `(ctx, params)`を受け取る同期クロージャをハンドラーにする
pub fn handler<F>(handler_fn: F) -> FnHandler<F>
where
    F: Fn(&mut Context, &Params) -> Result<(), Error> + Send + Sync + 'static,
{
    FnHandler { handler_fn }
}

/// `(ctx, next, params)`を受け取りBoxFutureを返すクロージャをハンドラーにする
///
/// ```ignore
/// router.get("/slow", async_handler(|ctx, next, _params| Box::pin(async move {
///     ctx.write("before ");
///     next.run(ctx).await
/// })))?;
/// ```
pub fn async_handler<F>(handler_fn: F) -> AsyncFnHandler<F>
where
    F: for<'a> Fn(&'a mut Context, Next<'a>, &'a Params) -> BoxFuture<'a, Result<(), Error>>
        + Send
        + Sync
        + 'static,
{
    AsyncFnHandler { handler_fn }
}
