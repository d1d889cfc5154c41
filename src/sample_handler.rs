//! サンプルハンドラの実装
//!
//! CGIバイナリで使うデモ用のルートを組み立てる。

use async_trait::async_trait;
use log::info;
use serde_json::json;

use routebridge::error::Error;
use routebridge::{handler, Context, Next, Params, RouteHandler, Router, RouterConfig, StatusCode};

/// Hello World ハンドラ
pub struct HelloHandler;

#[async_trait]
impl RouteHandler for HelloHandler {
    async fn handle(&self, ctx: &mut Context, _next: Next<'_>, _params: &Params) -> Result<(), Error> {
        info!("Handling Hello request");
        ctx.set_status(StatusCode::Ok.as_u16());
        ctx.json(&json!({
            "message": "Hello from RouteBridge CGI",
            "version": env!("CARGO_PKG_VERSION"),
        }))
    }
}

/// `/admin`配下へのアクセスを`X-Admin-Token`ヘッダーで制限するbeforeハンドラ
///
/// トークンが一致しなければ401で打ち切り、あればステータスを設定せずafterルートへ進ませる。
pub struct AdminGuard {
    token: String,
}

impl AdminGuard {
    pub fn new(token: impl Into<String>) -> Self {
        Self { token: token.into() }
    }
}

#[async_trait]
impl RouteHandler for AdminGuard {
    async fn handle(&self, ctx: &mut Context, _next: Next<'_>, _params: &Params) -> Result<(), Error> {
        let token = ctx.request().header("X-Admin-Token");
        if self.token.is_empty() || token != Some(self.token.as_str()) {
            ctx.set_status(StatusCode::Unauthorized.as_u16());
            ctx.set_header("Content-Type", "text/plain; charset=utf-8");
            ctx.write("Unauthorized");
        }
        Ok(())
    }
}

/// デモ用ルーターを構築する
pub fn demo_router(admin_token: &str) -> Result<Router, Error> {
    let mut router = Router::with_config(RouterConfig::from_env());

    router.before("GET|POST|PUT|DELETE|PATCH", "/admin/{page}", AdminGuard::new(admin_token))?;

    router.get("/", HelloHandler)?;
    router.get(
        "/admin/{page}",
        handler(|ctx, params| {
            ctx.set_status(StatusCode::Ok.as_u16());
            ctx.json(&json!({ "page": params.get(0) }))
        }),
    )?;
    router.mount("/users", |r| {
        r.get("/", handler(|ctx, _| {
            ctx.set_status(StatusCode::Ok.as_u16());
            ctx.json(&json!({ "users": [] }))
        }))?;
        r.get("/{id}", handler(|ctx, params| {
            ctx.set_status(StatusCode::Ok.as_u16());
            ctx.json(&json!({ "id": params.get(0) }))
        }))?;
        r.delete("/{id}", handler(|ctx, _| {
            ctx.set_status(StatusCode::NoContent.as_u16());
            Ok(())
        }))
    })?;

    Ok(router)
}
