use async_trait::async_trait;
use routebridge::{
    error::Error, handler, Context, Middleware, Next, Request, RouteBridge, Router, StatusCode,
};
use serde::{Deserialize, Serialize};

// 全リクエストの前後でログを出すミドルウェア
struct AccessLog;

#[async_trait]
impl Middleware for AccessLog {
    async fn handle(&self, ctx: &mut Context, next: Next<'_>) -> Result<(), Error> {
        eprintln!("--> {} {}", ctx.request().method, ctx.request().uri);
        let result = next.run(ctx).await;
        eprintln!("<-- {}", ctx.response_status());
        result
    }
}

// ルーターが404にしたリクエストを拾うミドルウェア
struct NotFoundPage;

#[async_trait]
impl Middleware for NotFoundPage {
    async fn handle(&self, ctx: &mut Context, next: Next<'_>) -> Result<(), Error> {
        if ctx.status() == Some(StatusCode::NotFound.as_u16()) {
            ctx.set_header("Content-Type", "text/plain; charset=utf-8");
            ctx.write("ページが見つかりません");
        }
        next.run(ctx).await
    }
}

#[derive(Serialize, Deserialize)]
struct HelloResponse {
    message: String,
}

fn build_app() -> Result<RouteBridge, Error> {
    let mut router = Router::new();

    // 認証はbeforeルートで行い、失敗したらステータスを設定して打ち切る
    router.before("GET", "/hello/{name}", handler(|ctx, _| {
        eprintln!("auth before-route called");
        if ctx.request().header("X-Auth-Token") != Some("secret-token") {
            ctx.set_status(StatusCode::Unauthorized.as_u16());
            ctx.write("認証トークンが不正です");
        }
        Ok(())
    }))?;

    router.get("/hello/{name}", handler(|ctx, params| {
        eprintln!("hello handler called");
        ctx.set_status(StatusCode::Ok.as_u16());
        ctx.json(&HelloResponse {
            message: format!("認証成功！こんにちは、{}！", params.get(0).unwrap_or_default()),
        })
    }))?;

    Ok(RouteBridge::builder()
        .middleware(AccessLog)
        .router(router)
        .middleware(NotFoundPage)
        .build())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    env_logger::init();
    let app = build_app()?;

    #[cfg(feature = "cgi")]
    {
        routebridge::cgi::run_cgi(app).await?;
    }

    // CGIでない場合はサンプルリクエストを流す
    #[cfg(not(feature = "cgi"))]
    {
        for request in [
            Request::new("GET", "/hello/taro").with_header("X-Auth-Token", "secret-token"),
            Request::new("GET", "/hello/taro"),
            Request::new("GET", "/missing"),
        ] {
            let mut ctx = Context::new(request);
            app.handle(&mut ctx).await?;
            println!("{} {}", ctx.response_status(), String::from_utf8_lossy(ctx.body()));
        }
    }

    Ok(())
}
