//! CGIメイン実行ロジック

use log::{debug, error, info};
use tokio::task;

use crate::common::{Context, Request};
use crate::error::Error;
use crate::RouteBridge;
use super::request::request_from_env;
use super::response::write_response;

/// エラーをステータス付きのプレーンテキストレスポンスに変換
pub(crate) fn error_context(request: Request, err: &Error) -> Context {
    let mut ctx = Context::new(request);
    ctx.set_status(err.status_code());
    ctx.set_header("Content-Type", "text/plain; charset=utf-8");
    ctx.set_body(err.to_string().into_bytes());
    ctx
}

/// CGI環境変数からリクエストを構築し、チェーンを実行して標準出力へ書き出す
pub async fn run_cgi(app: RouteBridge) -> Result<(), Error> {
    let request = match request_from_env() {
        Ok(request) => request,
        Err(err) => {
            error!("Failed to build CGI request: {}", err);
            return write_response(&error_context(Request::default(), &err));
        }
    };
    let (method, uri) = (request.method.clone(), request.uri.clone());
    debug!("Processing CGI request: {} {}", method, uri);

    // ハンドラ内でのpanicを検知するためにspawnしてJoinErrorを検査
    let fallback = request.clone();
    let task_result = task::spawn(async move {
        let mut ctx = Context::new(request);
        let result = app.handle(&mut ctx).await;
        (ctx, result)
    })
    .await;

    let ctx = match task_result {
        Ok((ctx, Ok(()))) => ctx,
        Ok((_, Err(err))) => {
            error!("Error processing {} {}: {:?}", method, uri, err);
            error_context(fallback, &err)
        }
        Err(join_err) => {
            let err = if join_err.is_panic() {
                Error::InternalServerError("panic occurred in handler".to_string())
            } else {
                Error::InternalServerError(format!("task cancelled: {}", join_err))
            };
            error!("{} at {} {}", err, method, uri);
            error_context(fallback, &err)
        }
    };

    write_response(&ctx)?;
    info!("CGI request processed: {} {} -> {}", method, uri, ctx.response_status());
    Ok(())
}
