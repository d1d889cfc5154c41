//! ディスパッチ処理
//!
//! START -> BEFORE -> (早期終了 | AFTER) -> (ハンドラー実行 | 404) -> DONE
//!
//! 1. 実効メソッドを決める（HEADはGETとして扱いボディを捨てる、POSTはオーバーライドヘッダーを見る）
//! 2. beforeルートにマッチすればハンドラーを実行し、ステータスが決まっていればここで終了
//! 3. afterルートにマッチすればハンドラーを実行して終了
//! 4. どれにもマッチしなければ404を設定して外側の`next`へ進む

use async_trait::async_trait;
use log::{debug, warn};

use crate::common::{Context, Method, Middleware, Next, Request, StatusCode};
use crate::error::Error;

use super::matcher::{self, RouteMatch};
use super::table::Phase;
use super::Router;

/// メソッドオーバーライド用のヘッダー
pub const METHOD_OVERRIDE_HEADER: &str = "X-HTTP-Method-Override";

/// オーバーライドで指定できるメソッド
const OVERRIDABLE_METHODS: [Method; 3] = [Method::PUT, Method::DELETE, Method::PATCH];

/// ディスパッチの結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// beforeハンドラーがレスポンスを確定させたので打ち切った
    Answered,
    /// afterハンドラーを実行した
    Dispatched,
    /// マッチするルートがなく、404を設定して`next`へ進んだ
    NotFound,
}

impl Router {
    /// ルーティングに使うメソッドを決める
    pub fn effective_method(&self, request: &Request) -> String {
        let raw = request.method.as_str();

        if raw == Method::HEAD.as_str() {
            return Method::GET.as_str().to_string();
        }

        if raw == Method::POST.as_str() && self.config().method_override {
            if let Some(value) = request.header(METHOD_OVERRIDE_HEADER) {
                if OVERRIDABLE_METHODS.iter().any(|m| m.as_str() == value) {
                    debug!("Method overridden: POST -> {}", value);
                    return value.to_string();
                }
                warn!("Ignoring unsupported {} value: {}", METHOD_OVERRIDE_HEADER, value);
            }
        }

        raw.to_string()
    }

    /// サーバーのベースパス
    ///
    /// 設定で固定されていなければ最初のリクエストのスクリプトパスから算出し、以後使い回す。
    pub fn base_path(&self, request: &Request) -> &str {
        if let Some(base_path) = &self.config().base_path {
            return base_path;
        }
        self.base_path
            .get_or_init(|| derive_base_path(&request.script_name))
    }

    /// マッチングに使う正規化済みURI
    pub fn current_uri(&self, request: &Request) -> String {
        normalize_uri(&request.uri, self.base_path(request))
    }

    /// フェーズ・メソッド・URIでルートを解決する
    pub fn resolve(&self, phase: Phase, method: &str, uri: &str) -> Option<RouteMatch> {
        let routes = self.routes_for(phase, method);
        if routes.is_empty() {
            return None;
        }
        matcher::resolve(routes, uri)
    }

    /// リクエストをディスパッチする
    ///
    /// ハンドラーが返したエラーはそのまま呼び出し元へ伝播する。
    pub async fn dispatch(&self, ctx: &mut Context, next: Next<'_>) -> Result<Outcome, Error> {
        let is_head = ctx.request().method == Method::HEAD.as_str();

        let result = self.run_phases(ctx, next).await;

        // HEADではバッファしたボディを捨てる
        if is_head {
            ctx.discard_body();
        }
        result
    }

    async fn run_phases(&self, ctx: &mut Context, next: Next<'_>) -> Result<Outcome, Error> {
        let (method, uri) = {
            let request = ctx.request();
            (self.effective_method(request), self.current_uri(request))
        };
        debug!("Dispatching {} {}", method, uri);

        if let Some(found) = self.resolve(Phase::Before, &method, &uri) {
            debug!("Before route matched: {}", found.pattern());
            let (handler, params) = found.into_parts();
            handler.handle(ctx, next, &params).await?;

            if ctx.is_answered() {
                debug!(
                    "Before route answered {} {} with status {:?}",
                    method,
                    uri,
                    ctx.status()
                );
                return Ok(Outcome::Answered);
            }
        }

        if let Some(found) = self.resolve(Phase::After, &method, &uri) {
            debug!("Route matched: {}", found.pattern());
            let (handler, params) = found.into_parts();
            handler.handle(ctx, next, &params).await?;
            return Ok(Outcome::Dispatched);
        }

        debug!("No route for {} {}", method, uri);
        ctx.set_status(StatusCode::NotFound.as_u16());
        next.run(ctx).await?;
        Ok(Outcome::NotFound)
    }
}

#[async_trait]
impl Middleware for Router {
    async fn handle(&self, ctx: &mut Context, next: Next<'_>) -> Result<(), Error> {
        self.dispatch(ctx, next).await.map(|_| ())
    }
}

/// スクリプトパスからベースパスを算出する（最後の要素を落として`/`で終える）
pub fn derive_base_path(script_name: &str) -> String {
    let mut parts: Vec<&str> = script_name.split('/').collect();
    parts.pop();
    format!("{}/", parts.join("/"))
}

/// 生のURIを正規化する
///
/// ベースパスを取り除き、クエリ文字列を落とし、前後の`/`をトリムして`/`を1つ付ける。
/// 末尾の`/`を除いたベースパスそのもの（`/app`や`/app?x=1`）はルートとして扱う。
/// URIがベースパスで始まらない場合はそのまま扱う。
pub fn normalize_uri(raw: &str, base_path: &str) -> String {
    let uri = raw
        .strip_prefix(base_path)
        .or_else(|| {
            raw.strip_prefix(base_path.trim_end_matches('/'))
                .filter(|rest| rest.is_empty() || rest.starts_with('?'))
        })
        .unwrap_or(raw);
    let uri = match uri.find('?') {
        Some(idx) => &uri[..idx],
        None => uri,
    };
    format!("/{}", uri.trim_matches('/'))
}
