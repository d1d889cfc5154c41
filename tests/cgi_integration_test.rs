//! CGI環境変数からレスポンス出力までの結合テスト
#![cfg(feature = "cgi")]

use temp_env::with_vars;

use routebridge::cgi::request::request_from_env;
use routebridge::cgi::response::write_response_to;
use routebridge::{handler, Context, RouteBridge, Router, StatusCode};

fn app() -> RouteBridge {
    let mut router = Router::new();
    router
        .get("/users/{id}", handler(|ctx, params| {
            ctx.set_status(StatusCode::Ok.as_u16());
            ctx.set_header("Content-Type", "text/plain");
            ctx.write(format!("user {}", params.get(0).unwrap_or_default()));
            Ok(())
        }))
        .unwrap();
    RouteBridge::builder().router(router).build()
}

async fn render(vars: Vec<(&'static str, Option<&'static str>)>) -> String {
    let request = with_vars(vars, || request_from_env().expect("request"));
    let mut ctx = Context::new(request);
    app().handle(&mut ctx).await.expect("pipeline failed");

    let mut buf: Vec<u8> = Vec::new();
    write_response_to(&ctx, &mut buf).expect("write_response_to failed");
    String::from_utf8(buf).expect("utf8")
}

#[tokio::test]
async fn test_cgi_request_routes_under_script_directory() {
    let out = render(vec![
        ("REQUEST_METHOD", Some("GET")),
        ("REQUEST_URI", Some("/cgi-bin/users/7?verbose=1")),
        ("SCRIPT_NAME", Some("/cgi-bin/app.cgi")),
    ])
    .await;

    assert!(out.starts_with("Status: 200 OK\r\n"));
    assert!(out.contains("Content-Type: text/plain\r\n"));
    assert!(out.contains("Content-Length: 6\r\n"));
    assert!(out.ends_with("\r\n\r\nuser 7"));
}

#[tokio::test]
async fn test_cgi_unknown_route_is_404() {
    let out = render(vec![
        ("REQUEST_METHOD", Some("GET")),
        ("REQUEST_URI", None),
        ("PATH_INFO", Some("/missing")),
        ("QUERY_STRING", None),
        ("SCRIPT_NAME", Some("/app.cgi")),
    ])
    .await;

    assert_eq!(out, "Status: 404 Not Found\r\n\r\n");
}

#[tokio::test]
async fn test_cgi_head_request_has_headers_only() {
    let out = render(vec![
        ("REQUEST_METHOD", Some("HEAD")),
        ("REQUEST_URI", Some("/users/7")),
        ("SCRIPT_NAME", Some("/app.cgi")),
    ])
    .await;

    // GETと同じヘッダーを返し、ボディだけを省く
    assert!(out.starts_with("Status: 200 OK\r\n"));
    assert!(out.contains("Content-Type: text/plain\r\n"));
    assert!(out.contains("Content-Length: 6\r\n"));
    assert!(out.ends_with("\r\n\r\n"));
}
