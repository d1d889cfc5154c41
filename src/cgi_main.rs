//! CGI環境でのエントリポイント

use std::env;

use env_logger::Env;
use log::{error, info};
use routebridge::{cgi, RouteBridge};

mod sample_handler;

#[tokio::main]
async fn main() {
    // CGIでは標準出力がHTTPレスポンスとなるため、ログは標準エラー出力に出力する
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    info!("Starting RouteBridge CGI application");

    let admin_token = env::var("ROUTEBRIDGE_ADMIN_TOKEN").unwrap_or_default();
    let router = match sample_handler::demo_router(&admin_token) {
        Ok(router) => router,
        Err(err) => {
            error!("Failed to register routes: {}", err);
            std::process::exit(1);
        }
    };

    let app = RouteBridge::builder().router(router).build();

    if let Err(err) = cgi::run_cgi(app).await {
        error!("Error running CGI application: {:?}", err);
        std::process::exit(1);
    }
}
