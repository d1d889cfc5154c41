//! 共通の抽象化レイヤーとトレイト定義

pub mod context;
pub mod http;
pub mod traits;

pub use context::{Context, State};
pub use http::{Method, Request, StatusCode};
pub use traits::{Middleware, Next};
