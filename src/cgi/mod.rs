//! CGI環境での実行をサポートするモジュール
//!
//! 環境変数からリクエストを構築してルーターに渡し、
//! 標準出力にCGIレスポンスフォーマットで出力する。

pub mod core;
pub mod request;
pub mod response;
pub mod validation;

pub use core::run_cgi;
