//! エラー型の定義

use thiserror::Error;

/// ルーターのエラー型
#[derive(Error, Debug)]
pub enum Error {
    /// ルートパターンが不正（空のプレースホルダーなど）
    #[error("Invalid route pattern: {0}")]
    InvalidPattern(String),

    /// トランスポートから受け取ったリクエストが不正
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// レスポンスのシリアライズエラー
    #[error("Failed to serialize response: {0}")]
    ResponseSerializationError(String),

    /// ハンドラー内で発生したエラー
    #[error("Handler error: {0}")]
    HandlerError(String),

    /// ミドルウェアエラー
    #[error("Middleware error: {0}")]
    MiddlewareError(String),

    /// 設定エラー
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// 内部サーバーエラー
    #[error("Internal server error: {0}")]
    InternalServerError(String),
}

impl Error {
    /// エラーからHTTPステータスコードを取得
    pub fn status_code(&self) -> u16 {
        match self {
            Error::InvalidPattern(_) => 500,
            Error::InvalidRequest(_) => 400,
            Error::ResponseSerializationError(_) => 500,
            Error::HandlerError(_) => 500,
            Error::MiddlewareError(_) => 500,
            Error::ConfigurationError(_) => 500,
            Error::InternalServerError(_) => 500,
        }
    }
}
