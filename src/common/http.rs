//! HTTP関連の基本型（メソッド、ステータス、トランスポートから渡されるリクエスト）

use std::collections::HashMap;
use std::fmt;

/// HTTPステータスコード
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    // 2xx Success
    Ok = 200,
    Created = 201,
    NoContent = 204,

    // 4xx Client Error
    BadRequest = 400,
    Unauthorized = 401,
    Forbidden = 403,
    NotFound = 404,
    MethodNotAllowed = 405,

    // 5xx Server Error
    InternalServerError = 500,
    NotImplemented = 501,
    BadGateway = 502,
    ServiceUnavailable = 503,
}

impl StatusCode {
    /// u16の値を取得
    pub fn as_u16(&self) -> u16 {
        *self as u16
    }

    /// u16から既知のステータスへ変換
    pub fn from_u16(code: u16) -> Option<Self> {
        match code {
            200 => Some(StatusCode::Ok),
            201 => Some(StatusCode::Created),
            204 => Some(StatusCode::NoContent),
            400 => Some(StatusCode::BadRequest),
            401 => Some(StatusCode::Unauthorized),
            403 => Some(StatusCode::Forbidden),
            404 => Some(StatusCode::NotFound),
            405 => Some(StatusCode::MethodNotAllowed),
            500 => Some(StatusCode::InternalServerError),
            501 => Some(StatusCode::NotImplemented),
            502 => Some(StatusCode::BadGateway),
            503 => Some(StatusCode::ServiceUnavailable),
            _ => None,
        }
    }

    /// 理由句を取得
    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::Created => "Created",
            StatusCode::NoContent => "No Content",
            StatusCode::BadRequest => "Bad Request",
            StatusCode::Unauthorized => "Unauthorized",
            StatusCode::Forbidden => "Forbidden",
            StatusCode::NotFound => "Not Found",
            StatusCode::MethodNotAllowed => "Method Not Allowed",
            StatusCode::InternalServerError => "Internal Server Error",
            StatusCode::NotImplemented => "Not Implemented",
            StatusCode::BadGateway => "Bad Gateway",
            StatusCode::ServiceUnavailable => "Service Unavailable",
        }
    }
}

impl From<StatusCode> for u16 {
    fn from(status: StatusCode) -> u16 {
        status.as_u16()
    }
}

/// HTTPメソッド
///
/// ルートテーブルのキーは文字列のまま扱う（大文字小文字の正規化はしない）。
/// この列挙型は動詞ショートカットと`all`のメソッド集合を表すためのもの。
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum Method {
    GET,
    POST,
    PUT,
    DELETE,
    PATCH,
    HEAD,
    OPTIONS,
}

impl Method {
    /// `all`で登録されるメソッド集合（登録順）
    pub const ALL: [Method; 7] = [
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::DELETE,
        Method::OPTIONS,
        Method::PATCH,
        Method::HEAD,
    ];

    /// メソッド名の文字列表現
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::GET => "GET",
            Method::POST => "POST",
            Method::PUT => "PUT",
            Method::DELETE => "DELETE",
            Method::PATCH => "PATCH",
            Method::HEAD => "HEAD",
            Method::OPTIONS => "OPTIONS",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// トランスポート層から渡される現在のリクエスト
///
/// ルーターが必要とするのはメソッド・生のリクエストURI・ヘッダー・スクリプトパスのみ。
/// ボディのデコードやヘッダーの解析はトランスポート側の責務。
#[derive(Debug, Clone, Default)]
pub struct Request {
    /// 生のHTTPメソッド（HEADやオーバーライド前の値）
    pub method: String,
    /// 生のリクエストURI（クエリ文字列を含む）
    pub uri: String,
    /// スクリプトのパス（ベースパスの算出に使う）
    pub script_name: String,
    /// HTTPヘッダー（キーは小文字）
    headers: HashMap<String, String>,
}

impl Request {
    /// 新しいリクエストを作成
    pub fn new(method: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            uri: uri.into(),
            script_name: String::new(),
            headers: HashMap::new(),
        }
    }

    /// ヘッダーを追加（取込み時にキーを小文字化する）
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert_header(key, value);
        self
    }

    /// スクリプトパスを設定
    pub fn with_script_name(mut self, script_name: impl Into<String>) -> Self {
        self.script_name = script_name.into();
        self
    }

    /// ヘッダーを追加
    pub fn insert_header(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.headers
            .insert(key.into().to_ascii_lowercase(), value.into());
    }

    /// 名前を指定してヘッダーを取得（大文字小文字を区別しない）
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// 全ヘッダー
    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// クエリ文字列を除いたURI
    pub fn path(&self) -> &str {
        match self.uri.find('?') {
            Some(idx) => &self.uri[..idx],
            None => &self.uri,
        }
    }

    /// `?`以降のクエリ文字列（なければ空）
    pub fn query_string(&self) -> &str {
        match self.uri.find('?') {
            Some(idx) => &self.uri[idx + 1..],
            None => "",
        }
    }
}
