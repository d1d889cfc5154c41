//! リクエストコンテキストの実装

use std::any::Any;
use std::collections::HashMap;

use serde::Serialize;

use crate::error::Error;
use super::http::{Request, StatusCode};

/// ミドルウェア・ハンドラー間でのデータ共有に使う型付きの入れ物
#[derive(Debug, Default)]
pub struct State {
    metadata: HashMap<String, Box<dyn Any + Send + Sync>>,
}

impl State {
    /// 新しいStateを作成
    pub fn new() -> Self {
        Self {
            metadata: HashMap::new(),
        }
    }

    /// 値を設定
    pub fn set<T: Send + Sync + 'static>(&mut self, key: &str, value: T) {
        self.metadata.insert(key.to_string(), Box::new(value));
    }

    /// 値を取得
    pub fn get<T: 'static>(&self, key: &str) -> Option<&T> {
        self.metadata
            .get(key)
            .and_then(|boxed| boxed.downcast_ref::<T>())
    }

    /// 値を取得し、なければ`init`で作って入れる
    ///
    /// 同じキーに別の型の値が入っていた場合は置き換える。
    pub fn get_or_insert_with<T, F>(&mut self, key: &str, init: F) -> &mut T
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> T,
    {
        let slot = self
            .metadata
            .entry(key.to_string())
            .or_insert_with(|| Box::new(()));
        if !slot.is::<T>() {
            *slot = Box::new(init());
        }
        slot.downcast_mut::<T>()
            .unwrap_or_else(|| unreachable!("slot holds the requested type"))
    }

    /// 値を削除して返却
    pub fn remove<T: 'static>(&mut self, key: &str) -> Option<T> {
        self.metadata
            .remove(key)
            .and_then(|boxed| boxed.downcast::<T>().ok())
            .map(|boxed| *boxed)
    }

    /// 指定されたキーが存在するかチェック
    pub fn contains_key(&self, key: &str) -> bool {
        self.metadata.contains_key(key)
    }

    /// 全てのキーを取得
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.metadata.keys()
    }

    /// 中身をクリア
    pub fn clear(&mut self) {
        self.metadata.clear();
    }

    /// 空かどうか
    pub fn is_empty(&self) -> bool {
        self.metadata.is_empty()
    }
}

/// 1リクエスト分のコンテキスト
///
/// `status`が設定済み（0以外）であれば「レスポンスは決定済み」とみなされる。
/// ディスパッチャーはbeforeハンドラーの実行後にこの値を見て処理を打ち切る。
#[derive(Debug)]
pub struct Context {
    request: Request,
    status: Option<u16>,
    headers: HashMap<String, String>,
    body: Vec<u8>,
    discarded: usize,
    state: State,
}

impl Context {
    /// リクエストからコンテキストを作成
    pub fn new(request: Request) -> Self {
        Self {
            request,
            status: None,
            headers: HashMap::new(),
            body: Vec::new(),
            discarded: 0,
            state: State::new(),
        }
    }

    /// 現在のリクエスト
    pub fn request(&self) -> &Request {
        &self.request
    }

    /// 設定済みのステータス
    pub fn status(&self) -> Option<u16> {
        self.status
    }

    /// ステータスを設定
    pub fn set_status(&mut self, status: u16) {
        self.status = Some(status);
    }

    /// ステータスを未設定に戻す
    pub fn clear_status(&mut self) {
        self.status = None;
    }

    /// レスポンスが決定済みかどうか
    pub fn is_answered(&self) -> bool {
        matches!(self.status, Some(code) if code != 0)
    }

    /// 出力に使うステータス
    ///
    /// 未決定の場合、ボディが書かれていれば200、なければ404。
    pub fn response_status(&self) -> u16 {
        match self.status {
            Some(code) if code != 0 => code,
            _ if self.content_length() > 0 => StatusCode::Ok.as_u16(),
            _ => StatusCode::NotFound.as_u16(),
        }
    }

    /// レスポンスヘッダーを設定
    pub fn set_header(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.headers.insert(key.into(), value.into());
    }

    /// レスポンスヘッダーを取得
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.get(key).map(String::as_str)
    }

    /// 全レスポンスヘッダー
    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// ボディに追記
    pub fn write(&mut self, bytes: impl AsRef<[u8]>) {
        self.body.extend_from_slice(bytes.as_ref());
    }

    /// ボディを置き換え
    pub fn set_body(&mut self, body: impl Into<Vec<u8>>) {
        self.body = body.into();
        self.discarded = 0;
    }

    /// 値をJSONとしてボディに設定
    pub fn json<T: Serialize>(&mut self, value: &T) -> Result<(), Error> {
        let body = serde_json::to_vec(value)
            .map_err(|e| Error::ResponseSerializationError(e.to_string()))?;
        self.headers
            .insert("Content-Type".to_string(), "application/json".to_string());
        self.body = body;
        self.discarded = 0;
        Ok(())
    }

    /// 現在のボディ
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// バッファ済みのボディを捨てる（HEADリクエスト用）
    ///
    /// 捨てたバイト数は`content_length`に残る。
    pub fn discard_body(&mut self) {
        self.discarded += self.body.len();
        self.body.clear();
    }

    /// 書き込まれたボディの長さ（捨てた分を含む）
    pub fn content_length(&self) -> usize {
        self.discarded + self.body.len()
    }

    /// 共有データ
    pub fn state(&self) -> &State {
        &self.state
    }

    /// 共有データ（可変）
    pub fn state_mut(&mut self) -> &mut State {
        &mut self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_basic() {
        let mut state = State::new();

        state.set("string_val", "hello".to_string());
        state.set("int_val", 42i32);
        state.set("bool_val", true);

        assert_eq!(state.get::<String>("string_val"), Some(&"hello".to_string()));
        assert_eq!(state.get::<i32>("int_val"), Some(&42));
        assert_eq!(state.get::<bool>("bool_val"), Some(&true));

        // 存在しないキー
        assert_eq!(state.get::<String>("nonexistent"), None);

        // 間違った型
        assert_eq!(state.get::<i32>("string_val"), None);
    }

    #[test]
    fn test_state_contains_keys_remove_clear() {
        let mut state = State::new();
        assert!(state.is_empty());

        state.set("key1", "value1".to_string());
        state.set("key2", 123);
        assert!(state.contains_key("key1"));
        assert!(!state.contains_key("key3"));
        assert_eq!(state.keys().count(), 2);

        let removed: Option<String> = state.remove("key1");
        assert_eq!(removed, Some("value1".to_string()));
        assert!(!state.contains_key("key1"));

        state.clear();
        assert!(state.is_empty());
    }

    #[test]
    fn test_context_status() {
        let mut ctx = Context::new(Request::new("GET", "/"));
        assert_eq!(ctx.status(), None);
        assert!(!ctx.is_answered());

        // 0は「未決定」扱い
        ctx.set_status(0);
        assert!(!ctx.is_answered());

        ctx.set_status(StatusCode::Ok.as_u16());
        assert!(ctx.is_answered());
        assert_eq!(ctx.status(), Some(200));

        ctx.clear_status();
        assert_eq!(ctx.status(), None);
    }

    #[test]
    fn test_context_response_status_defaults() {
        let mut ctx = Context::new(Request::new("GET", "/"));
        assert_eq!(ctx.response_status(), 404);

        ctx.write("hello");
        assert_eq!(ctx.response_status(), 200);

        ctx.set_status(201);
        assert_eq!(ctx.response_status(), 201);
    }

    #[test]
    fn test_context_body_and_json() {
        #[derive(Serialize)]
        struct Payload {
            id: u32,
        }

        let mut ctx = Context::new(Request::new("GET", "/"));
        ctx.write("ab");
        ctx.write(b"cd");
        assert_eq!(ctx.body(), b"abcd");

        ctx.json(&Payload { id: 7 }).unwrap();
        assert_eq!(ctx.body(), br#"{"id":7}"#);
        assert_eq!(ctx.header("Content-Type"), Some("application/json"));

        ctx.discard_body();
        assert!(ctx.body().is_empty());
        assert_eq!(ctx.content_length(), 8);

        ctx.set_body("x");
        assert_eq!(ctx.content_length(), 1);
    }

    #[test]
    fn test_discarded_body_still_answers_ok() {
        let mut ctx = Context::new(Request::new("HEAD", "/"));
        ctx.write("hello");
        ctx.discard_body();
        assert_eq!(ctx.response_status(), 200);
        assert_eq!(ctx.content_length(), 5);
    }

    #[test]
    fn test_state_get_or_insert_with() {
        let mut state = State::new();
        state.get_or_insert_with("calls", Vec::<String>::new).push("a".to_string());
        state.get_or_insert_with("calls", Vec::<String>::new).push("b".to_string());
        assert_eq!(
            state.get::<Vec<String>>("calls"),
            Some(&vec!["a".to_string(), "b".to_string()])
        );

        // 型が違えば作り直す
        state.set("count", "not a number");
        *state.get_or_insert_with("count", || 0u32) += 1;
        assert_eq!(state.get::<u32>("count"), Some(&1));
    }
}
