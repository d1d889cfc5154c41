//! コアトレイト定義（Middleware）と後続チェーンへの継続`Next`

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Error;
use super::context::Context;

/// ミドルウェアの特性
///
/// 各ステージは`(ctx, next)`を受け取り、後続に処理を渡すなら`next.run(ctx)`を待つ。
/// `next`を呼ばずに戻ればそこでチェーンは終わる。
#[async_trait]
pub trait Middleware: Send + Sync {
    /// リクエストを処理
    async fn handle(&self, ctx: &mut Context, next: Next<'_>) -> Result<(), Error>;
}

/// 外側のミドルウェアチェーンの「残り」を表す継続
///
/// コピー可能なので、ハンドラーに渡した後でもディスパッチャー側で再利用できる。
#[derive(Clone, Copy)]
pub struct Next<'a> {
    chain: &'a [Arc<dyn Middleware>],
}

impl<'a> Next<'a> {
    /// 残りのチェーンから継続を作成
    pub fn new(chain: &'a [Arc<dyn Middleware>]) -> Self {
        Self { chain }
    }

    /// 何もしない継続
    pub fn end() -> Next<'static> {
        Next { chain: &[] }
    }

    /// 残りのステージ数
    pub fn remaining(&self) -> usize {
        self.chain.len()
    }

    /// チェーンの末尾かどうか
    pub fn is_end(&self) -> bool {
        self.chain.is_empty()
    }

    /// 先頭のステージを実行（末尾なら何もしない）
    pub async fn run(self, ctx: &mut Context) -> Result<(), Error> {
        match self.chain.split_first() {
            Some((head, rest)) => head.handle(ctx, Next::new(rest)).await,
            None => Ok(()),
        }
    }
}

impl std::fmt::Debug for Next<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Next")
            .field("remaining", &self.chain.len())
            .finish()
    }
}
