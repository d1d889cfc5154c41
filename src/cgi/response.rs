//! CGIレスポンスの出力機能

use std::io::{self, Write};

use log::error;

use crate::common::{Context, StatusCode};
use crate::error::Error;
use super::validation::{is_valid_header_name, is_valid_header_value};

const BAD_HEADER_BODY: &[u8] = b"Bad Request: Invalid header";

fn write_line<W: Write>(out: &mut W, line: &str, what: &str) -> Result<(), Error> {
    out.write_all(line.as_bytes())
        .and_then(|_| out.write_all(b"\r\n"))
        .map_err(|e| Error::InternalServerError(format!("Failed to write {}: {}", what, e)))
}

/// コンテキストの内容をCGIレスポンスとしてライターへ書き出す
///
/// 不正なヘッダーが1つでもあれば、レスポンス全体を400に差し替える。
/// `Status`と`Content-Length`はユーザー指定を無視してここで付与する。
pub fn write_response_to<W: Write>(ctx: &Context, out: &mut W) -> Result<(), Error> {
    let mut headers: Vec<(&str, &str)> = Vec::new();
    let mut status = ctx.response_status();
    let mut body = ctx.body();
    // HEADで捨てたボディも長さとしては数える
    let mut content_length = ctx.content_length();

    for (name, value) in ctx.headers() {
        if name.eq_ignore_ascii_case("Status") || name.eq_ignore_ascii_case("Content-Length") {
            continue;
        }
        if !is_valid_header_name(name) || !is_valid_header_value(value) {
            error!("Invalid header detected - name: '{}', value: '{:?}'", name, value);
            status = StatusCode::BadRequest.as_u16();
            body = BAD_HEADER_BODY;
            content_length = BAD_HEADER_BODY.len();
            headers = vec![("Content-Type", "text/plain; charset=utf-8")];
            break;
        }
        headers.push((name.as_str(), value.as_str()));
    }
    // 出力順を安定させる
    headers.sort_unstable();

    let reason_phrase = StatusCode::from_u16(status)
        .map(|s| s.reason_phrase())
        .unwrap_or("Unknown");
    write_line(out, &format!("Status: {} {}", status, reason_phrase), "status line")?;

    for (name, value) in headers {
        write_line(out, &format!("{}: {}", name, value), "header")?;
    }
    if content_length > 0 {
        write_line(out, &format!("Content-Length: {}", content_length), "Content-Length")?;
    }

    // ヘッダーとボディの区切り
    write_line(out, "", "header/body separator")?;

    out.write_all(body)
        .map_err(|e| Error::InternalServerError(format!("Failed to write response body: {}", e)))
}

/// レスポンスを標準出力に書き出す
pub fn write_response(ctx: &Context) -> Result<(), Error> {
    let mut out = io::stdout().lock();
    let res = write_response_to(ctx, &mut out);
    out.flush()
        .map_err(|e| Error::InternalServerError(format!("Failed to flush stdout: {}", e)))?;
    res
}
