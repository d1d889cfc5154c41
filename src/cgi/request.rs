//! CGI環境変数からリクエストを組み立てる

use std::collections::HashMap;
use std::env;

use log::{debug, warn};

use crate::common::Request;
use crate::error::Error;
use super::validation::{is_valid_header_name, is_valid_header_value};

/// `HTTP_X_AUTH_TOKEN` -> `X-Auth-Token` のように変換
fn header_name_from_env(key: &str) -> String {
    key.split('_')
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                None => String::new(),
                Some(c) => c.to_ascii_uppercase().to_string() + &chars.as_str().to_ascii_lowercase(),
            }
        })
        .collect::<Vec<String>>()
        .join("-")
}

/// 環境変数からHTTPヘッダーを取得する
///
/// 名前・値の検証に通らないものは捨てる。
pub fn get_cgi_headers() -> HashMap<String, String> {
    let mut headers = HashMap::new();
    for (key, value) in env::vars() {
        let header_name = if let Some(rest) = key.strip_prefix("HTTP_") {
            header_name_from_env(rest)
        } else if key == "CONTENT_TYPE" || key == "CONTENT_LENGTH" {
            header_name_from_env(&key)
        } else {
            continue;
        };

        if !is_valid_header_name(&header_name) || !is_valid_header_value(&value) {
            warn!("Dropping invalid request header from {}", key);
            continue;
        }
        headers.insert(header_name, value);
    }
    headers
}

/// CGI環境変数からリクエストを構築する
///
/// URIは`REQUEST_URI`を優先し、なければ`PATH_INFO`と`QUERY_STRING`から組み立てる。
pub fn request_from_env() -> Result<Request, Error> {
    let method = env::var("REQUEST_METHOD")
        .ok()
        .filter(|m| !m.is_empty())
        .ok_or_else(|| {
            Error::InvalidRequest("REQUEST_METHOD environment variable not set".to_string())
        })?;

    let uri = match env::var("REQUEST_URI") {
        Ok(uri) if !uri.is_empty() => uri,
        _ => {
            let path = env::var("PATH_INFO").unwrap_or_else(|_| "/".to_string());
            match env::var("QUERY_STRING") {
                Ok(query) if !query.is_empty() => format!("{}?{}", path, query),
                _ => path,
            }
        }
    };
    let script_name = env::var("SCRIPT_NAME").unwrap_or_default();

    let mut request = Request::new(method, uri).with_script_name(script_name);
    for (name, value) in get_cgi_headers() {
        request.insert_header(name, value);
    }

    debug!(
        "CGI request: {} {} (script: {})",
        request.method, request.uri, request.script_name
    );
    Ok(request)
}
