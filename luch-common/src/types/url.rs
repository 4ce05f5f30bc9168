use serde_json::{Map, Value};

use crate::types::config::RequestConfig;

/// 根据配置拼接完整的请求地址
///
/// 相对地址拼接到 `base_url` 之后，去掉 `#` 片段，再把查询参数追加到末尾。
/// 不携带请求体的方法会把对象形式的 `data` 一并作为查询参数。
pub fn build_url(config: &RequestConfig) -> String {
    let url = config.url.as_deref().unwrap_or_default();
    let mut full_url = match config.base_url.as_deref() {
        Some(base_url) if !is_absolute_url(url) => combine_urls(base_url, url),
        _ => url.to_string(),
    };

    if let Some(hash_index) = full_url.find('#') {
        full_url.truncate(hash_index);
    }

    let query = serialize_params(&query_params(config));
    if query.is_empty() {
        return full_url;
    }

    let separator = if full_url.contains('?') { '&' } else { '?' };
    format!("{}{}{}", full_url, separator, query)
}

/// 判断是否为绝对地址（`scheme://` 或协议相对的 `//`）
pub fn is_absolute_url(url: &str) -> bool {
    if url.starts_with("//") {
        return true;
    }
    match url.find("://") {
        Some(index) if index > 0 => {
            let scheme = &url[..index];
            scheme.starts_with(|c: char| c.is_ascii_alphabetic())
                && scheme
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        _ => false,
    }
}

/// 用恰好一个 `/` 连接基地址与相对路径
pub fn combine_urls(base_url: &str, relative_url: &str) -> String {
    if relative_url.is_empty() {
        return base_url.to_string();
    }
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        relative_url.trim_start_matches('/')
    )
}

/// 实际发送到查询字符串上的参数
///
/// 不带请求体的方法会把对象 `data` 并入 `params`，同名键以 `data` 为准，
/// 与方法简写放置 `data` 的结果一致。
pub fn query_params(config: &RequestConfig) -> Map<String, Value> {
    let mut params = config.params.clone();
    if !config.method().carries_body() {
        if let Some(Value::Object(data)) = &config.data {
            params.extend(data.clone());
        }
    }
    params
}

/// 序列化查询参数
///
/// 字符串原样输出，数字与布尔值转为文本，`null` 跳过，
/// 数组展开为重复的 `key[]`，对象输出其 JSON 文本。
pub fn serialize_params(params: &Map<String, Value>) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in params {
        match value {
            Value::Null => {}
            Value::Array(items) => {
                let array_key = format!("{}[]", key);
                for item in items.iter().filter(|item| !item.is_null()) {
                    serializer.append_pair(&array_key, &scalar_text(item));
                }
            }
            other => {
                serializer.append_pair(key, &scalar_text(other));
            }
        }
    }
    serializer.finish()
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
