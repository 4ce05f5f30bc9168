use std::fmt;
use std::str::FromStr;

/// HTTP 方法枚举
///
/// 除标准方法外，`Upload` 与 `Download` 表示交给原生层的上传/下载原语。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Connect,
    Head,
    Options,
    Trace,
    Upload,
    Download,
}

impl HttpMethod {
    /// 返回HTTP方法的字符串表示
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Connect => "CONNECT",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Trace => "TRACE",
            HttpMethod::Upload => "UPLOAD",
            HttpMethod::Download => "DOWNLOAD",
        }
    }

    /// 该方法的 `data` 是否作为请求体发送
    ///
    /// 返回 false 的方法把对象形式的 `data` 拼接到查询字符串。
    pub fn carries_body(&self) -> bool {
        matches!(
            self,
            HttpMethod::Post
                | HttpMethod::Put
                | HttpMethod::Delete
                | HttpMethod::Connect
                | HttpMethod::Upload
        )
    }

    /// 原生操作名，用于 `errMsg`（如 `request:ok`、`uploadFile:fail ...`）
    pub fn operation(&self) -> &'static str {
        match self {
            HttpMethod::Upload => "uploadFile",
            HttpMethod::Download => "downloadFile",
            _ => "request",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "DELETE" => Ok(HttpMethod::Delete),
            "CONNECT" => Ok(HttpMethod::Connect),
            "HEAD" => Ok(HttpMethod::Head),
            "OPTIONS" => Ok(HttpMethod::Options),
            "TRACE" => Ok(HttpMethod::Trace),
            "UPLOAD" => Ok(HttpMethod::Upload),
            "DOWNLOAD" => Ok(HttpMethod::Download),
            _ => Err(format!("unsupported http method: {}", s)),
        }
    }
}

/// 响应数据解析方式
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataType {
    /// 尝试对返回的文本做一次 JSON 解析，失败时保留原文
    Json,
    /// 其他取值，不做解析
    Other(String),
}

impl DataType {
    pub fn as_str(&self) -> &str {
        match self {
            DataType::Json => "json",
            DataType::Other(s) => s,
        }
    }
}

impl From<&str> for DataType {
    fn from(value: &str) -> Self {
        if value.eq_ignore_ascii_case("json") {
            DataType::Json
        } else {
            DataType::Other(value.to_string())
        }
    }
}

/// 响应体的数据类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseType {
    Text,
    ArrayBuffer,
}

/// 内容类型枚举
///
/// 由 `content-type` 请求头推断，决定请求体的编码方式。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    Json,
    FormUrlEncoded,
    FormMultipart,
}

impl ContentType {
    /// 从请求头的值推断内容类型，无法识别时返回 None
    pub fn from_header_value(value: &str) -> Option<Self> {
        let mime = value.split(';').next().unwrap_or_default().trim();
        if mime.eq_ignore_ascii_case("application/json") {
            Some(ContentType::Json)
        } else if mime.eq_ignore_ascii_case("application/x-www-form-urlencoded") {
            Some(ContentType::FormUrlEncoded)
        } else if mime.eq_ignore_ascii_case("multipart/form-data") {
            Some(ContentType::FormMultipart)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Json => "application/json",
            ContentType::FormUrlEncoded => "application/x-www-form-urlencoded",
            ContentType::FormMultipart => "multipart/form-data",
        }
    }
}
