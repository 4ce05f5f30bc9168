use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::types::config::RequestConfig;
use crate::types::http::{DataType, ResponseType};

/// 响应数据
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    /// 按 json 解析成功的数据
    Json(Value),
    /// 原始文本
    Text(String),
    /// `ResponseType::ArrayBuffer` 时的二进制数据
    Binary(Vec<u8>),
    /// 没有响应体（如下载）
    Empty,
}

impl ResponseBody {
    /// 按配置解释原生层返回的字节
    ///
    /// `ArrayBuffer` 保留字节；否则按 UTF-8 解码，`DataType::Json` 时再尝试一次 JSON
    /// 解析，失败则保留原文。
    pub fn from_raw(bytes: Vec<u8>, data_type: &DataType, response_type: ResponseType) -> Self {
        if response_type == ResponseType::ArrayBuffer {
            return ResponseBody::Binary(bytes);
        }

        let text = match String::from_utf8(bytes) {
            Ok(text) => text,
            Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
        };

        if *data_type == DataType::Json {
            if let Ok(value) = serde_json::from_str::<Value>(&text) {
                return ResponseBody::Json(value);
            }
        }
        ResponseBody::Text(text)
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            ResponseBody::Json(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ResponseBody::Text(text) => Some(text),
            _ => None,
        }
    }

    /// 转为 JSON 值：文本成为字符串，二进制成为数字数组，空为 null
    pub fn to_value(&self) -> Value {
        match self {
            ResponseBody::Json(value) => value.clone(),
            ResponseBody::Text(text) => Value::String(text.clone()),
            ResponseBody::Binary(bytes) => {
                Value::Array(bytes.iter().map(|b| Value::from(*b)).collect())
            }
            ResponseBody::Empty => Value::Null,
        }
    }

    /// 反序列化为调用方需要的类型
    pub fn decode<T: DeserializeOwned>(self) -> serde_json::Result<T> {
        match self {
            ResponseBody::Json(value) => serde_json::from_value(value),
            other => serde_json::from_value(other.to_value()),
        }
    }
}

/// 成功完成的请求结果
#[derive(Debug, Clone)]
pub struct HttpResponse<T = ResponseBody> {
    /// 发起请求时的最终配置
    pub config: RequestConfig,
    pub status_code: u16,
    pub cookies: Vec<String>,
    pub data: T,
    /// 原生层消息，如 `request:ok`
    pub err_msg: String,
    pub header: BTreeMap<String, String>,
    /// 下载文件的临时路径，仅下载请求设置
    pub temp_file_path: Option<String>,
}

impl<T> HttpResponse<T> {
    pub fn map_data<U, F>(self, f: F) -> HttpResponse<U>
    where
        F: FnOnce(T) -> U,
    {
        HttpResponse {
            config: self.config,
            status_code: self.status_code,
            cookies: self.cookies,
            data: f(self.data),
            err_msg: self.err_msg,
            header: self.header,
            temp_file_path: self.temp_file_path,
        }
    }
}

impl HttpResponse<ResponseBody> {
    /// 把响应数据反序列化为 `T`，失败时返回 `ErrorKind::Decode`
    pub fn decode<T: DeserializeOwned>(self) -> Result<HttpResponse<T>, HttpError> {
        match self.data.clone().decode::<T>() {
            Ok(data) => Ok(self.map_data(|_| data)),
            Err(e) => {
                let message = format!(
                    "{}:fail decode response data: {}",
                    self.config.method().operation(),
                    e
                );
                let mut error = HttpError::from_response(ErrorKind::Decode, self);
                error.err_msg = message;
                Err(error)
            }
        }
    }
}

/// 下载结果
#[derive(Debug, Clone)]
pub struct HttpDownloadResponse {
    pub temp_file_path: String,
    pub response: HttpResponse,
}

impl std::ops::Deref for HttpDownloadResponse {
    type Target = HttpResponse;

    fn deref(&self) -> &Self::Target {
        &self.response
    }
}

/// 错误分类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// 网络或原生层失败，没有状态码
    Transport,
    /// 通过任务句柄取消
    Aborted,
    /// 原生层成功返回，但状态码未通过校验
    Status,
    /// 拦截器主动拒绝
    Interceptor,
    /// 响应数据无法反序列化为目标类型
    Decode,
    /// 调用参数不合法
    InvalidConfig,
}

/// 请求失败
///
/// 与 [`HttpResponse`] 形状相同，但只有 `config` 与 `err_msg` 一定存在。
#[derive(Debug, Clone, thiserror::Error)]
#[error("{err_msg}")]
pub struct HttpError {
    pub kind: ErrorKind,
    pub config: RequestConfig,
    pub status_code: Option<u16>,
    pub cookies: Option<Vec<String>>,
    pub data: Option<ResponseBody>,
    pub err_msg: String,
    pub header: Option<BTreeMap<String, String>>,
}

impl HttpError {
    pub fn new(kind: ErrorKind, config: RequestConfig, err_msg: impl Into<String>) -> Self {
        Self {
            kind,
            config,
            status_code: None,
            cookies: None,
            data: None,
            err_msg: err_msg.into(),
            header: None,
        }
    }

    /// 原生层失败
    pub fn transport(config: RequestConfig, cause: &anyhow::Error) -> Self {
        let err_msg = format!("{}:fail {:#}", config.method().operation(), cause);
        Self::new(ErrorKind::Transport, config, err_msg)
    }

    /// 请求被取消
    pub fn aborted(config: RequestConfig) -> Self {
        let err_msg = format!("{}:fail abort", config.method().operation());
        Self::new(ErrorKind::Aborted, config, err_msg)
    }

    /// 拦截器拒绝
    pub fn interceptor(config: RequestConfig, reason: impl Into<String>) -> Self {
        Self::new(ErrorKind::Interceptor, config, reason)
    }

    pub fn invalid_config(config: RequestConfig, reason: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidConfig, config, reason)
    }

    /// 状态码未通过校验，保留完整的响应信息
    pub fn status(response: HttpResponse) -> Self {
        let err_msg = format!(
            "{}:fail status code {}",
            response.config.method().operation(),
            response.status_code
        );
        let mut error = Self::from_response(ErrorKind::Status, response);
        error.err_msg = err_msg;
        error
    }

    /// 用一个已完成的响应构造错误
    pub fn from_response(kind: ErrorKind, response: HttpResponse) -> Self {
        Self {
            kind,
            config: response.config,
            status_code: Some(response.status_code),
            cookies: Some(response.cookies),
            data: Some(response.data),
            err_msg: response.err_msg,
            header: Some(response.header),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn is_aborted(&self) -> bool {
        self.kind == ErrorKind::Aborted
    }
}
