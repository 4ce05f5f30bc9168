use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde_json::{Map, Value};

use crate::task::RequestTask;
use crate::types::http::{DataType, HttpMethod, ResponseType};

/// 原生任务回调：在请求发出后、结果返回前同步调用
///
/// 回调中请勿修改配置，这里只提供只读引用。
pub type GetTaskHook = Arc<dyn Fn(&RequestTask, &RequestConfig) + Send + Sync>;

/// 状态码校验器，返回 false 时请求以错误结束
pub type ValidateStatus = Arc<dyn Fn(u16) -> bool + Send + Sync>;

/// 默认超时时间
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// 默认状态码校验：仅 2xx 视为成功
pub fn default_validate_status(status_code: u16) -> bool {
    (200..300).contains(&status_code)
}

/// 待上传的文件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    /// multipart 表单中的字段名
    pub name: String,
    /// 本地文件路径
    pub path: String,
}

impl UploadFile {
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }
}

/// 单次请求的配置
///
/// 所有字段都是可选的。实例默认配置、`set_config` 注册的全局变换以及每次调用的配置
/// 通过 [`merge_config`] 合并成最终交给拦截器链的配置。
#[derive(Clone, Default)]
pub struct RequestConfig {
    pub base_url: Option<String>,
    pub url: Option<String>,
    /// 查询参数，自动拼接为查询字符串
    pub params: Map<String, Value>,
    /// 请求体
    pub data: Option<Value>,

    /// 上传文件对应的字段名
    pub name: Option<String>,
    /// 上传时额外的表单字段
    pub form_data: Map<String, Value>,
    pub file_path: Option<String>,
    /// 上传文件列表，存在时 `file_path` 与 `name` 不生效
    pub files: Option<Vec<UploadFile>>,

    pub header: BTreeMap<String, String>,
    pub method: Option<HttpMethod>,
    pub data_type: Option<DataType>,
    pub response_type: Option<ResponseType>,
    /// 自定义参数，原样透传给拦截器
    pub custom: Map<String, Value>,
    pub timeout: Option<Duration>,
    pub first_ipv4: Option<bool>,
    pub ssl_verify: Option<bool>,
    pub with_credentials: Option<bool>,

    pub get_task: Option<GetTaskHook>,
    pub validate_status: Option<ValidateStatus>,
}

impl RequestConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// 库的默认配置
    pub fn defaults() -> Self {
        Self {
            method: Some(HttpMethod::Get),
            data_type: Some(DataType::Json),
            response_type: Some(ResponseType::Text),
            timeout: Some(DEFAULT_TIMEOUT),
            first_ipv4: Some(false),
            ssl_verify: Some(true),
            with_credentials: Some(false),
            validate_status: Some(Arc::new(default_validate_status)),
            ..Self::default()
        }
    }

    pub fn method(&self) -> HttpMethod {
        self.method.unwrap_or(HttpMethod::Get)
    }

    pub fn data_type(&self) -> DataType {
        self.data_type.clone().unwrap_or(DataType::Json)
    }

    pub fn response_type(&self) -> ResponseType {
        self.response_type.unwrap_or(ResponseType::Text)
    }

    /// 用配置的校验器（未设置时用默认 2xx 规则）判断状态码
    pub fn is_status_valid(&self, status_code: u16) -> bool {
        match &self.validate_status {
            Some(validate) => validate(status_code),
            None => default_validate_status(status_code),
        }
    }

    /// 实际要上传的文件
    ///
    /// `files` 非空时优先，此时 `file_path` 与 `name` 不生效；
    /// 否则使用 `file_path`，字段名取 `name`，缺省为 `file`。
    pub fn upload_files(&self) -> Vec<UploadFile> {
        match &self.files {
            Some(files) if !files.is_empty() => files.clone(),
            _ => self
                .file_path
                .iter()
                .map(|path| UploadFile::new(self.name.as_deref().unwrap_or("file"), path.clone()))
                .collect(),
        }
    }

    /// 按名称查找请求头，忽略大小写
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.header
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_method(mut self, method: HttpMethod) -> Self {
        self.method = Some(method);
        self
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn with_data(mut self, data: impl Into<Value>) -> Self {
        self.data = Some(data.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.header.insert(name.into(), value.into());
        self
    }

    pub fn with_custom(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.custom.insert(key.into(), value.into());
        self
    }

    pub fn with_data_type(mut self, data_type: impl Into<DataType>) -> Self {
        self.data_type = Some(data_type.into());
        self
    }

    pub fn with_response_type(mut self, response_type: ResponseType) -> Self {
        self.response_type = Some(response_type);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_file_path(mut self, file_path: impl Into<String>) -> Self {
        self.file_path = Some(file_path.into());
        self
    }

    pub fn with_files(mut self, files: Vec<UploadFile>) -> Self {
        self.files = Some(files);
        self
    }

    pub fn with_form_data(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.form_data.insert(key.into(), value.into());
        self
    }

    pub fn with_ssl_verify(mut self, ssl_verify: bool) -> Self {
        self.ssl_verify = Some(ssl_verify);
        self
    }

    pub fn with_first_ipv4(mut self, first_ipv4: bool) -> Self {
        self.first_ipv4 = Some(first_ipv4);
        self
    }

    pub fn with_credentials(mut self, with_credentials: bool) -> Self {
        self.with_credentials = Some(with_credentials);
        self
    }

    pub fn with_get_task<F>(mut self, hook: F) -> Self
    where
        F: Fn(&RequestTask, &RequestConfig) + Send + Sync + 'static,
    {
        self.get_task = Some(Arc::new(hook));
        self
    }

    pub fn with_validate_status<F>(mut self, validate: F) -> Self
    where
        F: Fn(u16) -> bool + Send + Sync + 'static,
    {
        self.validate_status = Some(Arc::new(validate));
        self
    }
}

impl fmt::Debug for RequestConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestConfig")
            .field("base_url", &self.base_url)
            .field("url", &self.url)
            .field("params", &self.params)
            .field("data", &self.data)
            .field("name", &self.name)
            .field("form_data", &self.form_data)
            .field("file_path", &self.file_path)
            .field("files", &self.files)
            .field("header", &self.header)
            .field("method", &self.method)
            .field("data_type", &self.data_type)
            .field("response_type", &self.response_type)
            .field("custom", &self.custom)
            .field("timeout", &self.timeout)
            .field("first_ipv4", &self.first_ipv4)
            .field("ssl_verify", &self.ssl_verify)
            .field("with_credentials", &self.with_credentials)
            .field("get_task", &self.get_task.is_some())
            .field("validate_status", &self.validate_status.is_some())
            .finish()
    }
}

/// 合并两份配置，`overlay` 中已设置的字段优先
///
/// - 标量与可选字段：`overlay` 设置了就覆盖
/// - `header`、`params`、`custom`、`form_data`：按键合并，同名键取 `overlay` 的值
/// - `data`、`files` 与回调：整体覆盖，不做深合并
pub fn merge_config(base: &RequestConfig, overlay: RequestConfig) -> RequestConfig {
    RequestConfig {
        base_url: overlay.base_url.or_else(|| base.base_url.clone()),
        url: overlay.url.or_else(|| base.url.clone()),
        params: merge_map(&base.params, overlay.params),
        data: overlay.data.or_else(|| base.data.clone()),
        name: overlay.name.or_else(|| base.name.clone()),
        form_data: merge_map(&base.form_data, overlay.form_data),
        file_path: overlay.file_path.or_else(|| base.file_path.clone()),
        files: overlay.files.or_else(|| base.files.clone()),
        header: {
            let mut header = base.header.clone();
            header.extend(overlay.header);
            header
        },
        method: overlay.method.or(base.method),
        data_type: overlay.data_type.or_else(|| base.data_type.clone()),
        response_type: overlay.response_type.or(base.response_type),
        custom: merge_map(&base.custom, overlay.custom),
        timeout: overlay.timeout.or(base.timeout),
        first_ipv4: overlay.first_ipv4.or(base.first_ipv4),
        ssl_verify: overlay.ssl_verify.or(base.ssl_verify),
        with_credentials: overlay.with_credentials.or(base.with_credentials),
        get_task: overlay.get_task.or_else(|| base.get_task.clone()),
        validate_status: overlay
            .validate_status
            .or_else(|| base.validate_status.clone()),
    }
}

fn merge_map(base: &Map<String, Value>, overlay: Map<String, Value>) -> Map<String, Value> {
    let mut merged = base.clone();
    for (key, value) in overlay {
        merged.insert(key, value);
    }
    merged
}
