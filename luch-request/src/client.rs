use std::sync::{Arc, RwLock};

use luch_common::{
    ErrorKind, HttpDownloadResponse, HttpError, HttpMethod, HttpResponse, RequestConfig,
    RequestInterceptors, RequestTask, ResponseBody, ResponseInterceptors, build_url, merge_config,
};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::transport::{NativeResponse, ReqwestTransport, Transport};

type OnSend = Arc<dyn Fn(RequestConfig) -> RequestConfig + Send + Sync>;

/// 客户端持有的两组拦截器
#[derive(Default)]
pub struct Interceptors {
    /// 请求侧，按注册顺序处理即将发出的配置
    pub request: RequestInterceptors,
    /// 响应侧，按注册顺序处理响应或错误
    pub response: ResponseInterceptors,
}

/// HTTP 客户端
///
/// 每个请求依次经过：配置合并 → 请求拦截器 → 原生传输 → 状态码校验 → 响应拦截器。
/// 任何阶段的失败都以 [`HttpError`] 交给后续的 `on_rejected`，最终返回给调用方；
/// 客户端本身不做重试。
///
/// 配置优先级：单次调用的配置 > `set_config` 变换的结果 > 实例默认配置。
pub struct RequestClient {
    config: RequestConfig,
    on_send: RwLock<Option<OnSend>>,
    transport: Arc<dyn Transport>,
    pub interceptors: Interceptors,
}

impl RequestClient {
    /// 以库默认配置为底，叠加 `config` 作为实例配置，使用 reqwest 传输
    pub fn new(config: RequestConfig) -> Self {
        Self::with_transport(config, ReqwestTransport::new())
    }

    pub fn with_transport<T>(config: RequestConfig, transport: T) -> Self
    where
        T: Transport + 'static,
    {
        Self::with_shared_transport(config, Arc::new(transport))
    }

    pub fn with_shared_transport(config: RequestConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            config: merge_config(&RequestConfig::defaults(), config),
            on_send: RwLock::new(None),
            transport,
            interceptors: Interceptors::default(),
        }
    }

    /// 实例默认配置
    pub fn config(&self) -> RequestConfig {
        self.config.clone()
    }

    /// 注册全局配置变换，替换之前注册的变换
    ///
    /// 每次请求发出前，变换作用于实例默认配置的副本，结果再与单次调用的配置合并。
    pub fn set_config<F>(&self, on_send: F)
    where
        F: Fn(RequestConfig) -> RequestConfig + Send + Sync + 'static,
    {
        *self
            .on_send
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(Arc::new(on_send));
    }

    /// 按优先级得到一次请求进入拦截器链之前的配置
    pub fn effective_config(&self, config: RequestConfig) -> RequestConfig {
        let on_send = self
            .on_send
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone();
        let base = match on_send {
            Some(on_send) => on_send(self.config.clone()),
            None => self.config.clone(),
        };
        merge_config(&base, config)
    }

    /// 完整的请求流程，其余方法都建立在它之上
    pub async fn middleware(&self, config: RequestConfig) -> Result<HttpResponse, HttpError> {
        let config = self.effective_config(config);
        let request_chain = self.interceptors.request.snapshot();
        let response_chain = self.interceptors.response.snapshot();
        log::trace!(
            "running {} request and {} response interceptors",
            request_chain.len(),
            response_chain.len()
        );

        let outcome = match RequestInterceptors::run_chain(&request_chain, Ok(config)).await {
            Ok(config) => self.dispatch(config).await,
            Err(error) => {
                log::debug!("request rejected before dispatch: {}", error);
                Err(error)
            }
        };

        let settled = ResponseInterceptors::run_chain(&response_chain, outcome).await;
        match &settled {
            Ok(response) => log::debug!("request settled with status {}", response.status_code),
            Err(error) => log::debug!("request failed: {}", error),
        }
        settled
    }

    /// 与 [`middleware`](Self::middleware) 相同
    pub async fn request(&self, config: RequestConfig) -> Result<HttpResponse, HttpError> {
        self.middleware(config).await
    }

    /// 请求并把响应数据反序列化为 `T`
    pub async fn request_as<T>(&self, config: RequestConfig) -> Result<HttpResponse<T>, HttpError>
    where
        T: DeserializeOwned,
    {
        self.request(config).await?.decode()
    }

    pub async fn get(&self, url: &str, config: RequestConfig) -> Result<HttpResponse, HttpError> {
        self.request(shorthand_config(HttpMethod::Get, url, None, config)?)
            .await
    }

    pub async fn post(
        &self,
        url: &str,
        data: Option<Value>,
        config: RequestConfig,
    ) -> Result<HttpResponse, HttpError> {
        self.request(shorthand_config(HttpMethod::Post, url, data, config)?)
            .await
    }

    pub async fn put(
        &self,
        url: &str,
        data: Option<Value>,
        config: RequestConfig,
    ) -> Result<HttpResponse, HttpError> {
        self.request(shorthand_config(HttpMethod::Put, url, data, config)?)
            .await
    }

    pub async fn delete(
        &self,
        url: &str,
        data: Option<Value>,
        config: RequestConfig,
    ) -> Result<HttpResponse, HttpError> {
        self.request(shorthand_config(HttpMethod::Delete, url, data, config)?)
            .await
    }

    pub async fn head(
        &self,
        url: &str,
        data: Option<Value>,
        config: RequestConfig,
    ) -> Result<HttpResponse, HttpError> {
        self.request(shorthand_config(HttpMethod::Head, url, data, config)?)
            .await
    }

    pub async fn connect(
        &self,
        url: &str,
        data: Option<Value>,
        config: RequestConfig,
    ) -> Result<HttpResponse, HttpError> {
        self.request(shorthand_config(HttpMethod::Connect, url, data, config)?)
            .await
    }

    pub async fn options(
        &self,
        url: &str,
        data: Option<Value>,
        config: RequestConfig,
    ) -> Result<HttpResponse, HttpError> {
        self.request(shorthand_config(HttpMethod::Options, url, data, config)?)
            .await
    }

    pub async fn trace(
        &self,
        url: &str,
        data: Option<Value>,
        config: RequestConfig,
    ) -> Result<HttpResponse, HttpError> {
        self.request(shorthand_config(HttpMethod::Trace, url, data, config)?)
            .await
    }

    /// 上传文件
    ///
    /// `files` 与 `file_path`/`name` 原样交给传输层，`files` 非空时优先。
    pub async fn upload(&self, url: &str, config: RequestConfig) -> Result<HttpResponse, HttpError> {
        self.request(shorthand_config(HttpMethod::Upload, url, None, config)?)
            .await
    }

    /// 下载文件，成功时返回临时文件路径
    pub async fn download(
        &self,
        url: &str,
        config: RequestConfig,
    ) -> Result<HttpDownloadResponse, HttpError> {
        let response = self
            .request(shorthand_config(HttpMethod::Download, url, None, config)?)
            .await?;
        match response.temp_file_path.clone() {
            Some(temp_file_path) => Ok(HttpDownloadResponse {
                temp_file_path,
                response,
            }),
            None => {
                let mut error = HttpError::from_response(ErrorKind::Transport, response);
                error.err_msg = "downloadFile:fail missing temp file path".to_string();
                Err(error)
            }
        }
    }

    async fn dispatch(&self, config: RequestConfig) -> Result<HttpResponse, HttpError> {
        let method = config.method();
        let url = build_url(&config);
        log::debug!("{} {}", method, url);

        let task = RequestTask::new();
        if let Some(get_task) = &config.get_task {
            get_task(&task, &config);
        }

        let outcome = tokio::select! {
            biased;
            _ = task.aborted() => None,
            result = self.transport.execute(&config, &task) => Some(result),
        };

        let native = match outcome {
            None => {
                log::warn!("{} {} aborted", method, url);
                return Err(HttpError::aborted(config));
            }
            Some(Err(e)) => {
                log::warn!("{} {} failed: {:#}", method, url, e);
                return Err(HttpError::transport(config, &e));
            }
            Some(Ok(native)) => native,
        };

        let response = assemble_response(config, native);
        if response.config.is_status_valid(response.status_code) {
            Ok(response)
        } else {
            log::warn!("{} {} rejected by status {}", method, url, response.status_code);
            // 被拒绝的下载不会交给调用方，落盘的文件在这里删除
            if let Some(path) = &response.temp_file_path {
                if let Err(e) = tokio::fs::remove_file(path).await {
                    log::warn!("failed to remove rejected download {}: {}", path, e);
                }
            }
            Err(HttpError::status(response))
        }
    }
}

impl Default for RequestClient {
    fn default() -> Self {
        Self::new(RequestConfig::default())
    }
}

fn assemble_response(config: RequestConfig, native: NativeResponse) -> HttpResponse {
    let method = config.method();
    let data = if method == HttpMethod::Download && native.body.is_empty() {
        ResponseBody::Empty
    } else {
        ResponseBody::from_raw(native.body, &config.data_type(), config.response_type())
    };
    let err_msg = if native.err_msg.is_empty() {
        format!("{}:ok", method.operation())
    } else {
        native.err_msg
    };

    HttpResponse {
        config,
        status_code: native.status_code,
        cookies: native.cookies,
        data,
        err_msg,
        header: native.header,
        temp_file_path: native.temp_file_path,
    }
}

/// 方法简写的配置：设置地址与方法，并按方法语义放置 `data`
///
/// 携带请求体的方法：对象与已有的对象请求体按键合并，其余情况直接替换。
/// 其他方法：对象并入查询参数，非对象数据视为无效配置。
fn shorthand_config(
    method: HttpMethod,
    url: &str,
    data: Option<Value>,
    config: RequestConfig,
) -> Result<RequestConfig, HttpError> {
    let mut config = config.with_url(url).with_method(method);
    let Some(data) = data else {
        return Ok(config);
    };

    if method.carries_body() {
        config.data = Some(match (config.data.take(), data) {
            (Some(Value::Object(mut body)), Value::Object(extra)) => {
                body.extend(extra);
                Value::Object(body)
            }
            (_, data) => data,
        });
        return Ok(config);
    }

    match data {
        Value::Object(extra) => {
            config.params.extend(extra);
            Ok(config)
        }
        Value::Null => Ok(config),
        other => {
            let reason = format!(
                "{}:fail {} data must be an object to be sent as query parameters, got {}",
                method.operation(),
                method,
                other
            );
            Err(HttpError::invalid_config(config, reason))
        }
    }
}
