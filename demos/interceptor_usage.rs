use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use luch_request::{
    ErrorKind, FnInterceptor, HttpError, HttpResponse, Interceptor, RequestClient, RequestConfig,
    ResponseBody,
};

/// 请求计数拦截器，为每个请求加上序号头部
#[derive(Default)]
struct SequenceInterceptor {
    next: AtomicU64,
}

#[async_trait]
impl Interceptor<RequestConfig, HttpError> for SequenceInterceptor {
    async fn on_fulfilled(&self, config: RequestConfig) -> Result<RequestConfig, HttpError> {
        let sequence = self.next.fetch_add(1, Ordering::SeqCst);
        log::info!(
            "📝 SequenceInterceptor: 第 {} 个请求 {}",
            sequence,
            config.url.as_deref().unwrap_or_default()
        );
        Ok(config.with_header("X-Request-Seq", sequence.to_string()))
    }
}

/// 日志拦截器，记录响应与失败
#[derive(Default)]
struct LoggingInterceptor;

#[async_trait]
impl Interceptor<HttpResponse, HttpError> for LoggingInterceptor {
    async fn on_fulfilled(&self, response: HttpResponse) -> Result<HttpResponse, HttpError> {
        log::info!("📝 LoggingInterceptor: 响应状态 {}", response.status_code);
        Ok(response)
    }

    async fn on_rejected(&self, error: HttpError) -> Result<HttpResponse, HttpError> {
        log::warn!("📝 LoggingInterceptor: 请求失败 {}", error);
        Err(error)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let client = RequestClient::new(
        RequestConfig::new().with_base_url("https://jsonplaceholder.typicode.com"),
    );

    // 每次发送前都会重新计算，适合放置随时变化的令牌
    client.set_config(|config| config.with_header("Authorization", "Bearer demo-token-12345"));

    client
        .interceptors
        .request
        .use_interceptor(SequenceInterceptor::default());
    client.interceptors.response.use_interceptor(LoggingInterceptor);

    // 404 不再视为失败，而是转成空数据交给调用方
    let recover = client.interceptors.response.use_interceptor(
        FnInterceptor::new().rejected(|error: HttpError| {
            if error.kind() == ErrorKind::Status && error.status_code == Some(404) {
                println!("🔁 404 已被恢复为成功响应");
                return Ok(HttpResponse {
                    config: error.config,
                    status_code: 404,
                    cookies: error.cookies.unwrap_or_default(),
                    data: error.data.unwrap_or(ResponseBody::Empty),
                    err_msg: error.err_msg,
                    header: error.header.unwrap_or_default(),
                    temp_file_path: None,
                });
            }
            Err(error)
        }),
    );

    let response = client.get("/users/1", RequestConfig::new()).await?;
    println!("用户: {:?}\n", response.data);

    let missing = client.get("/users/0/none", RequestConfig::new()).await?;
    println!("恢复后的状态码: {}\n", missing.status_code);

    // 移除恢复拦截器后，同样的请求会失败
    client.interceptors.response.eject(recover);
    if let Err(error) = client.get("/users/0/none", RequestConfig::new()).await {
        println!("移除后请求失败: {:?}", error.kind());
    }

    // 请求侧拒绝时不会真正发出请求
    let guard = client.interceptors.request.use_fulfilled(|config: RequestConfig| {
        if config.url.as_deref().is_some_and(|url| url.contains("admin")) {
            return Err(HttpError::interceptor(config, "admin api is blocked"));
        }
        Ok(config)
    });
    if let Err(error) = client.get("/admin/users", RequestConfig::new()).await {
        println!("被拦截: {}", error);
    }
    client.interceptors.request.eject(guard);

    Ok(())
}
