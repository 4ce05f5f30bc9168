//! luch HTTP 客户端的公共类型
//!
//! 包括请求配置及其合并规则、地址拼接、响应与错误、任务句柄以及拦截器管理器。
//! 发送请求的客户端位于 `luch-request`。

pub mod interceptor;
pub mod task;
pub mod types;

pub use interceptor::{FnInterceptor, Interceptor, InterceptorManager, SharedInterceptor};
pub use task::RequestTask;
pub use types::*;

/// 请求侧拦截器管理器
pub type RequestInterceptors = InterceptorManager<RequestConfig, HttpError>;

/// 响应侧拦截器管理器
pub type ResponseInterceptors = InterceptorManager<HttpResponse, HttpError>;
