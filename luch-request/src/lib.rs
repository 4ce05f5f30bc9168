//! 基于拦截器的 HTTP 客户端
//!
//! ```no_run
//! use luch_request::{RequestClient, RequestConfig};
//!
//! # async fn run() -> Result<(), luch_request::HttpError> {
//! let client = RequestClient::new(RequestConfig::new().with_base_url("https://api.example.com"));
//! client.interceptors.request.use_fulfilled(|config| {
//!     Ok(config.with_header("Authorization", "Bearer token"))
//! });
//!
//! let response = client.get("/users/1", RequestConfig::new()).await?;
//! println!("{:?}", response.data);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod transport;

pub use client::{Interceptors, RequestClient};
pub use transport::{NativeResponse, ReqwestTransport, Transport};

pub use luch_common::{
    ContentType, DataType, ErrorKind, FnInterceptor, HttpDownloadResponse, HttpError, HttpMethod,
    HttpResponse, Interceptor, InterceptorManager, RequestConfig, RequestTask, ResponseBody,
    ResponseType, UploadFile,
};
