//! 原生传输层
//!
//! 客户端只负责配置合并与拦截器链，真正的请求、上传、下载交给 [`Transport`]。
//! 默认实现 [`ReqwestTransport`] 基于 reqwest；测试或宿主环境可以提供自己的实现。

mod reqwest_transport;

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use luch_common::{RequestConfig, RequestTask};

pub use reqwest_transport::ReqwestTransport;

/// 原生层返回的结果
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NativeResponse {
    pub status_code: u16,
    pub header: BTreeMap<String, String>,
    pub cookies: Vec<String>,
    /// 未解释的响应体
    pub body: Vec<u8>,
    /// 为空时由客户端补为 `<操作>:ok`
    pub err_msg: String,
    /// 下载得到的临时文件
    pub temp_file_path: Option<String>,
}

/// 原生传输接口
///
/// 收到的配置已经过合并与请求拦截器处理，按 `config.method()` 执行请求、上传或下载。
/// 实现应当在收到响应头后调用 `task.notify_headers_received`；取消由客户端负责，
/// 实现可以额外观察 `task.is_aborted()` 提前结束。
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(
        &self,
        config: &RequestConfig,
        task: &RequestTask,
    ) -> anyhow::Result<NativeResponse>;
}

#[async_trait]
impl<T> Transport for Arc<T>
where
    T: Transport + ?Sized,
{
    async fn execute(
        &self,
        config: &RequestConfig,
        task: &RequestTask,
    ) -> anyhow::Result<NativeResponse> {
        (**self).execute(config, task).await
    }
}
