use std::collections::BTreeMap;
use std::net::{IpAddr, Ipv4Addr};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::Context;
use async_trait::async_trait;
use luch_common::{ContentType, HttpMethod, RequestConfig, RequestTask, build_url};
use reqwest::header::{CONTENT_TYPE, HeaderMap, SET_COOKIE};
use reqwest::multipart::{Form, Part};
use serde_json::Value;
use tokio::io::AsyncWriteExt;

use super::{NativeResponse, Transport};

/// 基于 reqwest 的传输实现
///
/// `ssl_verify` 与 `first_ipv4` 只能在客户端级别设置，因此按组合懒加载最多四个
/// `reqwest::Client`，之后复用。
pub struct ReqwestTransport {
    clients: [OnceLock<reqwest::Client>; 4],
    download_dir: PathBuf,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self {
            clients: Default::default(),
            download_dir: std::env::temp_dir(),
        }
    }

    /// 使用自定义的 reqwest 客户端处理默认组合（校验证书、不限定 IPv4）的请求
    pub fn with_client(client: reqwest::Client) -> Self {
        let transport = Self::new();
        let _ = transport.clients[0].set(client);
        transport
    }

    /// 下载文件保存的目录，默认为系统临时目录
    pub fn with_download_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.download_dir = dir.into();
        self
    }

    fn client(&self, config: &RequestConfig) -> anyhow::Result<&reqwest::Client> {
        let insecure = !config.ssl_verify.unwrap_or(true);
        let ipv4 = config.first_ipv4.unwrap_or(false);
        let slot = &self.clients[(insecure as usize) | ((ipv4 as usize) << 1)];
        if let Some(client) = slot.get() {
            return Ok(client);
        }

        let mut builder = reqwest::Client::builder();
        if insecure {
            builder = builder.danger_accept_invalid_certs(true);
        }
        if ipv4 {
            builder = builder.local_address(IpAddr::V4(Ipv4Addr::UNSPECIFIED));
        }
        let client = builder.build().context("failed to build http client")?;
        Ok(slot.get_or_init(|| client))
    }

    /// 把响应体写入下载目录中的临时文件
    ///
    /// 文件在写完之前由 `TempPath` 持有，出错或 future 被丢弃（如请求被取消）时自动删除。
    async fn save_to_temp_file(&self, mut response: reqwest::Response) -> anyhow::Result<String> {
        let (file, temp_path) = tempfile::Builder::new()
            .prefix("luch-")
            .suffix(".tmp")
            .tempfile_in(&self.download_dir)
            .with_context(|| {
                format!("failed to create temp file in {}", self.download_dir.display())
            })?
            .into_parts();
        let mut file = tokio::fs::File::from_std(file);

        while let Some(chunk) = response
            .chunk()
            .await
            .context("failed to read downloaded body")?
        {
            file.write_all(&chunk)
                .await
                .context("failed to write downloaded body")?;
        }
        file.flush().await.context("failed to write downloaded body")?;
        drop(file);

        let path = temp_path
            .keep()
            .context("failed to keep downloaded file")?;
        Ok(path.to_string_lossy().into_owned())
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(
        &self,
        config: &RequestConfig,
        task: &RequestTask,
    ) -> anyhow::Result<NativeResponse> {
        let client = self.client(config)?;
        let method = config.method();
        let url = build_url(config);

        if config.with_credentials == Some(true) {
            log::debug!("with_credentials only applies to browser runtimes, ignored");
        }

        let mut builder = match method {
            HttpMethod::Upload => client.post(&url),
            HttpMethod::Download => client.get(&url),
            other => {
                let method = reqwest::Method::from_bytes(other.as_str().as_bytes())
                    .with_context(|| format!("invalid http method {}", other))?;
                client.request(method, &url)
            }
        };

        // 请求头要先于请求体设置，json/form 只在缺少 content-type 时补上默认值
        for (name, value) in &config.header {
            if method == HttpMethod::Upload && name.eq_ignore_ascii_case(CONTENT_TYPE.as_str()) {
                continue;
            }
            builder = builder.header(name, value);
        }

        builder = match method {
            HttpMethod::Upload => builder.multipart(multipart_form(config).await?),
            m if m.carries_body() => apply_body(builder, config),
            _ => builder,
        };

        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await?;
        let status_code = response.status().as_u16();
        let header = collect_headers(response.headers());
        let cookies = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned())
            .collect();
        task.notify_headers_received(&header);

        let err_msg = format!("{}:ok", method.operation());
        if method == HttpMethod::Download {
            let temp_file_path = self.save_to_temp_file(response).await?;
            return Ok(NativeResponse {
                status_code,
                header,
                cookies,
                body: Vec::new(),
                err_msg,
                temp_file_path: Some(temp_file_path),
            });
        }

        let body = response.bytes().await?.to_vec();
        Ok(NativeResponse {
            status_code,
            header,
            cookies,
            body,
            err_msg,
            temp_file_path: None,
        })
    }
}

fn apply_body(builder: reqwest::RequestBuilder, config: &RequestConfig) -> reqwest::RequestBuilder {
    match &config.data {
        None | Some(Value::Null) => builder,
        Some(Value::String(text)) => builder.body(text.clone()),
        Some(data) => {
            let content_type = config
                .header_value(CONTENT_TYPE.as_str())
                .and_then(ContentType::from_header_value);
            match content_type {
                Some(ContentType::FormUrlEncoded) => builder.form(data),
                _ => builder.json(data),
            }
        }
    }
}

async fn multipart_form(config: &RequestConfig) -> anyhow::Result<Form> {
    let mut form = Form::new();
    for (key, value) in &config.form_data {
        let text = match value {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        };
        form = form.text(key.clone(), text);
    }

    let files = config.upload_files();
    if files.is_empty() {
        anyhow::bail!("no file to upload, set files or file_path");
    }
    for file in files {
        let bytes = tokio::fs::read(&file.path)
            .await
            .with_context(|| format!("failed to read upload file {}", file.path))?;
        let file_name = Path::new(&file.path)
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| file.name.clone());
        form = form.part(file.name, Part::bytes(bytes).file_name(file_name));
    }
    Ok(form)
}

/// 同名响应头以 `, ` 连接，`set-cookie` 单独放入 cookies
fn collect_headers(headers: &HeaderMap) -> BTreeMap<String, String> {
    let mut collected: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in headers {
        let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
        collected
            .entry(name.as_str().to_string())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(&value);
            })
            .or_insert(value);
    }
    collected
}
