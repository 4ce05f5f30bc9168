//! 使用模拟传输层验证完整的请求流程
//!
//! 模拟传输层记录收到的配置并返回预设的结果，不访问网络。

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use luch_request::{
    ErrorKind, FnInterceptor, HttpError, HttpMethod, HttpResponse, NativeResponse, RequestClient,
    RequestConfig, RequestTask, ResponseBody, Transport, UploadFile,
};
use serde::Deserialize;
use serde_json::json;

type Reply = Box<dyn Fn(&RequestConfig) -> anyhow::Result<NativeResponse> + Send + Sync>;

struct MockTransport {
    calls: Mutex<Vec<RequestConfig>>,
    reply: Reply,
}

impl MockTransport {
    fn new<F>(reply: F) -> Arc<Self>
    where
        F: Fn(&RequestConfig) -> anyhow::Result<NativeResponse> + Send + Sync + 'static,
    {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            reply: Box::new(reply),
        })
    }

    fn json(status_code: u16, body: &'static str) -> Arc<Self> {
        Self::new(move |_| Ok(native(status_code, body)))
    }

    fn calls(&self) -> Vec<RequestConfig> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn execute(
        &self,
        config: &RequestConfig,
        task: &RequestTask,
    ) -> anyhow::Result<NativeResponse> {
        self.calls.lock().unwrap().push(config.clone());
        let response = (self.reply)(config)?;
        task.notify_headers_received(&response.header);
        Ok(response)
    }
}

/// 永不返回的传输层，只能通过任务句柄取消
struct HangingTransport;

#[async_trait]
impl Transport for HangingTransport {
    async fn execute(
        &self,
        _config: &RequestConfig,
        _task: &RequestTask,
    ) -> anyhow::Result<NativeResponse> {
        std::future::pending().await
    }
}

fn native(status_code: u16, body: &str) -> NativeResponse {
    let mut header = BTreeMap::new();
    header.insert("content-type".to_string(), "application/json".to_string());
    NativeResponse {
        status_code,
        header,
        cookies: vec!["sid=1; Path=/".to_string()],
        body: body.as_bytes().to_vec(),
        err_msg: String::new(),
        temp_file_path: None,
    }
}

fn client_with(transport: Arc<MockTransport>) -> RequestClient {
    RequestClient::with_shared_transport(RequestConfig::new(), transport)
}

#[tokio::test]
async fn empty_chains_forward_the_merged_config_unchanged() {
    let transport = MockTransport::json(200, r#"{"id":1}"#);
    let client = client_with(transport.clone());

    let config = RequestConfig::new()
        .with_url("https://api.example.com/users")
        .with_method(HttpMethod::Post)
        .with_header("X-Trace", "abc")
        .with_data(json!({"name": "luch"}));
    let expected = client.effective_config(config.clone());

    let response = client.request(config).await.unwrap();

    let calls = transport.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(format!("{:?}", calls[0]), format!("{:?}", expected));
    assert_eq!(response.status_code, 200);
    assert_eq!(response.data, ResponseBody::Json(json!({"id": 1})));
    assert_eq!(response.cookies, vec!["sid=1; Path=/".to_string()]);
    assert_eq!(response.err_msg, "request:ok");
}

#[tokio::test]
async fn interceptors_run_in_registration_order_on_both_sides() {
    let transport = MockTransport::json(200, "{}");
    let client = client_with(transport);
    let trail = Arc::new(Mutex::new(Vec::new()));

    for tag in ["A", "B"] {
        let log = trail.clone();
        client.interceptors.request.use_fulfilled(move |config: RequestConfig| {
            log.lock().unwrap().push(format!("request:{}", tag));
            Ok(config)
        });
        let log = trail.clone();
        client.interceptors.response.use_fulfilled(move |response: HttpResponse| {
            log.lock().unwrap().push(format!("response:{}", tag));
            Ok(response)
        });
    }

    client.get("https://a.com", RequestConfig::new()).await.unwrap();
    assert_eq!(
        *trail.lock().unwrap(),
        vec!["request:A", "request:B", "response:A", "response:B"]
    );
}

#[tokio::test]
async fn request_interceptors_can_rewrite_the_config() {
    let transport = MockTransport::json(200, "{}");
    let client = client_with(transport.clone());

    client.interceptors.request.use_fulfilled(|config: RequestConfig| {
        Ok(config.with_header("Authorization", "Bearer one"))
    });
    client.interceptors.request.use_fulfilled(|config: RequestConfig| {
        let token = config.header_value("Authorization").unwrap_or_default().to_string();
        Ok(config.with_header("X-Seen", token))
    });

    client.get("https://a.com", RequestConfig::new()).await.unwrap();
    let sent = &transport.calls()[0];
    assert_eq!(sent.header["Authorization"], "Bearer one");
    assert_eq!(sent.header["X-Seen"], "Bearer one");
}

#[tokio::test]
async fn eject_removes_exactly_one_interceptor() {
    let transport = MockTransport::json(200, "{}");
    let client = client_with(transport);
    let trail = Arc::new(Mutex::new(Vec::new()));

    let mut ids = Vec::new();
    for tag in ["A", "B", "C"] {
        let log = trail.clone();
        ids.push(client.interceptors.request.use_fulfilled(move |config: RequestConfig| {
            log.lock().unwrap().push(tag);
            Ok(config)
        }));
    }

    client.interceptors.request.eject(ids[1]);
    client.interceptors.request.eject(ids[1]);
    client.interceptors.request.eject(99);

    client.get("https://a.com", RequestConfig::new()).await.unwrap();
    assert_eq!(*trail.lock().unwrap(), vec!["A", "C"]);
}

#[tokio::test]
async fn validate_status_false_rejects_with_the_status_code() {
    let transport = MockTransport::json(200, r#"{"code":1}"#);
    let client = client_with(transport);
    let rejected = Arc::new(Mutex::new(Vec::new()));
    let seen = rejected.clone();
    client.interceptors.response.use_rejected(move |error: HttpError| {
        seen.lock().unwrap().push(error.status_code);
        Err(error)
    });

    let config = RequestConfig::new().with_validate_status(|status| status == 201);
    let error = client.get("https://a.com", config).await.unwrap_err();

    assert_eq!(error.kind(), ErrorKind::Status);
    assert_eq!(error.status_code, Some(200));
    assert_eq!(error.data, Some(ResponseBody::Json(json!({"code": 1}))));
    assert_eq!(*rejected.lock().unwrap(), vec![Some(200)]);
}

#[tokio::test]
async fn default_validate_status_accepts_only_2xx() {
    let client = client_with(MockTransport::json(404, "not found"));
    let error = client.get("https://a.com", RequestConfig::new()).await.unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Status);
    assert_eq!(error.status_code, Some(404));
    assert_eq!(error.data, Some(ResponseBody::Text("not found".to_string())));

    let client = client_with(MockTransport::json(201, "{}"));
    assert!(client.get("https://a.com", RequestConfig::new()).await.is_ok());
}

#[tokio::test]
async fn transport_failure_enters_the_rejection_path_and_can_recover() {
    let transport = MockTransport::new(|_| Err(anyhow::anyhow!("connection refused")));
    let client = client_with(transport);

    let error = client.get("https://a.com", RequestConfig::new()).await.unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Transport);
    assert!(error.status_code.is_none());
    assert_eq!(error.err_msg, "request:fail connection refused");

    client.interceptors.response.use_rejected(|error: HttpError| {
        Ok(HttpResponse {
            config: error.config,
            status_code: 200,
            cookies: Vec::new(),
            data: ResponseBody::Json(json!({"cached": true})),
            err_msg: "request:ok".to_string(),
            header: BTreeMap::new(),
            temp_file_path: None,
        })
    });
    let response = client.get("https://a.com", RequestConfig::new()).await.unwrap();
    assert_eq!(response.data, ResponseBody::Json(json!({"cached": true})));
}

#[tokio::test]
async fn request_rejection_skips_the_transport() {
    let transport = MockTransport::json(200, "{}");
    let client = client_with(transport.clone());
    let observed = Arc::new(Mutex::new(None));

    client.interceptors.request.use_fulfilled(|config: RequestConfig| {
        if config.header_value("Authorization").is_none() {
            return Err(HttpError::interceptor(config, "missing token"));
        }
        Ok(config)
    });
    let after = Arc::new(Mutex::new(0));
    let counter = after.clone();
    client.interceptors.request.use_interceptor(FnInterceptor::new().fulfilled(
        move |config: RequestConfig| {
            *counter.lock().unwrap() += 1;
            Ok(config)
        },
    ));
    let seen = observed.clone();
    client.interceptors.response.use_rejected(move |error: HttpError| {
        *seen.lock().unwrap() = Some(error.kind());
        Err(error)
    });

    let error = client.get("https://a.com", RequestConfig::new()).await.unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Interceptor);
    assert_eq!(error.err_msg, "missing token");
    assert!(transport.calls().is_empty());
    assert_eq!(*after.lock().unwrap(), 0);
    assert_eq!(*observed.lock().unwrap(), Some(ErrorKind::Interceptor));
}

#[tokio::test]
async fn config_precedence_is_call_then_global_then_instance() {
    let transport = MockTransport::json(200, "{}");
    let instance = RequestConfig::new()
        .with_base_url("https://instance.example.com")
        .with_header("X-Source", "instance")
        .with_header("X-Instance", "1")
        .with_timeout(Duration::from_secs(5));
    let client = RequestClient::with_shared_transport(instance, transport.clone());
    client.set_config(|config| {
        config
            .with_header("X-Source", "global")
            .with_header("X-Global", "1")
            .with_custom("auth", true)
    });

    client
        .get("/a", RequestConfig::new().with_header("X-Source", "call"))
        .await
        .unwrap();
    client.get("/b", RequestConfig::new()).await.unwrap();

    let calls = transport.calls();
    assert_eq!(calls[0].header["X-Source"], "call");
    assert_eq!(calls[0].header["X-Global"], "1");
    assert_eq!(calls[0].header["X-Instance"], "1");
    assert_eq!(calls[0].custom["auth"], json!(true));
    assert_eq!(calls[0].timeout, Some(Duration::from_secs(5)));
    assert_eq!(calls[1].header["X-Source"], "global");
    assert_eq!(
        luch_common::build_url(&calls[1]),
        "https://instance.example.com/b"
    );
}

#[tokio::test]
async fn set_config_then_get_reaches_the_transport_with_the_full_url() {
    let transport = MockTransport::json(200, r#"{"id":1}"#);
    let client = client_with(transport.clone());
    client.set_config(|config| config.with_base_url("https://api.example.com"));

    let response = client.get("/users/1", RequestConfig::new()).await.unwrap();

    let sent = &transport.calls()[0];
    assert_eq!(sent.method(), HttpMethod::Get);
    assert_eq!(luch_common::build_url(sent), "https://api.example.com/users/1");
    assert_eq!(response.status_code, 200);
    assert_eq!(response.data, ResponseBody::Json(json!({"id": 1})));
}

#[tokio::test]
async fn shorthands_place_data_by_method() {
    let transport = MockTransport::json(200, "{}");
    let client = client_with(transport.clone());

    client
        .post("https://a.com/users", Some(json!({"name": "luch"})), RequestConfig::new())
        .await
        .unwrap();
    client
        .head("https://a.com/users", Some(json!({"page": 2})), RequestConfig::new())
        .await
        .unwrap();
    client
        .delete("https://a.com/users/1", None, RequestConfig::new())
        .await
        .unwrap();

    let calls = transport.calls();
    assert_eq!(calls[0].method(), HttpMethod::Post);
    assert_eq!(calls[0].data, Some(json!({"name": "luch"})));
    assert_eq!(calls[1].method(), HttpMethod::Head);
    assert_eq!(luch_common::build_url(&calls[1]), "https://a.com/users?page=2");
    assert_eq!(calls[2].method(), HttpMethod::Delete);
    assert!(calls[2].data.is_none());

    let error = client
        .trace("https://a.com", Some(json!("text")), RequestConfig::new())
        .await
        .unwrap_err();
    assert_eq!(error.kind(), ErrorKind::InvalidConfig);
    assert_eq!(transport.calls().len(), 3);
}

#[tokio::test]
async fn query_data_overrides_params_for_shorthand_and_request_alike() {
    let transport = MockTransport::json(200, "{}");
    let client = client_with(transport.clone());
    let config = RequestConfig::new().with_param("page", 1).with_param("size", 10);

    client
        .head("https://a.com/list", Some(json!({"page": 9})), config.clone())
        .await
        .unwrap();
    client
        .request(
            config
                .with_url("https://a.com/list")
                .with_method(HttpMethod::Head)
                .with_data(json!({"page": 9})),
        )
        .await
        .unwrap();

    let calls = transport.calls();
    let expected = "https://a.com/list?page=9&size=10";
    assert_eq!(luch_common::build_url(&calls[0]), expected);
    assert_eq!(luch_common::build_url(&calls[1]), expected);
}

#[tokio::test]
async fn download_rejected_by_status_deletes_the_temp_file() {
    let file = tempfile::NamedTempFile::new().unwrap();
    let path = file.into_temp_path().keep().unwrap();
    let temp_file_path = path.to_string_lossy().into_owned();
    let transport = MockTransport::new(move |_| {
        Ok(NativeResponse {
            temp_file_path: Some(temp_file_path.clone()),
            ..native(404, "")
        })
    });
    let client = client_with(transport);

    let error = client
        .download("https://a.com/missing.bin", RequestConfig::new())
        .await
        .unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Status);
    assert_eq!(error.status_code, Some(404));
    assert!(!path.exists());
}

#[tokio::test]
async fn upload_forwards_files_over_file_path() {
    let transport = MockTransport::json(200, r#"{"url":"https://cdn/x.png"}"#);
    let client = client_with(transport.clone());

    let files = vec![
        UploadFile::new("img1", "/tmp/1.png"),
        UploadFile::new("img2", "/tmp/2.png"),
    ];
    let config = RequestConfig::new()
        .with_files(files.clone())
        .with_file_path("/tmp/ignored.png")
        .with_name("avatar")
        .with_form_data("album", "summer");
    let response = client.upload("https://a.com/upload", config).await.unwrap();

    let sent = &transport.calls()[0];
    assert_eq!(sent.method(), HttpMethod::Upload);
    assert_eq!(sent.files.as_ref(), Some(&files));
    assert_eq!(sent.upload_files(), files);
    assert_eq!(sent.form_data["album"], json!("summer"));
    assert_eq!(response.err_msg, "uploadFile:ok");
}

#[tokio::test]
async fn download_resolves_with_the_temp_file_path() {
    let transport = MockTransport::new(|_| {
        Ok(NativeResponse {
            status_code: 200,
            temp_file_path: Some("/tmp/luch-1.tmp".to_string()),
            ..NativeResponse::default()
        })
    });
    let client = client_with(transport.clone());

    let download = client
        .download("https://a.com/report.pdf", RequestConfig::new())
        .await
        .unwrap();
    assert_eq!(download.temp_file_path, "/tmp/luch-1.tmp");
    assert_eq!(download.status_code, 200);
    assert_eq!(download.data, ResponseBody::Empty);
    assert_eq!(transport.calls()[0].method(), HttpMethod::Download);

    let client = client_with(MockTransport::json(200, ""));
    let error = client
        .download("https://a.com/report.pdf", RequestConfig::new())
        .await
        .unwrap_err();
    assert_eq!(error.err_msg, "downloadFile:fail missing temp file path");
}

#[tokio::test]
async fn request_as_decodes_typed_data() {
    #[derive(Debug, Deserialize, PartialEq)]
    struct User {
        id: u32,
        name: String,
    }

    let client = client_with(MockTransport::json(200, r#"{"id":1,"name":"luch"}"#));
    let response = client
        .request_as::<User>(RequestConfig::new().with_url("https://a.com/users/1"))
        .await
        .unwrap();
    assert_eq!(
        response.data,
        User {
            id: 1,
            name: "luch".to_string()
        }
    );

    let client = client_with(MockTransport::json(200, "[]"));
    let error = client
        .request_as::<User>(RequestConfig::new().with_url("https://a.com/users/1"))
        .await
        .unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Decode);
}

#[tokio::test]
async fn get_task_receives_a_handle_that_sees_headers() {
    let transport = MockTransport::json(200, "{}");
    let client = client_with(transport);
    let received = Arc::new(Mutex::new(None));

    let slot = received.clone();
    let config = RequestConfig::new().with_get_task(move |task, options| {
        assert_eq!(options.method(), HttpMethod::Get);
        let slot = slot.clone();
        task.on_headers_received(move |header| {
            *slot.lock().unwrap() = header.get("content-type").cloned();
        });
    });
    client.get("https://a.com", config).await.unwrap();

    assert_eq!(
        received.lock().unwrap().as_deref(),
        Some("application/json")
    );
}

#[tokio::test]
async fn abort_through_the_task_handle_rejects_instead_of_hanging() {
    let client = Arc::new(RequestClient::with_transport(
        RequestConfig::new(),
        HangingTransport,
    ));
    let handle: Arc<Mutex<Option<RequestTask>>> = Arc::new(Mutex::new(None));

    let slot = handle.clone();
    let config = RequestConfig::new().with_get_task(move |task, _| {
        *slot.lock().unwrap() = Some(task.clone());
    });
    let rejected = Arc::new(Mutex::new(false));
    let flag = rejected.clone();
    client.interceptors.response.use_rejected(move |error: HttpError| {
        *flag.lock().unwrap() = error.is_aborted();
        Err(error)
    });

    let pending = {
        let client = client.clone();
        tokio::spawn(async move { client.get("https://a.com/slow", config).await })
    };

    let task = loop {
        if let Some(task) = handle.lock().unwrap().clone() {
            break task;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    };
    task.abort();

    let result = tokio::time::timeout(Duration::from_secs(2), pending)
        .await
        .expect("aborted request must settle")
        .unwrap();
    let error = result.unwrap_err();
    assert!(error.is_aborted());
    assert_eq!(error.err_msg, "request:fail abort");
    assert!(*rejected.lock().unwrap());
}

#[tokio::test]
async fn registration_during_flight_only_affects_later_requests() {
    let client = Arc::new(RequestClient::with_transport(
        RequestConfig::new(),
        HangingTransport,
    ));
    let handle: Arc<Mutex<Option<RequestTask>>> = Arc::new(Mutex::new(None));
    let slot = handle.clone();
    let config = RequestConfig::new().with_get_task(move |task, _| {
        *slot.lock().unwrap() = Some(task.clone());
    });

    let pending = {
        let client = client.clone();
        tokio::spawn(async move { client.get("https://a.com", config).await })
    };
    let task = loop {
        if let Some(task) = handle.lock().unwrap().clone() {
            break task;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    };

    // 请求已发出后注册的拦截器不会出现在它的响应链上
    client
        .interceptors
        .response
        .use_rejected(|error: HttpError| Err(HttpError::interceptor(error.config, "late")));
    task.abort();

    let error = pending.await.unwrap().unwrap_err();
    assert!(error.is_aborted());
}
