use std::sync::{Arc, Mutex};
use std::time::Duration;

use luch_request::{RequestClient, RequestConfig, RequestTask};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let client = RequestClient::new(RequestConfig::new().with_base_url("https://httpbin.org"));

    // 通过 get_task 拿到任务句柄，可以监听响应头或取消请求
    let slot: Arc<Mutex<Option<RequestTask>>> = Arc::new(Mutex::new(None));
    let captured = slot.clone();
    let config = RequestConfig::new().with_get_task(move |task, config| {
        log::info!("请求已发出: {}", config.url.as_deref().unwrap_or_default());
        task.on_headers_received(|header| {
            log::info!("收到响应头: {:?}", header.get("content-type"));
        });
        if let Ok(mut slot) = captured.lock() {
            *slot = Some(task.clone());
        }
    });

    let response = client.get("/get", config.clone()).await?;
    println!("状态码: {}\n", response.status_code);

    // 一秒后取消一个需要五秒的请求
    let pending = client.get("/delay/5", config);
    let canceller = async {
        tokio::time::sleep(Duration::from_secs(1)).await;
        if let Some(task) = slot.lock().ok().and_then(|slot| slot.clone()) {
            task.abort();
        }
    };
    let (result, _) = tokio::join!(pending, canceller);
    match result {
        Ok(response) => println!("请求意外完成: {}", response.status_code),
        Err(error) => println!("请求已取消: {} (aborted = {})", error, error.is_aborted()),
    }

    Ok(())
}
