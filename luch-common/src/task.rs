use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex};

use tokio::sync::watch;

type HeadersListener = Arc<dyn Fn(&BTreeMap<String, String>) + Send + Sync>;

/// 进行中请求的任务句柄
///
/// 通过 `get_task` 回调交给调用方，可以取消请求或监听响应头。
/// 句柄可以随意克隆，所有克隆共享同一个状态。
#[derive(Clone)]
pub struct RequestTask {
    inner: Arc<TaskInner>,
}

struct TaskInner {
    aborted: watch::Sender<bool>,
    headers_listener: Mutex<Option<HeadersListener>>,
}

impl RequestTask {
    pub fn new() -> Self {
        let (aborted, _) = watch::channel(false);
        Self {
            inner: Arc::new(TaskInner {
                aborted,
                headers_listener: Mutex::new(None),
            }),
        }
    }

    /// 取消请求，重复调用无副作用
    pub fn abort(&self) {
        if !self.inner.aborted.send_replace(true) {
            log::debug!("request task aborted");
        }
    }

    pub fn is_aborted(&self) -> bool {
        *self.inner.aborted.borrow()
    }

    /// 等待直到任务被取消
    pub async fn aborted(&self) {
        let mut receiver = self.inner.aborted.subscribe();
        loop {
            if *receiver.borrow_and_update() {
                return;
            }
            if receiver.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }

    /// 监听响应头，后注册的监听器替换先前的
    pub fn on_headers_received<F>(&self, listener: F)
    where
        F: Fn(&BTreeMap<String, String>) + Send + Sync + 'static,
    {
        *self.listener_slot() = Some(Arc::new(listener));
    }

    /// 取消响应头监听
    pub fn off_headers_received(&self) {
        *self.listener_slot() = None;
    }

    /// 由传输层在收到响应头后调用
    pub fn notify_headers_received(&self, header: &BTreeMap<String, String>) {
        let listener = self.listener_slot().clone();
        if let Some(listener) = listener {
            listener(header);
        }
    }

    fn listener_slot(&self) -> std::sync::MutexGuard<'_, Option<HeadersListener>> {
        self.inner
            .headers_listener
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for RequestTask {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RequestTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestTask")
            .field("aborted", &self.is_aborted())
            .field("headers_listener", &self.listener_slot().is_some())
            .finish()
    }
}
