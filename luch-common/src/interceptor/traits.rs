use async_trait::async_trait;

/// 拦截器接口
///
/// 一个拦截器由成功与失败两个处理函数组成，两者都可以不实现：
/// - `on_fulfilled`：收到上一阶段的值，返回新值或拒绝，默认原样放行
/// - `on_rejected`：收到上一阶段的错误，可以恢复为值或继续拒绝，默认继续拒绝
///
/// 请求侧 `V` 为请求配置，响应侧 `V` 为响应；`E` 统一为请求错误。
#[async_trait]
pub trait Interceptor<V, E>: Send + Sync
where
    V: Send + 'static,
    E: Send + 'static,
{
    async fn on_fulfilled(&self, value: V) -> Result<V, E> {
        Ok(value)
    }

    async fn on_rejected(&self, error: E) -> Result<V, E> {
        Err(error)
    }
}

type Fulfilled<V, E> = Box<dyn Fn(V) -> Result<V, E> + Send + Sync>;
type Rejected<V, E> = Box<dyn Fn(E) -> Result<V, E> + Send + Sync>;

/// 由同步闭包组成的拦截器
///
/// ```ignore
/// let id = client.interceptors.request.use_interceptor(
///     FnInterceptor::new().fulfilled(|config| Ok(config.with_header("X-Trace", "1"))),
/// );
/// ```
pub struct FnInterceptor<V, E> {
    fulfilled: Option<Fulfilled<V, E>>,
    rejected: Option<Rejected<V, E>>,
}

impl<V, E> FnInterceptor<V, E> {
    pub fn new() -> Self {
        Self {
            fulfilled: None,
            rejected: None,
        }
    }

    pub fn fulfilled<F>(mut self, f: F) -> Self
    where
        F: Fn(V) -> Result<V, E> + Send + Sync + 'static,
    {
        self.fulfilled = Some(Box::new(f));
        self
    }

    pub fn rejected<F>(mut self, f: F) -> Self
    where
        F: Fn(E) -> Result<V, E> + Send + Sync + 'static,
    {
        self.rejected = Some(Box::new(f));
        self
    }
}

impl<V, E> Default for FnInterceptor<V, E> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<V, E> Interceptor<V, E> for FnInterceptor<V, E>
where
    V: Send + 'static,
    E: Send + 'static,
{
    async fn on_fulfilled(&self, value: V) -> Result<V, E> {
        match &self.fulfilled {
            Some(fulfilled) => fulfilled(value),
            None => Ok(value),
        }
    }

    async fn on_rejected(&self, error: E) -> Result<V, E> {
        match &self.rejected {
            Some(rejected) => rejected(error),
            None => Err(error),
        }
    }
}
