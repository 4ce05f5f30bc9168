use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::interceptor::traits::{FnInterceptor, Interceptor};

/// 共享的拦截器引用
pub type SharedInterceptor<V, E> = Arc<dyn Interceptor<V, E>>;

/// 拦截器管理器
///
/// 按注册顺序保存拦截器。`use_*` 返回的编号在整个生命周期内有效：
/// `eject` 只把对应位置置空，其余拦截器的编号与相对顺序不变。
///
/// 注册与移除可以和进行中的请求并发；每个请求在发出时通过 [`snapshot`](Self::snapshot)
/// 取得当时的拦截器列表，之后的变更只影响后续请求。
pub struct InterceptorManager<V, E> {
    handlers: RwLock<Vec<Option<SharedInterceptor<V, E>>>>,
}

impl<V, E> InterceptorManager<V, E>
where
    V: Send + 'static,
    E: Send + 'static,
{
    pub fn new() -> Self {
        Self {
            handlers: RwLock::new(Vec::new()),
        }
    }

    /// 注册拦截器，返回其编号
    pub fn use_interceptor<I>(&self, interceptor: I) -> usize
    where
        I: Interceptor<V, E> + 'static,
    {
        self.use_shared(Arc::new(interceptor))
    }

    /// 注册已共享的拦截器，同一个实例可以注册多次
    pub fn use_shared(&self, interceptor: SharedInterceptor<V, E>) -> usize {
        let mut handlers = self.write();
        handlers.push(Some(interceptor));
        let id = handlers.len() - 1;
        log::trace!("interceptor registered with id {}", id);
        id
    }

    /// 只注册成功处理函数
    pub fn use_fulfilled<F>(&self, fulfilled: F) -> usize
    where
        F: Fn(V) -> Result<V, E> + Send + Sync + 'static,
    {
        self.use_interceptor(FnInterceptor::new().fulfilled(fulfilled))
    }

    /// 只注册失败处理函数
    pub fn use_rejected<F>(&self, rejected: F) -> usize
    where
        F: Fn(E) -> Result<V, E> + Send + Sync + 'static,
    {
        self.use_interceptor(FnInterceptor::new().rejected(rejected))
    }

    /// 移除指定编号的拦截器，未知或已移除的编号不做任何事
    pub fn eject(&self, id: usize) {
        let mut handlers = self.write();
        match handlers.get_mut(id) {
            Some(slot) if slot.is_some() => {
                *slot = None;
                log::trace!("interceptor {} ejected", id);
            }
            _ => log::trace!("eject ignored for unknown interceptor {}", id),
        }
    }

    /// 当前生效的拦截器，按注册顺序
    pub fn snapshot(&self) -> Vec<SharedInterceptor<V, E>> {
        self.read().iter().flatten().cloned().collect()
    }

    /// 生效中的拦截器数量
    pub fn len(&self) -> usize {
        self.read().iter().filter(|slot| slot.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 依次把结果交给拦截器链
    ///
    /// 成功值交给 `on_fulfilled`，错误交给 `on_rejected`；任意阶段拒绝后，
    /// 后续阶段只会看到它们的 `on_rejected`，直到有阶段恢复为成功值。
    pub async fn run_chain(
        chain: &[SharedInterceptor<V, E>],
        initial: Result<V, E>,
    ) -> Result<V, E> {
        let mut state = initial;
        for interceptor in chain {
            state = match state {
                Ok(value) => interceptor.on_fulfilled(value).await,
                Err(error) => interceptor.on_rejected(error).await,
            };
        }
        state
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<Option<SharedInterceptor<V, E>>>> {
        self.handlers
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<Option<SharedInterceptor<V, E>>>> {
        self.handlers
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<V, E> Default for InterceptorManager<V, E>
where
    V: Send + 'static,
    E: Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}
