pub mod traits;
pub mod manager;

pub use traits::{FnInterceptor, Interceptor};
pub use manager::{InterceptorManager, SharedInterceptor};
