pub mod http;
pub mod config;
pub mod url;
pub mod response;

pub use http::{ContentType, DataType, HttpMethod, ResponseType};
pub use config::{
    default_validate_status, merge_config, GetTaskHook, RequestConfig, UploadFile,
    ValidateStatus, DEFAULT_TIMEOUT,
};
pub use url::{build_url, combine_urls, is_absolute_url, query_params, serialize_params};
pub use response::{ErrorKind, HttpDownloadResponse, HttpError, HttpResponse, ResponseBody};
