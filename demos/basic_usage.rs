use std::time::Duration;

use luch_request::{HttpMethod, RequestClient, RequestConfig};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// 用户数据结构
#[derive(Debug, Serialize, Deserialize)]
struct User {
    id: u32,
    name: String,
    email: String,
}

#[derive(Debug, Deserialize)]
struct Post {
    id: u32,
    title: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let client = RequestClient::new(
        RequestConfig::new()
            .with_base_url("https://jsonplaceholder.typicode.com")
            .with_header("Accept", "application/json")
            .with_timeout(Duration::from_secs(10)),
    );

    println!("=== GET 请求 ===");
    let user = client
        .request_as::<User>(RequestConfig::new().with_url("/users/1"))
        .await?;
    println!("用户: {:?}", user.data);

    // 查询参数会拼接到 URL 上
    let posts = client
        .get("/posts", RequestConfig::new().with_param("userId", 1))
        .await?
        .decode::<Vec<Post>>()?;
    println!(
        "用户 1 共有 {} 篇文章，第一篇: {:?}",
        posts.data.len(),
        posts.data.first().map(|post| (post.id, &post.title))
    );

    println!("\n=== POST 请求 ===");
    let created = client
        .post(
            "/users",
            Some(json!({"name": "新用户", "email": "new@example.com"})),
            RequestConfig::new(),
        )
        .await?;
    println!("状态码: {}，响应: {:?}", created.status_code, created.data);

    println!("\n=== 通用 request ===");
    let deleted = client
        .request(
            RequestConfig::new()
                .with_url("/posts/1")
                .with_method(HttpMethod::Delete),
        )
        .await?;
    println!("删除完成: {}", deleted.err_msg);

    println!("\n=== 错误状态码 ===");
    match client.get("/posts/0/missing", RequestConfig::new()).await {
        Ok(response) => println!("意外成功: {}", response.status_code),
        Err(error) => println!("请求失败 ({:?}): {}", error.kind(), error),
    }

    // 放宽状态码校验后 404 也算成功
    let relaxed = client
        .get(
            "/posts/0/missing",
            RequestConfig::new().with_validate_status(|status| status < 500),
        )
        .await?;
    println!("放宽校验后的状态码: {}", relaxed.status_code);

    Ok(())
}
