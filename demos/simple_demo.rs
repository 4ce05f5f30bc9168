use luch_request::{RequestClient, RequestConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let client = RequestClient::new(
        RequestConfig::new().with_base_url("https://jsonplaceholder.typicode.com"),
    );
    let response = client.get("/todos/1", RequestConfig::new()).await?;
    println!("{} {:?}", response.status_code, response.data);
    Ok(())
}
