use luch_request::{RequestClient, RequestConfig, UploadFile};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let client = RequestClient::new(RequestConfig::new().with_base_url("https://httpbin.org"));

    let path = std::env::temp_dir().join("luch-demo-upload.txt");
    tokio::fs::write(&path, "hello from luch").await?;
    let path = path.to_string_lossy().to_string();

    println!("=== 单文件上传 ===");
    let response = client
        .upload(
            "/post",
            RequestConfig::new()
                .with_file_path(path.clone())
                .with_name("avatar")
                .with_form_data("album", "demo"),
        )
        .await?;
    println!("{}: {:?}", response.err_msg, response.data.as_json().map(|data| &data["files"]));

    println!("\n=== 多文件上传 ===");
    // files 存在时 file_path 与 name 会被忽略
    let response = client
        .upload(
            "/post",
            RequestConfig::new().with_files(vec![
                UploadFile::new("first", path.clone()),
                UploadFile::new("second", path.clone()),
            ]),
        )
        .await?;
    println!("{}: {:?}", response.err_msg, response.data.as_json().map(|data| &data["files"]));

    println!("\n=== 下载 ===");
    let download = client.download("/image/png", RequestConfig::new()).await?;
    println!("{} 已保存到 {}", download.err_msg, download.temp_file_path);
    let size = tokio::fs::metadata(&download.temp_file_path).await?.len();
    println!("文件大小: {} 字节", size);

    tokio::fs::remove_file(&download.temp_file_path).await?;
    tokio::fs::remove_file(&path).await?;
    Ok(())
}
