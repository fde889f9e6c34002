use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let port = std::env::var("PORT").unwrap_or_else(|_| "8000".to_string());
    let admin_token = std::env::var("ADMIN_TOKEN")
        .unwrap_or_else(|_| mock_server::DEFAULT_ADMIN_TOKEN.to_string());
    let addr = format!("127.0.0.1:{port}");
    let listener = TcpListener::bind(&addr).await?;
    info!(%addr, "board mock server listening");
    mock_server::run_with_token(listener, &admin_token).await
}
