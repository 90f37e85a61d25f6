#[tokio::main]
async fn main() -> anyhow::Result<()> {
    pricelab_observability::init();

    let store = pricelab_api::app::services::build_store().await?;
    let app = pricelab_api::app::build_app(store);

    let addr = std::env::var("PRICELAB_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
