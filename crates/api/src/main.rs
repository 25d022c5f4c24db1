#[tokio::main]
async fn main() {
    artmarket_observability::init();

    let session_secret = std::env::var("SESSION_SECRET").unwrap_or_else(|_| {
        tracing::warn!("SESSION_SECRET not set; using insecure dev default");
        "dev-secret".to_string()
    });

    let app = artmarket_api::app::build_app(session_secret);

    let listener = tokio::net::TcpListener::bind("0.0.0.0:8080")
        .await
        .expect("failed to bind 0.0.0.0:8080");

    tracing::info!("listening on {}", listener.local_addr().unwrap());

    axum::serve(listener, app).await.unwrap();
}
