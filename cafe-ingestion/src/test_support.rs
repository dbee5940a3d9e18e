use axum::Router;
use reqwest::Client;

/// Serve `router` on an ephemeral local port and return its base URL.
pub(crate) async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind local listener");
    let addr = listener.local_addr().expect("listener address");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("serve test router");
    });
    format!("http://{}", addr)
}

/// HTTP client that never goes through a proxy from the environment.
pub(crate) fn local_client() -> Client {
    Client::builder().no_proxy().build().expect("build test client")
}
