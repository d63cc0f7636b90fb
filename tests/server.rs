use tollgate::{Request, Router, Server};

#[tokio::test]
async fn serve_returns_once_shutdown_resolves() {
    let app = Router::new().get("/", |_req: Request| async { "ok" });

    Server::bind("127.0.0.1:0")
        .serve_with_shutdown(app, async {})
        .await
        .unwrap();
}
