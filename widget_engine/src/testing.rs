use axum::{Json, Router, http::StatusCode, routing::get};
use serde_json::json;
use std::time::Duration;

/// Start a device-like HTTP server on a free local port and return its base
/// URL.
///
/// Routes:
/// - `/on`, `/off`: plain text acknowledgements
/// - `/slow`: acknowledgement after 200ms
/// - `/fail`: 500
/// - `/envelope/value`, `/envelope/sentinel`, `/envelope/empty`: JSON
///   envelopes with `7`, `-1` and no `response` field
/// - `/malformed`: a body that is not JSON
pub async fn start_mock_server() -> String {
    let app = Router::new()
        .route("/on", get(|| async { "ok" }))
        .route("/off", get(|| async { "ok" }))
        .route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_millis(200)).await;
                "ok"
            }),
        )
        .route("/fail", get(|| async { StatusCode::INTERNAL_SERVER_ERROR }))
        .route(
            "/envelope/value",
            get(|| async { Json(json!({ "response": 7 })) }),
        )
        .route(
            "/envelope/sentinel",
            get(|| async { Json(json!({ "response": -1 })) }),
        )
        .route("/envelope/empty", get(|| async { Json(json!({})) }))
        .route("/malformed", get(|| async { "<html>not json</html>" }));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind mock server");
    let addr = listener.local_addr().expect("mock server has no address");

    tokio::spawn(async move {
        if let Err(err) = axum::serve(listener, app).await {
            eprintln!("Mock server error: {err}");
        }
    });

    format!("http://{addr}")
}
