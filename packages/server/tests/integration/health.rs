use crate::common::{TestApp, routes};

#[tokio::test]
async fn liveness_always_succeeds() {
    let app = TestApp::spawn().await;

    let res = app.get_without_token(routes::HEALTHZ).await;

    assert_eq!(res.status, 200);
    assert_eq!(res.body["status"], "ok");
}

#[tokio::test]
async fn readiness_succeeds_with_a_live_database() {
    let app = TestApp::spawn().await;

    let res = app.get_without_token(routes::READYZ).await;

    assert_eq!(res.status, 200);
}

#[tokio::test]
async fn unknown_path_is_a_404() {
    let app = TestApp::spawn().await;

    let res = app.get_without_token("/api/v1/nowhere").await;

    assert_eq!(res.status, 404);
    assert_eq!(res.body["error_type"], "not_found_error");
    assert_eq!(res.body["details"], "path not found");
}
