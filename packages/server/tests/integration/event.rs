use serde_json::json;

use crate::common::{TestApp, in_days, routes};

#[tokio::test]
async fn create_then_get_returns_the_same_record() {
    let app = TestApp::spawn().await;
    let organizer = app.organizer_token().await;
    let user = app.create_authenticated_user("alice@example.com").await;

    let created = app
        .post_with_token(
            routes::EVENTS,
            &json!({"name": "World Championships", "description": "Outdoor", "deadline": in_days(3)}),
            &organizer,
        )
        .await;
    assert_eq!(created.status, 201, "{}", created.text);
    assert!(created.body["created_at"].is_string());

    let fetched = app.get_with_token(&routes::event(created.id()), &user).await;
    assert_eq!(fetched.status, 200);
    assert_eq!(fetched.body, created.body);
}

#[tokio::test]
async fn get_of_a_missing_event_is_not_found() {
    let app = TestApp::spawn().await;
    let user = app.create_authenticated_user("alice@example.com").await;

    let res = app.get_with_token(&routes::event(4242), &user).await;

    assert_eq!(res.status, 400);
    assert_eq!(res.body["error_type"], "not_found_error");
    assert_eq!(res.body["details"], "record not found");
}

#[tokio::test]
async fn non_numeric_id_is_not_found() {
    let app = TestApp::spawn().await;
    let user = app.create_authenticated_user("alice@example.com").await;

    let res = app.get_with_token(&format!("{}/abc", routes::EVENTS), &user).await;

    assert_eq!(res.status, 400);
    assert_eq!(res.body["error_type"], "not_found_error");
}

#[tokio::test]
async fn update_replaces_fields_and_keeps_created_at() {
    let app = TestApp::spawn().await;
    let organizer = app.organizer_token().await;
    let created = app
        .post_with_token(
            routes::EVENTS,
            &json!({"name": "Diamond League", "deadline": in_days(3)}),
            &organizer,
        )
        .await;

    let res = app
        .put_with_token(
            &routes::event(created.id()),
            &json!({"name": "Diamond League Final", "description": "Zurich", "deadline": in_days(5)}),
            &organizer,
        )
        .await;

    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["id"], created.body["id"]);
    assert_eq!(res.body["name"], "Diamond League Final");
    assert_eq!(res.body["description"], "Zurich");
    assert_eq!(res.body["created_at"], created.body["created_at"]);
}

#[tokio::test]
async fn update_of_a_missing_event_is_not_found() {
    let app = TestApp::spawn().await;
    let organizer = app.organizer_token().await;

    let res = app
        .put_with_token(
            &routes::event(4242),
            &json!({"name": "Nothing", "deadline": in_days(1)}),
            &organizer,
        )
        .await;

    assert_eq!(res.status, 400);
    assert_eq!(res.body["error_type"], "not_found_error");
}

#[tokio::test]
async fn empty_name_is_a_validation_error() {
    let app = TestApp::spawn().await;
    let organizer = app.organizer_token().await;

    let res = app
        .post_with_token(
            routes::EVENTS,
            &json!({"name": "", "deadline": in_days(1)}),
            &organizer,
        )
        .await;

    assert_eq!(res.status, 400);
    assert_eq!(res.field_error(), ("required", vec!["name"]));
}

#[tokio::test]
async fn forbidden_write_is_reported_before_its_body_or_id() {
    let app = TestApp::spawn().await;
    let user = app.create_authenticated_user("alice@example.com").await;

    let res = app
        .post_with_token(routes::EVENTS, &json!("not an event"), &user)
        .await;
    assert_eq!(res.status, 401, "{}", res.text);
    assert_eq!(res.body["error_type"], "action_forbidden");

    let res = app
        .put_with_token(&format!("{}/abc", routes::EVENTS), &json!({"name": 5}), &user)
        .await;
    assert_eq!(res.status, 401, "{}", res.text);
    assert_eq!(res.body["error_type"], "action_forbidden");

    let res = app
        .delete_with_token(&format!("{}/abc", routes::EVENTS), &user)
        .await;
    assert_eq!(res.status, 401, "{}", res.text);
    assert_eq!(res.body["error_type"], "action_forbidden");
}

#[tokio::test]
async fn malformed_body_from_an_organizer_is_invalid() {
    let app = TestApp::spawn().await;
    let organizer = app.organizer_token().await;

    let res = app
        .post_with_token(routes::EVENTS, &json!("not an event"), &organizer)
        .await;
    assert_eq!(res.status, 400, "{}", res.text);
    assert_eq!(res.body["error_type"], "invalid_body");
}

#[tokio::test]
async fn active_filter_keeps_open_events() {
    let app = TestApp::spawn().await;
    let organizer = app.organizer_token().await;
    let open = app.create_event(&organizer, "Open", in_days(2)).await;
    let closed = app.create_event(&organizer, "Closed", in_days(-2)).await;

    let res = app
        .get_with_token(&format!("{}?active=true", routes::EVENTS), &organizer)
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    let ids: Vec<i64> = res.body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![open as i64]);

    let res = app
        .get_with_token(&format!("{}?active=false", routes::EVENTS), &organizer)
        .await;
    assert_eq!(res.body["data"][0]["id"], closed);
}

#[tokio::test]
async fn ids_filter_selects_listed_events() {
    let app = TestApp::spawn().await;
    let organizer = app.organizer_token().await;
    let first = app.create_event(&organizer, "One", in_days(1)).await;
    app.create_event(&organizer, "Two", in_days(1)).await;
    let third = app.create_event(&organizer, "Three", in_days(1)).await;

    let res = app
        .get_with_token(
            &format!("{}?ids={first},{third}", routes::EVENTS),
            &organizer,
        )
        .await;

    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["pagination_info"]["total_count"], 2);
    assert_eq!(res.body["data"][0]["id"], first);
    assert_eq!(res.body["data"][1]["id"], third);
}

#[tokio::test]
async fn delete_removes_the_event_with_its_questions() {
    let app = TestApp::spawn().await;
    let organizer = app.organizer_token().await;
    let event_id = app.create_event(&organizer, "Final", in_days(1)).await;
    let question_id = app.create_question(&organizer, event_id, "athlete", 5).await;

    let res = app.delete_with_token(&routes::event(event_id), &organizer).await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body, json!({}));

    let res = app.get_with_token(&routes::question(question_id), &organizer).await;
    assert_eq!(res.status, 400);
    assert_eq!(res.body["error_type"], "not_found_error");

    let res = app.delete_with_token(&routes::event(event_id), &organizer).await;
    assert_eq!(res.status, 400);
}
