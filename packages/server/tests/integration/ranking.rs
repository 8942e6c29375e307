use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use serde_json::json;
use server::entity::answer;

use crate::common::{TestApp, in_days, routes};

/// Grade an answer directly, as the points granter would.
async fn grant(app: &TestApp, answer_id: i32, points: i32) {
    let model = answer::Entity::find_by_id(answer_id)
        .one(&app.db)
        .await
        .unwrap()
        .unwrap();
    let mut active: answer::ActiveModel = model.into();
    active.points = Set(points);
    active.points_granted_at = Set(Some(chrono::Utc::now()));
    active.update(&app.db).await.unwrap();
}

#[tokio::test]
async fn ranking_orders_users_by_total_points() {
    let app = TestApp::spawn().await;
    let organizer = app.organizer_token().await;
    let event_id = app.create_event(&organizer, "Final", in_days(1)).await;
    let q1 = app.create_question(&organizer, event_id, "athlete", 5).await;
    let q2 = app.create_question(&organizer, event_id, "athlete", 3).await;

    let alice = app.create_authenticated_user("alice@example.com").await;
    let bob = app.create_authenticated_user("bob@example.com").await;
    app.create_authenticated_user("idle@example.com").await;

    let a1 = app.create_answer(&alice, q1, json!({"value": "A"})).await;
    let a2 = app.create_answer(&alice, q2, json!({"value": "B"})).await;
    let b1 = app.create_answer(&bob, q1, json!({"value": "C"})).await;
    grant(&app, a1, 0).await;
    grant(&app, a2, 3).await;
    grant(&app, b1, 5).await;

    let res = app.get_with_token(routes::RANKING, &alice).await;
    assert_eq!(res.status, 200, "{}", res.text);

    let data = res.body["data"].as_array().unwrap();
    assert_eq!(data.len(), 2, "users without answers are not ranked");
    assert_eq!(data[0]["email"], "bob@example.com");
    assert_eq!(data[0]["total_points"], 5);
    assert_eq!(data[1]["email"], "alice@example.com");
    assert_eq!(data[1]["total_points"], 3);
    assert_eq!(res.body["pagination_info"]["total_count"], 2);
}

#[tokio::test]
async fn ranking_can_be_limited_to_one_event() {
    let app = TestApp::spawn().await;
    let organizer = app.organizer_token().await;
    let sprint = app.create_event(&organizer, "100m", in_days(1)).await;
    let marathon = app.create_event(&organizer, "Marathon", in_days(2)).await;
    let q_sprint = app.create_question(&organizer, sprint, "athlete", 5).await;
    let q_marathon = app.create_question(&organizer, marathon, "athlete", 9).await;

    let alice = app.create_authenticated_user("alice@example.com").await;
    let bob = app.create_authenticated_user("bob@example.com").await;
    let a = app.create_answer(&alice, q_sprint, json!({"value": "A"})).await;
    let b = app.create_answer(&bob, q_marathon, json!({"value": "B"})).await;
    grant(&app, a, 5).await;
    grant(&app, b, 9).await;

    let res = app
        .get_with_token(&format!("{}?event_id={sprint}", routes::RANKING), &bob)
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    let data = res.body["data"].as_array().unwrap();
    assert_eq!(data.len(), 1);
    assert_eq!(data[0]["email"], "alice@example.com");
    assert_eq!(data[0]["total_points"], 5);
}

#[tokio::test]
async fn ranking_ties_break_on_user_id() {
    let app = TestApp::spawn().await;
    let organizer = app.organizer_token().await;
    let event_id = app.create_event(&organizer, "Final", in_days(1)).await;
    let question_id = app.create_question(&organizer, event_id, "athlete", 5).await;

    let alice = app.create_authenticated_user("alice@example.com").await;
    let bob = app.create_authenticated_user("bob@example.com").await;
    app.create_answer(&alice, question_id, json!({"value": "A"})).await;
    app.create_answer(&bob, question_id, json!({"value": "B"})).await;

    let res = app
        .get_with_token(&format!("{}?per_page=1&page_no=2", routes::RANKING), &bob)
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["data"][0]["email"], "bob@example.com");
    assert_eq!(res.body["data"][0]["total_points"], 0);
    assert_eq!(res.body["pagination_info"]["total_pages"], 2);
    assert_eq!(res.body["pagination_info"]["is_last_page"], true);
}

#[tokio::test]
async fn ranking_requires_a_token() {
    let app = TestApp::spawn().await;
    let res = app.get_without_token(routes::RANKING).await;
    assert_eq!(res.status, 401);
    assert_eq!(res.body["error_type"], "auth_header_missing");
}
