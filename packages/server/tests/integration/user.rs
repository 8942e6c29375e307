use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use serde_json::json;
use server::entity::{answer, user_role};

use crate::common::{PASSWORD, TestApp, in_days, routes};

#[tokio::test]
async fn admin_creates_a_user_with_roles() {
    let app = TestApp::spawn().await;
    let admin = app.admin_token().await;

    let res = app
        .post_with_token(
            routes::USERS,
            &json!({
                "email": "Org@Example.com",
                "password": PASSWORD,
                "roles": ["organizer", "user", "organizer"],
            }),
            &admin,
        )
        .await;

    assert_eq!(res.status, 201, "{}", res.text);
    assert_eq!(res.body["email"], "org@example.com");
    assert_eq!(res.body["roles"], json!(["organizer", "user"]));
    assert!(res.body.get("password").is_none());

    // The new account can log in with the given password.
    let token = app.login("org@example.com").await;
    let event = app
        .post_with_token(
            routes::EVENTS,
            &json!({"name": "Final", "description": "", "deadline": in_days(1)}),
            &token,
        )
        .await;
    assert_eq!(event.status, 201, "{}", event.text);
}

#[tokio::test]
async fn created_user_defaults_to_the_user_role() {
    let app = TestApp::spawn().await;
    let admin = app.admin_token().await;

    let res = app
        .post_with_token(
            routes::USERS,
            &json!({"email": "plain@example.com", "password": PASSWORD}),
            &admin,
        )
        .await;

    assert_eq!(res.status, 201, "{}", res.text);
    assert_eq!(res.body["roles"], json!(["user"]));
}

#[tokio::test]
async fn unknown_role_is_rejected() {
    let app = TestApp::spawn().await;
    let admin = app.admin_token().await;

    let res = app
        .post_with_token(
            routes::USERS,
            &json!({"email": "x@example.com", "password": PASSWORD, "roles": ["superuser"]}),
            &admin,
        )
        .await;

    assert_eq!(res.status, 400);
    assert_eq!(res.field_error(), ("oneof", vec!["roles"]));
}

#[tokio::test]
async fn duplicate_email_is_rejected() {
    let app = TestApp::spawn().await;
    let admin = app.admin_token().await;
    app.create_authenticated_user("taken@example.com").await;

    let res = app
        .post_with_token(
            routes::USERS,
            &json!({"email": "TAKEN@example.com", "password": PASSWORD}),
            &admin,
        )
        .await;

    assert_eq!(res.status, 400);
    assert_eq!(res.field_error(), ("unique", vec!["email"]));
}

#[tokio::test]
async fn update_replaces_roles_only_when_given() {
    let app = TestApp::spawn().await;
    let admin = app.admin_token().await;
    let created = app
        .post_with_token(
            routes::USERS,
            &json!({"email": "bob@example.com", "password": PASSWORD, "roles": ["organizer"]}),
            &admin,
        )
        .await;
    let id = created.id();

    let res = app
        .put_with_token(
            &routes::user(id),
            &json!({"email": "bob@example.com", "password": "new-password"}),
            &admin,
        )
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["roles"], json!(["organizer"]));

    let res = app
        .put_with_token(
            &routes::user(id),
            &json!({"email": "robert@example.com", "password": "new-password", "roles": ["user"]}),
            &admin,
        )
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["email"], "robert@example.com");
    assert_eq!(res.body["roles"], json!(["user"]));
    assert_eq!(res.body["created_at"], created.body["created_at"]);

    let login = app
        .post_without_token(
            routes::LOGIN,
            &json!({"email": "robert@example.com", "password": "new-password"}),
        )
        .await;
    assert_eq!(login.status, 200, "{}", login.text);
}

#[tokio::test]
async fn user_may_keep_its_own_email_on_update() {
    let app = TestApp::spawn().await;
    let admin = app.admin_token().await;
    app.create_authenticated_user("carol@example.com").await;
    let list = app
        .get_with_token(&format!("{}?search=carol", routes::USERS), &admin)
        .await;
    let id = list.body["data"][0]["id"].as_i64().unwrap() as i32;

    let res = app
        .put_with_token(
            &routes::user(id),
            &json!({"email": "carol@example.com", "password": PASSWORD}),
            &admin,
        )
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
}

#[tokio::test]
async fn users_can_be_searched_by_email() {
    let app = TestApp::spawn().await;
    let admin = app.admin_token().await;
    app.create_authenticated_user("alice@example.com").await;
    app.create_authenticated_user("bob@example.com").await;
    app.create_authenticated_user("100%real@example.com").await;

    let res = app
        .get_with_token(&format!("{}?search=ALI", routes::USERS), &admin)
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["pagination_info"]["total_count"], 1);
    assert_eq!(res.body["data"][0]["email"], "alice@example.com");

    // `%` is matched literally.
    let res = app
        .get_with_token(&format!("{}?search=%25", routes::USERS), &admin)
        .await;
    assert_eq!(res.body["pagination_info"]["total_count"], 1);
    assert_eq!(res.body["data"][0]["email"], "100%real@example.com");
}

#[tokio::test]
async fn users_cannot_be_ordered_by_password() {
    let app = TestApp::spawn().await;
    let admin = app.admin_token().await;

    let res = app
        .get_with_token(&format!("{}?order_by=password", routes::USERS), &admin)
        .await;
    assert_eq!(res.status, 400, "{}", res.text);
    assert_eq!(res.field_error(), ("oneof", vec!["order_by"]));

    let res = app
        .get_with_token(&format!("{}?order_by=email", routes::USERS), &admin)
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
}

#[tokio::test]
async fn non_admin_cannot_manage_users() {
    let app = TestApp::spawn().await;
    let organizer = app.organizer_token().await;

    let res = app.get_with_token(routes::USERS, &organizer).await;
    assert_eq!(res.status, 401);
    assert_eq!(res.body["error_type"], "action_forbidden");

    let res = app
        .post_with_token(
            routes::USERS,
            &json!({"email": "x@example.com", "password": PASSWORD}),
            &organizer,
        )
        .await;
    assert_eq!(res.status, 401);
    assert_eq!(res.body["error_type"], "action_forbidden");
}

#[tokio::test]
async fn deleting_a_user_removes_its_answers_and_roles() {
    let app = TestApp::spawn().await;
    let admin = app.admin_token().await;
    let organizer = app.organizer_token().await;
    let event_id = app.create_event(&organizer, "Final", in_days(1)).await;
    let question_id = app.create_question(&organizer, event_id, "athlete", 5).await;

    let token = app.create_authenticated_user("leaving@example.com").await;
    app.create_answer(&token, question_id, json!({"value": "Kipchoge"}))
        .await;
    let list = app
        .get_with_token(&format!("{}?search=leaving", routes::USERS), &admin)
        .await;
    let id = list.body["data"][0]["id"].as_i64().unwrap() as i32;

    let res = app.delete_with_token(&routes::user(id), &admin).await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body, json!({}));

    let answers = answer::Entity::find()
        .filter(answer::Column::UserId.eq(id))
        .count(&app.db)
        .await
        .unwrap();
    assert_eq!(answers, 0);
    let roles = user_role::Entity::find()
        .filter(user_role::Column::UserId.eq(id))
        .count(&app.db)
        .await
        .unwrap();
    assert_eq!(roles, 0);

    // The deleted user's token no longer resolves.
    let res = app.get_with_token(routes::RANKING, &token).await;
    assert_eq!(res.status, 401);
    assert_eq!(res.body["error_type"], "user_not_found");
}
