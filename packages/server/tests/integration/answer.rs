use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use serde_json::json;
use server::entity::answer;

use crate::common::{TestApp, in_days, routes};

struct Fixture {
    app: TestApp,
    organizer: String,
    event_id: i32,
    question_id: i32,
}

async fn fixture() -> Fixture {
    let app = TestApp::spawn().await;
    let organizer = app.organizer_token().await;
    let event_id = app.create_event(&organizer, "Final", in_days(1)).await;
    let question_id = app.create_question(&organizer, event_id, "athlete", 5).await;
    Fixture {
        app,
        organizer,
        event_id,
        question_id,
    }
}

#[tokio::test]
async fn user_answers_a_question() {
    let f = fixture().await;
    let token = f.app.create_authenticated_user("alice@example.com").await;

    let res = f
        .app
        .post_with_token(
            routes::MY_ANSWERS,
            &json!({"question_id": f.question_id, "content": {"value": "Kipchoge"}}),
            &token,
        )
        .await;

    assert_eq!(res.status, 201, "{}", res.text);
    assert_eq!(res.body["question_id"], f.question_id);
    assert_eq!(res.body["content"], json!({"value": "Kipchoge"}));
    assert_eq!(res.body["points"], 0);
    assert!(res.body["points_granted_at"].is_null());

    let mine = f.app.get_with_token(routes::MY_ANSWERS, &token).await;
    assert_eq!(mine.body["pagination_info"]["total_count"], 1);
    assert_eq!(mine.body["data"][0]["id"], res.body["id"]);
}

#[tokio::test]
async fn second_answer_to_the_same_question_is_rejected() {
    let f = fixture().await;
    let token = f.app.create_authenticated_user("alice@example.com").await;
    f.app
        .create_answer(&token, f.question_id, json!({"value": "Kipchoge"}))
        .await;

    let res = f
        .app
        .post_with_token(
            routes::MY_ANSWERS,
            &json!({"question_id": f.question_id, "content": {"value": "Bekele"}}),
            &token,
        )
        .await;

    assert_eq!(res.status, 400);
    assert_eq!(res.body["error_type"], "validation_error");
    assert_eq!(res.field_error(), ("already_answered", vec!["question_id"]));
    assert_eq!(res.body["details"][0]["details"], "already answered by current user");
}

#[tokio::test]
async fn content_must_match_the_question_type() {
    let f = fixture().await;
    let token = f.app.create_authenticated_user("alice@example.com").await;

    let res = f
        .app
        .post_with_token(
            routes::MY_ANSWERS,
            &json!({"question_id": f.question_id, "content": {"athlete_id_one": 1}}),
            &token,
        )
        .await;

    assert_eq!(res.status, 400);
    assert_eq!(res.field_error(), ("invalid_shape", vec!["content"]));
}

#[tokio::test]
async fn country_answer_must_reference_existing_athletes() {
    let f = fixture().await;
    let admin = f.app.admin_token().await;
    let athlete = f.app.create_athlete(&admin, "Faith", "Kipyegon").await;
    let question_id = f
        .app
        .create_question(&f.organizer, f.event_id, "country", 5)
        .await;
    let token = f.app.create_authenticated_user("alice@example.com").await;

    let res = f
        .app
        .post_with_token(
            routes::MY_ANSWERS,
            &json!({
                "question_id": question_id,
                "content": {"athlete_id_one": athlete, "athlete_id_two": 4242, "athlete_id_three": athlete},
            }),
            &token,
        )
        .await;

    assert_eq!(res.status, 400);
    assert_eq!(res.field_error(), ("id_of", vec!["content", "athlete_id_two"]));
}

#[tokio::test]
async fn answer_to_a_missing_question_is_rejected() {
    let f = fixture().await;
    let token = f.app.create_authenticated_user("alice@example.com").await;

    let res = f
        .app
        .post_with_token(
            routes::MY_ANSWERS,
            &json!({"question_id": 4242, "content": {"value": "Kipchoge"}}),
            &token,
        )
        .await;

    assert_eq!(res.status, 400);
    assert_eq!(res.field_error(), ("id_of", vec!["question_id"]));
}

#[tokio::test]
async fn closed_event_rejects_new_answers() {
    let f = fixture().await;
    let token = f.app.create_authenticated_user("alice@example.com").await;
    f.app.close_event(f.event_id).await;

    let res = f
        .app
        .post_with_token(
            routes::MY_ANSWERS,
            &json!({"question_id": f.question_id, "content": {"value": "Kipchoge"}}),
            &token,
        )
        .await;

    assert_eq!(res.status, 400);
    assert_eq!(res.field_error(), ("event_closed", vec!["question_id"]));
}

#[tokio::test]
async fn own_answers_are_scoped_to_the_caller() {
    let f = fixture().await;
    let alice = f.app.create_authenticated_user("alice@example.com").await;
    let bob = f.app.create_authenticated_user("bob@example.com").await;
    let answer_id = f
        .app
        .create_answer(&alice, f.question_id, json!({"value": "Kipchoge"}))
        .await;

    let res = f.app.get_with_token(&routes::my_answer(answer_id), &bob).await;
    assert_eq!(res.status, 400);
    assert_eq!(res.body["error_type"], "not_found_error");

    let res = f
        .app
        .put_with_token(
            &routes::my_answer(answer_id),
            &json!({"question_id": f.question_id, "content": {"value": "Bekele"}}),
            &bob,
        )
        .await;
    assert_eq!(res.status, 400);
    assert_eq!(res.body["error_type"], "not_found_error");

    let res = f.app.delete_with_token(&routes::my_answer(answer_id), &bob).await;
    assert_eq!(res.status, 400);

    let mine = f.app.get_with_token(routes::MY_ANSWERS, &bob).await;
    assert_eq!(mine.body["pagination_info"]["total_count"], 0);

    // The unscoped collection shows everyone's answers.
    let res = f.app.get_with_token(&routes::answer(answer_id), &bob).await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["content"], json!({"value": "Kipchoge"}));
}

#[tokio::test]
async fn owner_updates_and_deletes_an_answer() {
    let f = fixture().await;
    let token = f.app.create_authenticated_user("alice@example.com").await;
    let answer_id = f
        .app
        .create_answer(&token, f.question_id, json!({"value": "Kipchoge"}))
        .await;

    let res = f
        .app
        .put_with_token(
            &routes::my_answer(answer_id),
            &json!({"question_id": f.question_id, "content": {"value": "Bekele"}}),
            &token,
        )
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["content"], json!({"value": "Bekele"}));
    assert_eq!(res.body["question_id"], f.question_id);

    let res = f.app.delete_with_token(&routes::my_answer(answer_id), &token).await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body, json!({}));
}

#[tokio::test]
async fn graded_answer_is_immutable_to_its_owner() {
    let f = fixture().await;
    let token = f.app.create_authenticated_user("alice@example.com").await;
    let answer_id = f
        .app
        .create_answer(&token, f.question_id, json!({"value": "Kipchoge"}))
        .await;

    let graded = answer::Entity::find_by_id(answer_id)
        .one(&f.app.db)
        .await
        .unwrap()
        .unwrap();
    let mut active: answer::ActiveModel = graded.into();
    active.points = Set(5);
    active.points_granted_at = Set(Some(chrono::Utc::now()));
    active.update(&f.app.db).await.unwrap();

    let res = f
        .app
        .put_with_token(
            &routes::my_answer(answer_id),
            &json!({"question_id": f.question_id, "content": {"value": "Bekele"}}),
            &token,
        )
        .await;
    assert_eq!(res.status, 400);
    assert_eq!(res.field_error(), ("points_granted", vec!["question_id"]));
    assert_eq!(res.body["details"][0]["details"], "points already granted");

    let res = f.app.delete_with_token(&routes::my_answer(answer_id), &token).await;
    assert_eq!(res.status, 400);
    assert_eq!(res.field_error(), ("points_granted", vec!["question_id"]));
}

#[tokio::test]
async fn answers_collection_is_read_only() {
    let f = fixture().await;
    let token = f.app.create_authenticated_user("alice@example.com").await;

    let res = f
        .app
        .post_with_token(
            routes::ANSWERS,
            &json!({"question_id": f.question_id, "content": {"value": "Kipchoge"}}),
            &token,
        )
        .await;

    assert_eq!(res.status, 405);
}

#[tokio::test]
async fn answers_can_be_filtered_by_question_and_user() {
    let f = fixture().await;
    let alice = f.app.create_authenticated_user("alice@example.com").await;
    let bob = f.app.create_authenticated_user("bob@example.com").await;
    let other = f
        .app
        .create_question(&f.organizer, f.event_id, "athlete", 1)
        .await;
    let alice_answer = f
        .app
        .create_answer(&alice, f.question_id, json!({"value": "Kipchoge"}))
        .await;
    f.app
        .create_answer(&bob, f.question_id, json!({"value": "Bekele"}))
        .await;
    f.app
        .create_answer(&alice, other, json!({"value": "Cheptegei"}))
        .await;

    let res = f
        .app
        .get_with_token(
            &format!("{}?question_id={}", routes::ANSWERS, f.question_id),
            &bob,
        )
        .await;
    assert_eq!(res.body["pagination_info"]["total_count"], 2);

    let alice_id = f.app.get_with_token(&routes::answer(alice_answer), &bob).await.body["user_id"]
        .as_i64()
        .unwrap();
    let res = f
        .app
        .get_with_token(
            &format!("{}?question_id={}&user_id={alice_id}", routes::ANSWERS, f.question_id),
            &bob,
        )
        .await;
    assert_eq!(res.body["pagination_info"]["total_count"], 1);
    assert_eq!(res.body["data"][0]["id"], alice_answer);
}
