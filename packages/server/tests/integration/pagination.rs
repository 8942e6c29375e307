use crate::common::{TestApp, in_days, routes};

async fn seed_events(app: &TestApp, token: &str, n: usize) -> Vec<i32> {
    let mut ids = Vec::with_capacity(n);
    for i in 0..n {
        ids.push(app.create_event(token, &format!("Event {i:02}"), in_days(1)).await);
    }
    ids
}

#[tokio::test]
async fn pages_are_sliced_and_described() {
    let app = TestApp::spawn().await;
    let organizer = app.organizer_token().await;
    let ids = seed_events(&app, &organizer, 5).await;

    let res = app
        .get_with_token(&format!("{}?per_page=2&page_no=2", routes::EVENTS), &organizer)
        .await;
    assert_eq!(res.status, 200, "{}", res.text);

    let data = res.body["data"].as_array().unwrap();
    assert_eq!(data.len(), 2);
    assert_eq!(data[0]["id"], ids[2]);
    assert_eq!(data[1]["id"], ids[3]);

    let info = &res.body["pagination_info"];
    assert_eq!(info["count"], 2);
    assert_eq!(info["total_count"], 5);
    assert_eq!(info["total_pages"], 3);
    assert_eq!(info["current_page"], 2);
    assert_eq!(info["next_page"], 3);
    assert_eq!(info["prev_page"], 1);
    assert_eq!(info["is_first_page"], false);
    assert_eq!(info["is_last_page"], false);
    assert_eq!(info["is_out_of_range_page"], false);
}

#[tokio::test]
async fn page_past_the_end_is_empty_and_out_of_range() {
    let app = TestApp::spawn().await;
    let organizer = app.organizer_token().await;
    seed_events(&app, &organizer, 3).await;

    let res = app
        .get_with_token(&format!("{}?per_page=2&page_no=3", routes::EVENTS), &organizer)
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["data"].as_array().unwrap().len(), 0);

    let info = &res.body["pagination_info"];
    assert_eq!(info["total_pages"], 2);
    assert_eq!(info["is_out_of_range_page"], true);
    assert_eq!(info["prev_page"], 2);
    assert!(info["next_page"].is_null());
}

#[tokio::test]
async fn huge_page_number_is_empty_not_an_error() {
    let app = TestApp::spawn().await;
    let organizer = app.organizer_token().await;
    seed_events(&app, &organizer, 2).await;

    for page_no in ["9223372036854775807", "100000000000000000"] {
        let res = app
            .get_with_token(
                &format!("{}?per_page=100&page_no={page_no}", routes::EVENTS),
                &organizer,
            )
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["data"].as_array().unwrap().len(), 0);
        assert_eq!(res.body["pagination_info"]["is_out_of_range_page"], true);
    }

    let ranking = app
        .get_with_token(&format!("{}?page_no=9223372036854775807", routes::RANKING), &organizer)
        .await;
    assert_eq!(ranking.status, 200, "{}", ranking.text);
    assert_eq!(ranking.body["data"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn empty_collection_has_one_page() {
    let app = TestApp::spawn().await;
    let organizer = app.organizer_token().await;

    let res = app.get_with_token(routes::EVENTS, &organizer).await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["data"].as_array().unwrap().len(), 0);

    let info = &res.body["pagination_info"];
    assert_eq!(info["total_count"], 0);
    assert_eq!(info["total_pages"], 1);
    assert_eq!(info["is_first_page"], true);
    assert_eq!(info["is_last_page"], true);
    assert_eq!(info["is_out_of_range_page"], false);
}

#[tokio::test]
async fn order_dir_desc_reverses_the_list() {
    let app = TestApp::spawn().await;
    let organizer = app.organizer_token().await;
    let ids = seed_events(&app, &organizer, 3).await;

    let res = app
        .get_with_token(
            &format!("{}?order_by=name&order_dir=desc", routes::EVENTS),
            &organizer,
        )
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    let got: Vec<i64> = res.body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["id"].as_i64().unwrap())
        .collect();
    let want: Vec<i64> = ids.iter().rev().map(|&id| id as i64).collect();
    assert_eq!(got, want);
}

#[tokio::test]
async fn invalid_page_parameters_are_rejected() {
    let app = TestApp::spawn().await;
    let organizer = app.organizer_token().await;

    let res = app
        .get_with_token(&format!("{}?per_page=0", routes::EVENTS), &organizer)
        .await;
    assert_eq!(res.status, 400);
    assert_eq!(res.field_error(), ("range", vec!["per_page"]));

    let res = app
        .get_with_token(&format!("{}?per_page=101", routes::EVENTS), &organizer)
        .await;
    assert_eq!(res.status, 400);
    assert_eq!(res.field_error(), ("range", vec!["per_page"]));

    let res = app
        .get_with_token(&format!("{}?order_by=password", routes::EVENTS), &organizer)
        .await;
    assert_eq!(res.status, 400);
    assert_eq!(res.field_error(), ("oneof", vec!["order_by"]));

    let res = app
        .get_with_token(&format!("{}?order_dir=sideways", routes::EVENTS), &organizer)
        .await;
    assert_eq!(res.status, 400);
    assert_eq!(res.field_error(), ("oneof", vec!["order_dir"]));

    let res = app
        .get_with_token(&format!("{}?page_no=abc", routes::EVENTS), &organizer)
        .await;
    assert_eq!(res.status, 400);
    assert_eq!(res.body["error_type"], "invalid_query_params");

    let res = app
        .get_with_token(&format!("{}?ids=1,x", routes::EVENTS), &organizer)
        .await;
    assert_eq!(res.status, 400);
    assert_eq!(res.body["error_type"], "invalid_query_params");
}
