mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;
use uuid::Uuid;

use grams_api::policy::BLANK_MESSAGE;
use grams_types::api::CommentDraft;

use common::{TestApp, assert_login_redirect, assert_redirect, body_json, json_request};

#[tokio::test]
async fn users_can_comment_on_grams() {
    let app = TestApp::new().await;
    let alice = app.register("alice").await;
    let bob = app.register("bob").await;
    let gram_id = app.create_gram(&alice, "Hello!").await;

    let response = app
        .send(json_request(
            Method::POST,
            &format!("/grams/{}/comments", gram_id),
            Some(&bob.token),
            json!({ "message": "cool!" }),
        ))
        .await;
    assert_redirect(&response, "/");

    assert_eq!(app.comment_messages(gram_id), vec!["cool!".to_string()]);
}

#[tokio::test]
async fn commenting_requires_login() {
    let app = TestApp::new().await;
    let alice = app.register("alice").await;
    let gram_id = app.create_gram(&alice, "Hello!").await;

    let response = app
        .send(json_request(
            Method::POST,
            &format!("/grams/{}/comments", gram_id),
            None,
            json!({ "message": "cool!" }),
        ))
        .await;
    assert_login_redirect(&response);
    assert!(app.comment_messages(gram_id).is_empty());
}

#[tokio::test]
async fn commenting_on_unknown_gram_is_not_found() {
    let app = TestApp::new().await;
    let bob = app.register("bob").await;

    for id in ["not a valid id".replace(' ', "%20"), Uuid::new_v4().to_string()] {
        let response = app
            .send(json_request(
                Method::POST,
                &format!("/grams/{}/comments", id),
                Some(&bob.token),
                json!({ "message": "cool!" }),
            ))
            .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}

#[tokio::test]
async fn commenting_on_unknown_gram_ignores_the_body() {
    let app = TestApp::new().await;
    let bob = app.register("bob").await;

    let response = app
        .send(json_request(
            Method::POST,
            &format!("/grams/{}/comments", Uuid::new_v4()),
            Some(&bob.token),
            json!({ "message": null }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn blank_comment_is_unprocessable() {
    let app = TestApp::new().await;
    let alice = app.register("alice").await;
    let gram_id = app.create_gram(&alice, "Hello!").await;

    let response = app
        .send(json_request(
            Method::POST,
            &format!("/grams/{}/comments", gram_id),
            Some(&alice.token),
            json!({ "message": "   " }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let draft: CommentDraft = body_json(response).await;
    assert_eq!(draft.gram_id, gram_id);
    assert_eq!(draft.errors, vec![BLANK_MESSAGE.to_string()]);

    assert!(app.comment_messages(gram_id).is_empty());
}
