#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, Response, StatusCode, header},
};
use http_body_util::BodyExt;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;
use uuid::Uuid;

use grams_api::storage::PictureStore;
use grams_api::{AppState, AppStateInner};
use grams_db::Database;
use grams_types::api::{RegisterResponse, UploadPictureResponse};

pub const PNG: &[u8] = b"\x89PNG\r\n\x1a\nnot a real image";
pub const MAX_PICTURE_BYTES: usize = 64 * 1024;

pub struct TestApp {
    pub state: AppState,
    router: Router,
    _picture_dir: TempDir,
}

pub struct TestUser {
    pub id: Uuid,
    pub token: String,
}

impl TestApp {
    pub async fn new() -> Self {
        let picture_dir = tempfile::tempdir().unwrap();
        let pictures = PictureStore::new(picture_dir.path().to_path_buf()).await.unwrap();

        let state: AppState = Arc::new(AppStateInner {
            db: Database::open_in_memory().unwrap(),
            pictures,
            jwt_secret: "test-secret".to_string(),
            token_ttl_days: 1,
            max_picture_bytes: MAX_PICTURE_BYTES,
        });

        Self {
            router: grams_api::router(state.clone()),
            state,
            _picture_dir: picture_dir,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn register(&self, username: &str) -> TestUser {
        let response = self
            .send(json_request(
                Method::POST,
                "/auth/register",
                None,
                json!({ "username": username, "password": "password123" }),
            ))
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let body: RegisterResponse = body_json(response).await;
        TestUser {
            id: body.user_id,
            token: body.token,
        }
    }

    pub async fn upload_picture(&self, user: &TestUser) -> Uuid {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/pictures")
            .header(header::AUTHORIZATION, bearer(&user.token))
            .header(header::CONTENT_TYPE, "image/png")
            .body(Body::from(PNG))
            .unwrap();

        let response = self.send(request).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let body: UploadPictureResponse = body_json(response).await;
        body.picture_id
    }

    /// Post a gram through the API and return its id.
    pub async fn create_gram(&self, user: &TestUser, message: &str) -> Uuid {
        let picture = self.upload_picture(user).await;
        let response = self
            .send(json_request(
                Method::POST,
                "/grams",
                Some(&user.token),
                json!({ "message": message, "picture": picture }),
            ))
            .await;
        assert_redirect(&response, "/");

        let newest = self.state.db.list_grams().unwrap().pop().unwrap();
        newest.id.parse().unwrap()
    }

    pub fn gram_count(&self) -> i64 {
        self.state.db.count_grams().unwrap()
    }

    pub fn stored_message(&self, gram_id: Uuid) -> Option<String> {
        self.state
            .db
            .get_gram(&gram_id.to_string())
            .unwrap()
            .map(|g| g.message)
    }

    pub fn comment_messages(&self, gram_id: Uuid) -> Vec<String> {
        self.state
            .db
            .get_comments_for_grams(&[gram_id.to_string()])
            .unwrap()
            .into_iter()
            .map(|c| c.message)
            .collect()
    }
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}

pub fn request(method: Method, uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, bearer(token));
    }
    builder.body(Body::empty()).unwrap()
}

pub fn json_request(method: Method, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, bearer(token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response.into_body().collect().await.unwrap().to_bytes().to_vec()
}

pub async fn body_json<T: DeserializeOwned>(response: Response<Body>) -> T {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

pub fn assert_redirect(response: &Response<Body>, location: &str) {
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], location);
}

pub fn assert_login_redirect(response: &Response<Body>) {
    assert_redirect(response, "/auth/login");
}
