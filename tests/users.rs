//! User Service Tests
//!
//! Creator listings, profile reads, and profile edits with avatar
//! replacement.

mod common;

use bytes::Bytes;
use common::{doc_list, document_path, documents_path, file_path, files_path, user_json, TestApp, USERS};
use lueur::app::media::UploadSource;
use lueur::app::users::ProfileUpdate;
use lueur::infra::cache::QueryKey;
use serde_json::{json, Value};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

// ===========================================================================
// Reads
// ===========================================================================

#[tokio::test]
async fn list_users_is_limited_and_cached() {
    let app = TestApp::spawn().await;
    Mock::given(method("GET"))
        .and(path(documents_path(USERS)))
        .and(query_param("order_by", "-created_at"))
        .and(query_param("limit", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(doc_list(vec![
            user_json("u2", "acc_2", "Bea", "bea"),
            user_json("u1", "acc_1", "Ana", "ana"),
        ])))
        .expect(1)
        .mount(&app.server)
        .await;

    let users = app.state.user_service();
    assert_eq!(users.list(Some(10)).await.unwrap().len(), 2);
    assert_eq!(users.list(Some(10)).await.unwrap().len(), 2);
    assert_eq!(app.request_count(&documents_path(USERS)).await, 1);
}

#[tokio::test]
async fn get_user_maps_missing_to_none() {
    let app = TestApp::spawn().await;
    Mock::given(method("GET"))
        .and(path(document_path(USERS, "u1")))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(user_json("u1", "acc_1", "Ana", "ana")),
        )
        .mount(&app.server)
        .await;
    Mock::given(method("GET"))
        .and(path(document_path(USERS, "ghost")))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "error": "not found" })))
        .mount(&app.server)
        .await;

    let users = app.state.user_service();
    assert_eq!(users.get("u1").await.unwrap().expect("found").username, "ana");
    assert!(users.get("ghost").await.unwrap().is_none());
}

// ===========================================================================
// Profile edits
// ===========================================================================

#[tokio::test]
async fn update_profile_writes_fields_and_invalidates_views() {
    let app = TestApp::spawn().await;
    Mock::given(method("PATCH"))
        .and(path(document_path(USERS, "u1")))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(user_json("u1", "acc_1", "Ana B", "ana")),
        )
        .expect(1)
        .mount(&app.server)
        .await;

    let cache = &app.state.cache;
    cache.put(QueryKey::CurrentUser, &json!({"stale": true}));
    cache.put(QueryKey::UserById("u1".into()), &json!({"stale": true}));

    let updated = app
        .state
        .user_service()
        .update_profile(ProfileUpdate {
            user_id: "u1".into(),
            name: "Ana B".into(),
            bio: Some("painter".into()),
            image_url: "https://cdn.test/avatars/u1.png".into(),
            image_id: None,
            file: None,
        })
        .await
        .unwrap();
    assert_eq!(updated.name, "Ana B");

    let requests = app.requests_to(&document_path(USERS, "u1")).await;
    let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["data"]["name"], "Ana B");
    assert_eq!(body["data"]["bio"], "painter");

    assert!(cache.get::<Value>(&QueryKey::CurrentUser).is_none());
    assert!(cache.get::<Value>(&QueryKey::UserById("u1".into())).is_none());
}

#[tokio::test]
async fn avatar_replacement_deletes_the_previous_file() {
    let app = TestApp::spawn().await;
    Mock::given(method("POST"))
        .and(path(files_path()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "file_av_new" })))
        .expect(1)
        .mount(&app.server)
        .await;
    Mock::given(method("PATCH"))
        .and(path(document_path(USERS, "u1")))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(user_json("u1", "acc_1", "Ana", "ana")),
        )
        .expect(1)
        .mount(&app.server)
        .await;
    Mock::given(method("DELETE"))
        .and(path(file_path("file_av_old")))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&app.server)
        .await;

    app.state
        .user_service()
        .update_profile(ProfileUpdate {
            user_id: "u1".into(),
            name: "Ana".into(),
            bio: None,
            image_url: "https://cdn.test/avatars/u1.png".into(),
            image_id: Some("file_av_old".into()),
            file: Some(UploadSource {
                filename: "me.png".into(),
                content_type: "image/png".into(),
                bytes: Bytes::from_static(b"png-bytes"),
            }),
        })
        .await
        .unwrap();

    let requests = app.requests_to(&document_path(USERS, "u1")).await;
    let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["data"]["image_id"], "file_av_new");
}
