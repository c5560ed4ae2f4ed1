//! Feed Pager Tests
//!
//! Cursor pagination, the in-flight guard, terminal conditions, and the
//! search overlay bypass.

mod common;

use common::{doc_list, documents_path, post_json, post_run, TestApp, POSTS};
use lueur::app::feed::FetchOutcome;
use std::time::Duration;
use wiremock::matchers::{method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_page(server: &MockServer, cursor: Option<&str>, documents: Vec<serde_json::Value>) {
    let mut mock = Mock::given(method("GET")).and(path(documents_path(POSTS)));
    mock = match cursor {
        Some(cursor) => mock.and(query_param("cursor_after", cursor)),
        None => mock.and(query_param_is_missing("cursor_after")),
    };
    mock.and(query_param("order_by", "-updated_at"))
        .respond_with(ResponseTemplate::new(200).set_body_json(doc_list(documents)))
        .expect(1)
        .mount(server)
        .await;
}

// ===========================================================================
// Pagination
// ===========================================================================

#[tokio::test]
async fn twenty_posts_paginate_as_nine_nine_two() {
    let app = TestApp::spawn().await;
    mount_page(&app.server, None, post_run(1, 9)).await;
    mount_page(&app.server, Some("p9"), post_run(10, 18)).await;
    mount_page(&app.server, Some("p18"), post_run(19, 20)).await;

    let pager = app.state.feed_pager();

    assert_eq!(pager.fetch_next_page().await.unwrap(), FetchOutcome::Appended(9));
    assert!(pager.has_next_page());
    assert_eq!(pager.fetch_next_page().await.unwrap(), FetchOutcome::Appended(9));
    assert!(pager.has_next_page());
    assert_eq!(pager.fetch_next_page().await.unwrap(), FetchOutcome::Appended(2));

    // Short page ends the feed after the third call.
    assert!(!pager.has_next_page());
    assert_eq!(pager.total_loaded(), 20);

    let cursors: Vec<String> = pager
        .pages()
        .iter()
        .map(|page| page.cursor().to_string())
        .collect();
    assert_eq!(cursors, vec!["p9", "p18", "p20"]);

    // Exhausted pager never touches the backend again.
    assert_eq!(pager.fetch_next_page().await.unwrap(), FetchOutcome::Exhausted);
    assert_eq!(app.request_count(&documents_path(POSTS)).await, 3);
}

#[tokio::test]
async fn empty_feed_terminates_without_appending() {
    let app = TestApp::spawn().await;
    mount_page(&app.server, None, vec![]).await;

    let pager = app.state.feed_pager();
    assert_eq!(pager.fetch_next_page().await.unwrap(), FetchOutcome::EndReached);
    assert!(!pager.has_next_page());
    assert!(pager.pages().is_empty());
}

#[tokio::test]
async fn page_order_is_preserved_as_returned() {
    let app = TestApp::spawn().await;
    // Deliberately not sorted by id; the client must not reorder.
    let documents = vec![
        post_json("p7", "creator_1", "seven", &[]),
        post_json("p2", "creator_1", "two", &[]),
        post_json("p5", "creator_1", "five", &[]),
    ];
    mount_page(&app.server, None, documents).await;

    let pager = app.state.feed_pager();
    pager.fetch_next_page().await.unwrap();

    let ids: Vec<String> = pager.loaded_posts().iter().map(|p| p.id.clone()).collect();
    assert_eq!(ids, vec!["p7", "p2", "p5"]);
    assert_eq!(pager.pages()[0].cursor(), "p5");
}

// ===========================================================================
// In-flight guard
// ===========================================================================

#[tokio::test]
async fn concurrent_fetch_issues_single_request() {
    let app = TestApp::spawn().await;
    Mock::given(method("GET"))
        .and(path(documents_path(POSTS)))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(doc_list(post_run(1, 9)))
                .set_delay(Duration::from_millis(100)),
        )
        .expect(1)
        .mount(&app.server)
        .await;

    let pager = app.state.feed_pager();
    let (first, second) = tokio::join!(pager.fetch_next_page(), pager.fetch_next_page());

    assert_eq!(first.unwrap(), FetchOutcome::Appended(9));
    assert_eq!(second.unwrap(), FetchOutcome::AlreadyFetching);
    assert_eq!(pager.total_loaded(), 9);
    assert_eq!(app.request_count(&documents_path(POSTS)).await, 1);
}

// ===========================================================================
// Failure
// ===========================================================================

#[tokio::test]
async fn fetch_failure_keeps_loaded_pages() {
    let app = TestApp::spawn().await;
    mount_page(&app.server, None, post_run(1, 9)).await;

    let pager = app.state.feed_pager();
    assert_eq!(pager.fetch_next_page().await.unwrap(), FetchOutcome::Appended(9));

    // Second page breaks; loaded data must survive and the pager must
    // stay usable.
    let broken = Mock::given(method("GET"))
        .and(path(documents_path(POSTS)))
        .and(query_param("cursor_after", "p9"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(serde_json::json!({ "error": "backend down" })),
        )
        .mount_as_scoped(&app.server)
        .await;

    assert!(pager.fetch_next_page().await.is_err());
    assert_eq!(pager.total_loaded(), 9);
    assert!(pager.has_next_page());
    assert!(!pager.is_fetching());
    drop(broken);

    mount_page(&app.server, Some("p9"), post_run(10, 12)).await;
    assert_eq!(pager.fetch_next_page().await.unwrap(), FetchOutcome::Appended(3));
    assert_eq!(pager.total_loaded(), 12);
}

// ===========================================================================
// Search overlay
// ===========================================================================

#[tokio::test]
async fn active_search_bypasses_pagination() {
    let app = TestApp::spawn().await;
    mount_page(&app.server, None, post_run(1, 9)).await;

    let explore = app.state.explore_feed();
    explore.set_search_query("sunset");

    assert_eq!(
        explore.on_scroll_sentinel().await.unwrap(),
        FetchOutcome::SearchActive
    );
    assert_eq!(app.request_count(&documents_path(POSTS)).await, 0);

    // Clearing the query re-enables pagination.
    explore.set_search_query("");
    assert_eq!(
        explore.on_scroll_sentinel().await.unwrap(),
        FetchOutcome::Appended(9)
    );
    let ids: Vec<String> = explore.visible_posts().iter().map(|p| p.id.clone()).collect();
    assert_eq!(ids.len(), 9);
}
