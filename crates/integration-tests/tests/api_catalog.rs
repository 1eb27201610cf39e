mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;
use uuid::Uuid;

use common::{error_code, id_of, TestApp};
use services::NewChapter;

/// Creates a story whose only volume holds `published` chapters plus `drafts`.
async fn story_with_chapters(app: &TestApp, admin: &str, title: &str, published: usize, drafts: usize) -> String {
    let story = app.story(admin, title, &["Main"]).await;
    let story_id = id_of(&story);
    let volume_id: Uuid = story["volumes"][0]["id"].as_str().unwrap().parse().unwrap();
    for n in 0..published + drafts {
        app.state
            .content
            .add_chapter(
                &story_id,
                volume_id,
                NewChapter {
                    title: format!("Chapter {n}"),
                    content: String::new(),
                    is_raw: n >= published,
                },
            )
            .await
            .unwrap();
    }
    story_id
}

#[tokio::test]
async fn chapter_range_filter_counts_published_chapters_only() {
    let app = TestApp::new();
    let admin = app.admin_token().await;
    story_with_chapters(&app, &admin, "Short", 10, 0).await;
    let medium = story_with_chapters(&app, &admin, "Medium", 60, 5).await;
    story_with_chapters(&app, &admin, "Long", 300, 0).await;

    let (status, page) = app
        .send(Method::GET, "/api/stories?chapterRange=50-100", None, None)
        .await;
    assert_eq!(status, StatusCode::OK, "{page}");
    assert_eq!(page["total"], 1);
    assert_eq!(page["items"][0]["id"], json!(medium));
    assert_eq!(page["items"][0]["chapterCount"], 60);
    assert_eq!(page["items"][0]["latestChapter"]["title"], "Chapter 59");

    let (_, page) = app.send(Method::GET, "/api/stories?chapterRange=lt50", None, None).await;
    assert_eq!(page["total"], 1);
    let (_, page) = app.send(Method::GET, "/api/stories?chapterRange=200-500", None, None).await;
    assert_eq!(page["items"][0]["title"], "Long");
    let (_, page) = app.send(Method::GET, "/api/stories?chapterRange=gt1000", None, None).await;
    assert_eq!(page["total"], 0);
}

#[tokio::test]
async fn keyword_matches_aliases_and_pagination_reports_totals() {
    let app = TestApp::new();
    let admin = app.admin_token().await;
    let (status, _) = app
        .send(
            Method::POST,
            "/api/stories",
            Some(&admin),
            Some(json!({
                "title": "Trails in the Sky",
                "author": "Falcom",
                "aliases": ["Sora no Kiseki"],
                "status": "completed",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    for title in ["Alpha", "Beta", "Gamma"] {
        app.story(&admin, title, &[]).await;
    }

    let (_, page) = app.send(Method::GET, "/api/stories?keyword=KISEKI", None, None).await;
    assert_eq!(page["total"], 1);
    assert_eq!(page["items"][0]["id"], "trails-in-the-sky");

    let (_, page) = app.send(Method::GET, "/api/stories?status=completed", None, None).await;
    assert_eq!(page["total"], 1);

    let (_, page) = app
        .send(Method::GET, "/api/stories?sort=title&limit=2&page=2", None, None)
        .await;
    assert_eq!(page["total"], 4);
    assert_eq!(page["pageSize"], 2);
    let titles: Vec<&str> = page["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, ["Gamma", "Trails in the Sky"]);

    let (_, page) = app.send(Method::GET, "/api/stories?limit=500", None, None).await;
    assert_eq!(page["pageSize"], 50);
}

#[tokio::test]
async fn malformed_listing_parameters_are_rejected() {
    let app = TestApp::new();
    for query in ["limit=0", "page=0", "chapterRange=1-2", "sort=random", "status=paused", "limit=abc"] {
        let (status, body) = app
            .send(Method::GET, &format!("/api/stories?{query}"), None, None)
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{query}");
        assert_eq!(error_code(&body), "validation_error", "{query}");
    }
}

#[tokio::test]
async fn banner_lists_featured_stories_by_priority() {
    let app = TestApp::new();
    let admin = app.admin_token().await;
    for (title, priority) in [("Second", 2), ("First", 1), ("Hidden", 0)] {
        let id = id_of(&app.story(&admin, title, &[]).await);
        let featured = title != "Hidden";
        let (status, body) = app
            .send(
                Method::PUT,
                &format!("/api/stories/{id}/banner"),
                Some(&admin),
                Some(json!({ "isInBanner": featured, "bannerPriority": priority })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
    }

    let (status, banner) = app.send(Method::GET, "/api/banner", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let titles: Vec<&str> = banner
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, ["First", "Second"]);
}
