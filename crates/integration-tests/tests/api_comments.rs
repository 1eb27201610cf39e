mod common;

use axum::http::{Method, StatusCode};
use serde_json::{json, Value};

use common::{error_code, id_of, TestApp};

struct Thread {
    app: TestApp,
    admin: String,
    reader: String,
    story_id: String,
    chapter_id: String,
}

impl Thread {
    async fn new() -> Self {
        let app = TestApp::new();
        let admin = app.admin_token().await;
        let reader = app.reader_token("reader").await;
        let story = app.story(&admin, "Talkative", &["V1"]).await;
        let story_id = id_of(&story);
        let volume_id = story["volumes"][0]["id"].as_str().unwrap().to_string();
        let chapter_id = id_of(&app.chapter(&admin, &story_id, &volume_id, "Ch", false).await);
        Self {
            app,
            admin,
            reader,
            story_id,
            chapter_id,
        }
    }

    fn uri(&self) -> String {
        self.uri_for(&self.chapter_id)
    }

    fn uri_for(&self, chapter_id: &str) -> String {
        format!("/api/stories/{}/chapters/{chapter_id}/comments", self.story_id)
    }

    /// Another published chapter in the same volume.
    async fn sibling_chapter(&self, title: &str) -> String {
        let (_, detail) = self
            .app
            .send(Method::GET, &format!("/api/stories/{}", self.story_id), None, None)
            .await;
        let volume_id = detail["volumes"][0]["id"].as_str().unwrap().to_string();
        id_of(&self.app.chapter(&self.admin, &self.story_id, &volume_id, title, false).await)
    }

    async fn post(&self, content: &str, parent: Option<&str>) -> (StatusCode, Value) {
        self.post_to(&self.chapter_id, content, parent).await
    }

    async fn post_to(&self, chapter_id: &str, content: &str, parent: Option<&str>) -> (StatusCode, Value) {
        self.app
            .send(
                Method::POST,
                &self.uri_for(chapter_id),
                Some(&self.reader),
                Some(json!({ "content": content, "parentId": parent })),
            )
            .await
    }

    async fn delete(&self, comment_id: &str) -> (StatusCode, Value) {
        self.app
            .send(Method::DELETE, &format!("/api/comments/{comment_id}"), Some(&self.admin), None)
            .await
    }

    async fn total(&self, chapter_id: &str) -> Value {
        let (status, listing) = self.app.send(Method::GET, &self.uri_for(chapter_id), None, None).await;
        assert_eq!(status, StatusCode::OK, "{listing}");
        listing["total"].clone()
    }

    async fn comment(&self, content: &str, parent: Option<&str>) -> String {
        let (status, body) = self.post(content, parent).await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        id_of(&body)
    }
}

#[tokio::test]
async fn deleting_a_comment_removes_its_replies() {
    let thread = Thread::new().await;
    let a = thread.comment("A", None).await;
    let b = thread.comment("B", Some(&a)).await;
    thread.comment("C", Some(&b)).await;
    thread.comment("D", None).await;

    let (status, listing) = thread.app.send(Method::GET, &thread.uri(), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listing["total"], 4);
    assert_eq!(listing["comments"].as_array().unwrap().len(), 2);
    let root_a = listing["comments"]
        .as_array()
        .unwrap()
        .iter()
        .find(|c| c["id"] == json!(a))
        .unwrap();
    assert_eq!(root_a["replies"][0]["content"], "B");
    assert_eq!(root_a["replies"][0]["replies"][0]["content"], "C");

    let (status, body) = thread
        .app
        .send(Method::DELETE, &format!("/api/comments/{b}"), Some(&thread.admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "deleted": 2 }));

    let (_, listing) = thread.app.send(Method::GET, &thread.uri(), None, None).await;
    assert_eq!(listing["total"], 2);
    let contents: Vec<&str> = listing["comments"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["content"].as_str().unwrap())
        .collect();
    assert!(contents.contains(&"A") && contents.contains(&"D"));

    let (status, _) = thread
        .app
        .send(Method::DELETE, &format!("/api/comments/{b}"), Some(&thread.admin), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn comments_need_content_and_a_local_parent() {
    let thread = Thread::new().await;

    let (status, body) = thread.post("   ", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), "validation_error");

    let (status, _) = thread.post(&"x".repeat(5_001), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let other_chapter = thread.sibling_chapter("Other").await;
    let (status, elsewhere) = thread.post_to(&other_chapter, "elsewhere", None).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = thread.post("cross-chapter reply", Some(&id_of(&elsewhere))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), "validation_error");
}

#[tokio::test]
async fn commenting_requires_a_session_and_deleting_requires_admin() {
    let thread = Thread::new().await;

    let (status, body) = thread
        .app
        .send(Method::POST, &thread.uri(), None, Some(json!({ "content": "anon" })))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(error_code(&body), "unauthorized");

    let id = thread.comment("mine", None).await;
    let (status, body) = thread
        .app
        .send(Method::DELETE, &format!("/api/comments/{id}"), Some(&thread.reader), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(error_code(&body), "forbidden");

    let (status, _) = thread
        .app
        .send(
            Method::GET,
            &format!("/api/stories/{}/chapters/{}/comments", thread.story_id, uuid::Uuid::new_v4()),
            None,
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn deleting_a_root_clears_its_whole_chain() {
    let thread = Thread::new().await;
    let a = thread.comment("A", None).await;
    let b = thread.comment("B", Some(&a)).await;
    thread.comment("C", Some(&b)).await;

    let (status, body) = thread.delete(&a).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "deleted": 3 }));

    let (_, listing) = thread.app.send(Method::GET, &thread.uri(), None, None).await;
    assert_eq!(listing["total"], 0);
    assert_eq!(listing["comments"], json!([]));
    assert_eq!(thread.app.store.comment_count(), 0);
}

#[tokio::test]
async fn cascade_stays_inside_its_chapter() {
    let thread = Thread::new().await;
    let other = thread.sibling_chapter("Neighbour").await;
    let a = thread.comment("A", None).await;
    thread.comment("B", Some(&a)).await;

    let (status, x) = thread.post_to(&other, "X", None).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = thread.post_to(&other, "Y", Some(&id_of(&x))).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = thread.delete(&a).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "deleted": 2 }));
    assert_eq!(thread.total(&thread.chapter_id).await, 0);
    assert_eq!(thread.total(&other).await, 2);
}

#[tokio::test]
async fn replies_stop_nesting_at_the_depth_cap() {
    let thread = Thread::new().await;
    let mut parent = thread.comment("root", None).await;
    for level in 1..=domains::comment_tree::MAX_REPLY_DEPTH {
        parent = thread.comment(&format!("level {level}"), Some(&parent)).await;
    }

    let (status, body) = thread.post("one too deep", Some(&parent)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), "validation_error");

    let (_, listing) = thread.app.send(Method::GET, &thread.uri(), None, None).await;
    assert_eq!(listing["total"], domains::comment_tree::MAX_REPLY_DEPTH + 1);
    let mut node = &listing["comments"][0];
    let mut depth = 0;
    while let Some(next) = node["replies"].as_array().and_then(|r| r.first()) {
        node = next;
        depth += 1;
    }
    assert_eq!(depth, domains::comment_tree::MAX_REPLY_DEPTH);
}
