mod common;

use axum::http::{Method, StatusCode};
use serde_json::{json, Value};

use common::{error_code, id_of, TestApp};

fn volume_ids(story: &Value) -> Vec<String> {
    story["volumes"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v["id"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn volumes_accept_a_full_permutation() {
    let app = TestApp::new();
    let admin = app.admin_token().await;
    let story = app.story(&admin, "Ordered", &["A", "B", "C"]).await;
    let story_id = id_of(&story);
    let ids = volume_ids(&story);
    let reversed: Vec<&String> = ids.iter().rev().collect();

    let (status, body) = app
        .send(
            Method::PUT,
            &format!("/api/stories/{story_id}/volumes/order"),
            Some(&admin),
            Some(json!({ "orderedIds": reversed })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["orderedIds"], json!(reversed));

    let (_, detail) = app.send(Method::GET, &format!("/api/stories/{story_id}"), None, None).await;
    let titles: Vec<&str> = detail["volumes"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, ["C", "B", "A"]);
}

#[tokio::test]
async fn volume_reorder_rejects_anything_but_a_permutation() {
    let app = TestApp::new();
    let admin = app.admin_token().await;
    let story = app.story(&admin, "Strict", &["A", "B", "C"]).await;
    let story_id = id_of(&story);
    let ids = volume_ids(&story);
    let uri = format!("/api/stories/{story_id}/volumes/order");

    for ordered in [
        json!([ids[0], ids[1]]),
        json!([ids[0], ids[1], ids[1]]),
        json!([ids[0], ids[1], ids[2], uuid::Uuid::new_v4()]),
    ] {
        let (status, body) = app
            .send(Method::PUT, &uri, Some(&admin), Some(json!({ "orderedIds": ordered })))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{ordered}");
        assert_eq!(error_code(&body), "validation_error");
    }

    let (_, detail) = app.send(Method::GET, &format!("/api/stories/{story_id}"), None, None).await;
    assert_eq!(volume_ids(&detail), ids);
}

#[tokio::test]
async fn chapters_reorder_within_their_volume() {
    let app = TestApp::new();
    let admin = app.admin_token().await;
    let story = app.story(&admin, "Chapters", &["Only"]).await;
    let story_id = id_of(&story);
    let volume_id = volume_ids(&story).remove(0);

    let one = id_of(&app.chapter(&admin, &story_id, &volume_id, "One", false).await);
    let two = id_of(&app.chapter(&admin, &story_id, &volume_id, "Two", false).await);
    let three = id_of(&app.chapter(&admin, &story_id, &volume_id, "Three", false).await);

    let uri = format!("/api/stories/{story_id}/volumes/{volume_id}/chapters/order");
    let (status, body) = app
        .send(
            Method::PUT,
            &uri,
            Some(&admin),
            Some(json!({ "orderedIds": [three, one, two] })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");

    let (_, detail) = app.send(Method::GET, &format!("/api/stories/{story_id}"), None, None).await;
    let titles: Vec<&str> = detail["volumes"][0]["chapters"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, ["Three", "One", "Two"]);

    let (_, view) = app
        .send(Method::GET, &format!("/api/stories/{story_id}/chapters/{one}"), None, None)
        .await;
    assert_eq!(view["previousChapterId"], json!(three));
    assert_eq!(view["nextChapterId"], json!(two));

    let (status, _) = app
        .send(Method::PUT, &uri, Some(&admin), Some(json!({ "orderedIds": [one, two] })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn rename_and_add_volume() {
    let app = TestApp::new();
    let admin = app.admin_token().await;
    let story = app.story(&admin, "Volumes", &[]).await;
    let story_id = id_of(&story);

    let (status, volume) = app
        .send(
            Method::POST,
            &format!("/api/stories/{story_id}/volumes"),
            Some(&admin),
            Some(json!({ "title": "Prologue" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let volume_id = id_of(&volume);

    let (status, _) = app
        .send(
            Method::PUT,
            &format!("/api/stories/{story_id}/volumes/{volume_id}"),
            Some(&admin),
            Some(json!({ "title": "Interlude" })),
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, detail) = app.send(Method::GET, &format!("/api/stories/{story_id}"), None, None).await;
    assert_eq!(detail["volumes"][0]["title"], "Interlude");

    let (status, _) = app
        .send(
            Method::PUT,
            &format!("/api/stories/{story_id}/volumes/{}", uuid::Uuid::new_v4()),
            Some(&admin),
            Some(json!({ "title": "Nowhere" })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
