use serde_json::json;

use crate::common::{TestApp, routes};

#[tokio::test]
async fn tags_are_public_to_read_and_admin_to_write() {
    let app = TestApp::spawn().await;

    let res = app.get_without_token(routes::TAGS).await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body.as_array().map(Vec::len), Some(0));

    let plain = app.create_authenticated_user("alice", "securepass").await;
    let res = app
        .post_with_token(routes::TAGS, &json!({"name": "minimal"}), &plain)
        .await;
    assert_eq!(res.status, 403);
    assert_eq!(res.body["code"], "PERMISSION_DENIED");
}

#[tokio::test]
async fn created_tags_are_lowercased_and_listed_alphabetically() {
    let app = TestApp::spawn().await;
    let admin = app.create_admin_user("moderator", "securepass").await;

    for name in ["Minimal", "gruvbox", "TILING"] {
        let res = app
            .post_with_token(routes::TAGS, &json!({"name": name}), &admin)
            .await;
        assert_eq!(res.status, 201, "tag {name:?}: {}", res.text);
    }

    let res = app.get_without_token(routes::TAGS).await;
    let names: Vec<&str> = res
        .body
        .as_array()
        .expect("array")
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["gruvbox", "minimal", "tiling"]);
}

#[tokio::test]
async fn duplicate_tag_names_conflict() {
    let app = TestApp::spawn().await;
    let admin = app.create_admin_user("moderator", "securepass").await;

    let res = app
        .post_with_token(routes::TAGS, &json!({"name": "minimal"}), &admin)
        .await;
    assert_eq!(res.status, 201);

    // Same name after lowercasing.
    let res = app
        .post_with_token(routes::TAGS, &json!({"name": "MINIMAL"}), &admin)
        .await;
    assert_eq!(res.status, 409);
    assert_eq!(res.body["code"], "CONFLICT");
}

#[tokio::test]
async fn tag_names_are_validated() {
    let app = TestApp::spawn().await;
    let admin = app.create_admin_user("moderator", "securepass").await;

    for name in ["x", "tag2025", "way-too dashed", "aaaaaaaaaaaaaaaaa"] {
        let res = app
            .post_with_token(routes::TAGS, &json!({"name": name}), &admin)
            .await;
        assert_eq!(res.status, 400, "tag {name:?}: {}", res.text);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }
}

#[tokio::test]
async fn tags_can_be_renamed_and_deleted() {
    let app = TestApp::spawn().await;
    let admin = app.create_admin_user("moderator", "securepass").await;

    let created = app
        .post_with_token(routes::TAGS, &json!({"name": "minimal"}), &admin)
        .await;
    assert_eq!(created.status, 201);
    let id = created.body["id"].as_i64().expect("tag id");

    let res = app
        .patch_with_token(&routes::tag(id), &json!({"name": "minimalist"}), &admin)
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["name"], "minimalist");

    let res = app.delete_with_token(&routes::tag(id), &admin).await;
    assert_eq!(res.status, 204);

    let res = app.delete_with_token(&routes::tag(id), &admin).await;
    assert_eq!(res.status, 404);

    let res = app.get_without_token(routes::TAGS).await;
    assert_eq!(res.body.as_array().map(Vec::len), Some(0));
}

#[tokio::test]
async fn renaming_to_an_existing_name_conflicts() {
    let app = TestApp::spawn().await;
    let admin = app.create_admin_user("moderator", "securepass").await;

    let first = app
        .post_with_token(routes::TAGS, &json!({"name": "minimal"}), &admin)
        .await;
    let second = app
        .post_with_token(routes::TAGS, &json!({"name": "gruvbox"}), &admin)
        .await;
    let second_id = second.body["id"].as_i64().expect("tag id");
    assert_eq!(first.status, 201);

    let res = app
        .patch_with_token(&routes::tag(second_id), &json!({"name": "minimal"}), &admin)
        .await;
    assert_eq!(res.status, 409);
    assert_eq!(res.body["code"], "CONFLICT");
}
