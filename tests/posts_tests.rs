mod common;

use axum::http::StatusCode;
use common::{create_post, create_test_app, register, send, user_uuid};
use serde_json::json;

#[tokio::test]
async fn test_create_post_copies_author_details() {
    let (app, db) = create_test_app().await;
    let token = register(&app, "Alice", "alice@example.com", "secret1").await;

    let (status, json) = send(
        &app,
        "POST",
        "/api/posts",
        Some(&token),
        Some(json!({ "text": "Hello world" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["text"], "Hello world");
    assert_eq!(json["name"], "Alice");
    assert_eq!(json["user"], user_uuid(&db, "alice@example.com").await);
    assert!(
        json["avatar"]
            .as_str()
            .unwrap()
            .starts_with("https://www.gravatar.com/avatar/")
    );
    assert_eq!(json["likes"].as_array().unwrap().len(), 0);
    assert_eq!(json["comments"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_create_post_requires_text() {
    let (app, _db) = create_test_app().await;
    let token = register(&app, "Alice", "alice@example.com", "secret1").await;

    let (status, json) = send(
        &app,
        "POST",
        "/api/posts",
        Some(&token),
        Some(json!({ "text": "   " })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["errors"][0]["param"], "text");
    assert_eq!(json["errors"][0]["msg"], "Text is required");
}

#[tokio::test]
async fn test_list_posts_newest_first() {
    let (app, _db) = create_test_app().await;
    let token = register(&app, "Alice", "alice@example.com", "secret1").await;

    let first = create_post(&app, &token, "first").await;
    let second = create_post(&app, &token, "second").await;

    let (status, json) = send(&app, "GET", "/api/posts", Some(&token), None).await;

    assert_eq!(status, StatusCode::OK);
    let posts = json.as_array().unwrap();
    assert_eq!(posts.len(), 2);
    assert_eq!(posts[0]["id"], second);
    assert_eq!(posts[1]["id"], first);
}

#[tokio::test]
async fn test_get_post_not_found() {
    let (app, _db) = create_test_app().await;
    let token = register(&app, "Alice", "alice@example.com", "secret1").await;

    for id in ["00000000-0000-0000-0000-000000000000", "not-a-uuid"] {
        let (status, json) = send(
            &app,
            "GET",
            &format!("/api/posts/{}", id),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["msg"], "Post not found");
    }
}

#[tokio::test]
async fn test_owner_deletes_post() {
    let (app, _db) = create_test_app().await;
    let token = register(&app, "Alice", "alice@example.com", "secret1").await;
    let post_id = create_post(&app, &token, "Hello").await;
    let uri = format!("/api/posts/{}", post_id);

    let (status, json) = send(&app, "DELETE", &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["msg"], "Post removed");

    let (status, _) = send(&app, "GET", &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_missing_post_is_not_found_before_ownership() {
    let (app, _db) = create_test_app().await;
    let token = register(&app, "Alice", "alice@example.com", "secret1").await;

    let (status, json) = send(
        &app,
        "DELETE",
        "/api/posts/00000000-0000-0000-0000-000000000000",
        Some(&token),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["msg"], "Post not found");
}

#[tokio::test]
async fn test_like_and_unlike() {
    let (app, db) = create_test_app().await;
    let alice = register(&app, "Alice", "alice@example.com", "secret1").await;
    let bob = register(&app, "Bob", "bob@example.com", "secret2").await;
    let post_id = create_post(&app, &alice, "Hello").await;
    let like_uri = format!("/api/posts/like/{}", post_id);
    let unlike_uri = format!("/api/posts/unlike/{}", post_id);

    let (status, json) = send(&app, "PUT", &like_uri, Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json.as_array().unwrap().len(), 1);

    let (status, json) = send(&app, "PUT", &like_uri, Some(&bob), None).await;
    assert_eq!(status, StatusCode::OK);
    let likes = json.as_array().unwrap();
    assert_eq!(likes.len(), 2);
    assert_eq!(likes[0]["user"], user_uuid(&db, "bob@example.com").await);

    let (status, json) = send(&app, "PUT", &like_uri, Some(&alice), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["msg"], "Post already liked");

    let (status, json) = send(&app, "PUT", &unlike_uri, Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    let likes = json.as_array().unwrap();
    assert_eq!(likes.len(), 1);
    assert_eq!(likes[0]["user"], user_uuid(&db, "bob@example.com").await);

    let (status, json) = send(&app, "PUT", &unlike_uri, Some(&alice), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["msg"], "Post not yet liked");
}

#[tokio::test]
async fn test_like_missing_post() {
    let (app, _db) = create_test_app().await;
    let token = register(&app, "Alice", "alice@example.com", "secret1").await;

    let (status, json) = send(
        &app,
        "PUT",
        "/api/posts/like/00000000-0000-0000-0000-000000000000",
        Some(&token),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["msg"], "Post not found");
}

#[tokio::test]
async fn test_comments_newest_first() {
    let (app, db) = create_test_app().await;
    let alice = register(&app, "Alice", "alice@example.com", "secret1").await;
    let bob = register(&app, "Bob", "bob@example.com", "secret2").await;
    let post_id = create_post(&app, &alice, "Hello").await;
    let uri = format!("/api/posts/comment/{}", post_id);

    send(&app, "POST", &uri, Some(&alice), Some(json!({ "text": "first" }))).await;
    let (status, json) = send(
        &app,
        "POST",
        &uri,
        Some(&bob),
        Some(json!({ "text": "second" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let comments = json.as_array().unwrap();
    assert_eq!(comments.len(), 2);
    assert_eq!(comments[0]["text"], "second");
    assert_eq!(comments[0]["name"], "Bob");
    assert_eq!(comments[0]["user"], user_uuid(&db, "bob@example.com").await);
    assert_eq!(comments[1]["text"], "first");
}

#[tokio::test]
async fn test_comment_on_missing_post() {
    let (app, _db) = create_test_app().await;
    let token = register(&app, "Alice", "alice@example.com", "secret1").await;

    let (status, json) = send(
        &app,
        "POST",
        "/api/posts/comment/00000000-0000-0000-0000-000000000000",
        Some(&token),
        Some(json!({ "text": "hi" })),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["msg"], "Post not found");
}

#[tokio::test]
async fn test_delete_comment_removes_only_that_comment() {
    let (app, _db) = create_test_app().await;
    let alice = register(&app, "Alice", "alice@example.com", "secret1").await;
    let bob = register(&app, "Bob", "bob@example.com", "secret2").await;
    let post_id = create_post(&app, &alice, "Hello").await;
    let uri = format!("/api/posts/comment/{}", post_id);

    send(&app, "POST", &uri, Some(&bob), Some(json!({ "text": "bob 1" }))).await;
    send(&app, "POST", &uri, Some(&alice), Some(json!({ "text": "alice" }))).await;
    let (_, json) = send(&app, "POST", &uri, Some(&bob), Some(json!({ "text": "bob 2" }))).await;

    // Comments are newest first: bob 2, alice, bob 1
    let target = json[2]["id"].as_str().unwrap().to_string();
    assert_eq!(json[2]["text"], "bob 1");

    let (status, json) = send(
        &app,
        "DELETE",
        &format!("{}/{}", uri, target),
        Some(&bob),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let texts: Vec<&str> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["text"].as_str().unwrap())
        .collect();
    assert_eq!(texts, vec!["bob 2", "alice"]);
}

#[tokio::test]
async fn test_delete_other_users_comment_is_not_authorized() {
    let (app, _db) = create_test_app().await;
    let alice = register(&app, "Alice", "alice@example.com", "secret1").await;
    let bob = register(&app, "Bob", "bob@example.com", "secret2").await;
    let post_id = create_post(&app, &alice, "Hello").await;
    let uri = format!("/api/posts/comment/{}", post_id);

    let (_, json) = send(&app, "POST", &uri, Some(&bob), Some(json!({ "text": "bob" }))).await;
    let comment_id = json[0]["id"].as_str().unwrap().to_string();

    // The post owner is not the comment owner.
    let (status, json) = send(
        &app,
        "DELETE",
        &format!("{}/{}", uri, comment_id),
        Some(&alice),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["msg"], "User not authorized");

    let (_, json) = send(
        &app,
        "GET",
        &format!("/api/posts/{}", post_id),
        Some(&alice),
        None,
    )
    .await;
    assert_eq!(json["comments"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_delete_missing_comment() {
    let (app, _db) = create_test_app().await;
    let token = register(&app, "Alice", "alice@example.com", "secret1").await;
    let post_id = create_post(&app, &token, "Hello").await;

    let (status, json) = send(
        &app,
        "DELETE",
        &format!(
            "/api/posts/comment/{}/00000000-0000-0000-0000-000000000000",
            post_id
        ),
        Some(&token),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["msg"], "Comment not found");
}
