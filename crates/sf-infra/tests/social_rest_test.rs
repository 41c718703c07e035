//! Posts, likes and followers adapters against a mock REST endpoint.

use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use mockito::{Matcher, Server};
use serde_json::json;

use sf_core::auth::{SecretString, Session, UserIdentity};
use sf_core::ids::{PostId, UserId};
use sf_core::ports::{ContentStoreError, FollowStorePort, LikeStorePort, PostStorePort};
use sf_core::post::NewPost;
use sf_infra::{
    MemoryCredentialStore, RestFollowStore, RestLikeStore, RestPostStore, SupabaseConfig,
    SupabaseHttp,
};

fn http(server: &Server) -> SupabaseHttp {
    SupabaseHttp::new(&SupabaseConfig::new(server.url(), "anon-key")).unwrap()
}

fn signed_in() -> Arc<MemoryCredentialStore> {
    Arc::new(MemoryCredentialStore::with_session(Session {
        access_token: SecretString::new("user-token"),
        refresh_token: SecretString::new("refresh"),
        expires_at: Utc::now() + Duration::hours(1),
        user: UserIdentity::new("user-1"),
    }))
}

#[tokio::test]
async fn create_post_inserts_caption_and_hashtags() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/rest/v1/posts")
        .match_header("prefer", "return=representation")
        .match_header("authorization", "Bearer user-token")
        .match_body(Matcher::PartialJson(json!({
            "user_id": "user-1",
            "content_url": "https://cdn.test/posts/user-1/1.jpeg",
            "caption": "Dusk #sky",
            "hashtags": ["#sky"]
        })))
        .with_status(201)
        .with_body(
            r##"[{"id":"post-1","user_id":"user-1","content_url":"https://cdn.test/posts/user-1/1.jpeg",
                "caption":"Dusk #sky","hashtags":["#sky"],"created_at":"2024-05-01T10:00:00Z"}]"##,
        )
        .create_async()
        .await;
    let store = RestPostStore::new(http(&server), signed_in());
    let created_at = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
    let new_post = NewPost::new(
        UserId::new("user-1"),
        "https://cdn.test/posts/user-1/1.jpeg",
        "Dusk #sky",
        created_at,
    );

    let post = store.create_post(&new_post).await.unwrap();

    mock.assert_async().await;
    assert_eq!(post.id, PostId::new("post-1"));
    assert_eq!(post.likes_count, 0);
    assert_eq!(post.created_at, Some(created_at));
}

#[tokio::test]
async fn like_lookup_insert_and_delete_address_one_pair() {
    let mut server = Server::new_async().await;
    let pair = || {
        Matcher::AllOf(vec![
            Matcher::UrlEncoded("post_id".into(), "eq.post-1".into()),
            Matcher::UrlEncoded("user_id".into(), "eq.user-1".into()),
        ])
    };
    let lookup = server
        .mock("GET", Matcher::Regex(r"^/rest/v1/likes".into()))
        .match_query(pair())
        .with_status(200)
        .with_body(r#"[{"id":"like-1"}]"#)
        .create_async()
        .await;
    let insert = server
        .mock("POST", "/rest/v1/likes")
        .match_body(Matcher::Json(json!({ "post_id": "post-1", "user_id": "user-1" })))
        .with_status(201)
        .create_async()
        .await;
    let delete = server
        .mock("DELETE", Matcher::Regex(r"^/rest/v1/likes".into()))
        .match_query(pair())
        .with_status(204)
        .create_async()
        .await;
    let store = RestLikeStore::new(http(&server), signed_in());
    let (post, user) = (PostId::new("post-1"), UserId::new("user-1"));

    assert!(store.has_liked(&post, &user).await.unwrap());
    store.add_like(&post, &user).await.unwrap();
    store.remove_like(&post, &user).await.unwrap();

    lookup.assert_async().await;
    insert.assert_async().await;
    delete.assert_async().await;
}

#[tokio::test]
async fn duplicate_follow_reports_already_exists() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/rest/v1/followers")
        .with_status(409)
        .with_body(r#"{"code":"23505","message":"duplicate key value violates unique constraint"}"#)
        .create_async()
        .await;
    let store = RestFollowStore::new(http(&server), signed_in());

    let err = store
        .follow(&UserId::new("user-1"), &UserId::new("user-2"))
        .await
        .unwrap_err();

    assert_eq!(err, ContentStoreError::AlreadyExists);
}

#[tokio::test]
async fn row_level_security_denial_is_forbidden() {
    let mut server = Server::new_async().await;
    server
        .mock("DELETE", Matcher::Regex(r"^/rest/v1/followers".into()))
        .with_status(403)
        .with_body(r#"{"message":"new row violates row-level security policy"}"#)
        .create_async()
        .await;
    let store = RestFollowStore::new(http(&server), signed_in());

    let err = store
        .unfollow(&UserId::new("user-1"), &UserId::new("user-2"))
        .await
        .unwrap_err();

    assert_eq!(
        err,
        ContentStoreError::Forbidden("new row violates row-level security policy".into())
    );
}
