//! Posts, likes and followers tables over the REST (PostgREST) endpoint.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response};
use serde_json::{json, Value};
use tracing::debug;

use sf_core::ids::{PostId, UserId};
use sf_core::ports::{
    ContentStoreError, CredentialStorePort, FollowStorePort, LikeStorePort, PostStorePort,
};
use sf_core::post::{NewPost, Post};

use super::client::{error_parts, SupabaseHttp};

const POSTS_PATH: &str = "rest/v1/posts";
const LIKES_PATH: &str = "rest/v1/likes";
const FOLLOWERS_PATH: &str = "rest/v1/followers";

/// Requests authorized as the cached user so row-level security applies.
#[derive(Clone)]
struct RestTable {
    http: SupabaseHttp,
    credentials: Arc<dyn CredentialStorePort>,
}

impl RestTable {
    async fn send(
        &self,
        method: Method,
        path: &str,
        build: impl FnOnce(RequestBuilder) -> RequestBuilder,
    ) -> Result<Response, ContentStoreError> {
        let token = self.http.user_token(self.credentials.as_ref()).await;
        let response = build(self.http.request(method, path, token.as_deref()))
            .send()
            .await
            .map_err(|e| ContentStoreError::Unavailable(e.to_string()))?;
        if response.status().is_success() {
            return Ok(response);
        }
        let (status, message) = error_parts(response).await;
        Err(classify_failure(status, message))
    }

    /// Whether any row matches `filter`.
    async fn exists(&self, table: &str, filter: &str) -> Result<bool, ContentStoreError> {
        let path = format!("{table}?{filter}&select=id&limit=1");
        let rows = rows(self.send(Method::GET, &path, |r| r).await?).await?;
        Ok(!rows.is_empty())
    }

    async fn insert(&self, table: &str, row: Value) -> Result<(), ContentStoreError> {
        self.send(Method::POST, table, |r| r.json(&row)).await?;
        Ok(())
    }

    async fn delete(&self, table: &str, filter: &str) -> Result<(), ContentStoreError> {
        self.send(Method::DELETE, &format!("{table}?{filter}"), |r| r)
            .await?;
        Ok(())
    }
}

fn classify_failure(status: u16, message: String) -> ContentStoreError {
    match status {
        401 | 403 => ContentStoreError::Forbidden(message),
        409 => ContentStoreError::AlreadyExists,
        429 | 500..=599 => ContentStoreError::Unavailable(format!("{status}: {message}")),
        _ => ContentStoreError::Rejected { status, message },
    }
}

async fn rows(response: Response) -> Result<Vec<Value>, ContentStoreError> {
    response
        .json()
        .await
        .map_err(|e| ContentStoreError::Malformed(e.to_string()))
}

fn like_filter(post_id: &PostId, user_id: &UserId) -> String {
    format!("post_id=eq.{post_id}&user_id=eq.{user_id}")
}

fn follow_filter(follower: &UserId, following: &UserId) -> String {
    format!("follower_id=eq.{follower}&following_id=eq.{following}")
}

pub struct RestPostStore {
    table: RestTable,
}

impl RestPostStore {
    pub fn new(http: SupabaseHttp, credentials: Arc<dyn CredentialStorePort>) -> Self {
        Self {
            table: RestTable { http, credentials },
        }
    }
}

#[async_trait]
impl PostStorePort for RestPostStore {
    async fn create_post(&self, post: &NewPost) -> Result<Post, ContentStoreError> {
        let response = self
            .table
            .send(Method::POST, POSTS_PATH, |r| {
                r.header("Prefer", "return=representation").json(post)
            })
            .await?;
        let row = rows(response).await?.into_iter().next().ok_or_else(|| {
            ContentStoreError::Malformed("insert returned no representation".to_string())
        })?;
        let created: Post =
            serde_json::from_value(row).map_err(|e| ContentStoreError::Malformed(e.to_string()))?;
        debug!(post_id = %created.id, "post inserted");
        Ok(created)
    }
}

pub struct RestLikeStore {
    table: RestTable,
}

impl RestLikeStore {
    pub fn new(http: SupabaseHttp, credentials: Arc<dyn CredentialStorePort>) -> Self {
        Self {
            table: RestTable { http, credentials },
        }
    }
}

#[async_trait]
impl LikeStorePort for RestLikeStore {
    async fn has_liked(&self, post_id: &PostId, user_id: &UserId) -> Result<bool, ContentStoreError> {
        self.table
            .exists(LIKES_PATH, &like_filter(post_id, user_id))
            .await
    }

    async fn add_like(&self, post_id: &PostId, user_id: &UserId) -> Result<(), ContentStoreError> {
        self.table
            .insert(LIKES_PATH, json!({ "post_id": post_id, "user_id": user_id }))
            .await
    }

    async fn remove_like(
        &self,
        post_id: &PostId,
        user_id: &UserId,
    ) -> Result<(), ContentStoreError> {
        self.table
            .delete(LIKES_PATH, &like_filter(post_id, user_id))
            .await
    }
}

pub struct RestFollowStore {
    table: RestTable,
}

impl RestFollowStore {
    pub fn new(http: SupabaseHttp, credentials: Arc<dyn CredentialStorePort>) -> Self {
        Self {
            table: RestTable { http, credentials },
        }
    }
}

#[async_trait]
impl FollowStorePort for RestFollowStore {
    async fn is_following(
        &self,
        follower: &UserId,
        following: &UserId,
    ) -> Result<bool, ContentStoreError> {
        self.table
            .exists(FOLLOWERS_PATH, &follow_filter(follower, following))
            .await
    }

    async fn follow(&self, follower: &UserId, following: &UserId) -> Result<(), ContentStoreError> {
        let row = json!({ "follower_id": follower, "following_id": following });
        self.table.insert(FOLLOWERS_PATH, row).await
    }

    async fn unfollow(
        &self,
        follower: &UserId,
        following: &UserId,
    ) -> Result<(), ContentStoreError> {
        self.table
            .delete(FOLLOWERS_PATH, &follow_filter(follower, following))
            .await
    }
}
