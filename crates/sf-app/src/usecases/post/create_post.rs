use std::sync::Arc;

use tracing::{info, info_span, Instrument};

use sf_core::media::{ImageUpload, UploadValidationError, MAX_POST_UPLOAD_BYTES};
use sf_core::post::{NewPost, Post, POSTS_BUCKET};
use sf_core::ports::{ClockPort, ContentStoreError, ObjectStoragePort, PostStorePort, StorageError};

use crate::diagnostics::DiagnosticLog;
use crate::retry::{retry_with_backoff, RetryPolicy};
use crate::usecases::session_guard::GuardHandle;

const LOG_CONTEXT: &str = "create_post";

#[derive(Debug, thiserror::Error)]
pub enum CreatePostError {
    #[error(transparent)]
    Validation(#[from] UploadValidationError),
    #[error("auth: Authentication required")]
    NotAuthenticated,
    #[error("post media upload failed: {0}")]
    Storage(#[from] StorageError),
    #[error("failed to create post: {0}")]
    Store(#[from] ContentStoreError),
}

/// Use case for publishing an image post.
///
/// The media goes to the posts bucket first; the row is only inserted once the
/// upload succeeded, so a failed insert leaves an orphaned object, never a
/// post pointing at nothing.
pub struct CreatePost {
    storage: Arc<dyn ObjectStoragePort>,
    posts: Arc<dyn PostStorePort>,
    clock: Arc<dyn ClockPort>,
    guard: GuardHandle,
    retry: RetryPolicy,
}

impl CreatePost {
    pub fn new(
        storage: Arc<dyn ObjectStoragePort>,
        posts: Arc<dyn PostStorePort>,
        clock: Arc<dyn ClockPort>,
        guard: GuardHandle,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            storage,
            posts,
            clock,
            guard,
            retry,
        }
    }

    pub async fn execute(
        &self,
        content_type: &str,
        bytes: Vec<u8>,
        caption: &str,
    ) -> Result<Post, CreatePostError> {
        let image = ImageUpload::with_limit(content_type, bytes, MAX_POST_UPLOAD_BYTES)?;
        let user = self
            .guard
            .snapshot()
            .user
            .ok_or(CreatePostError::NotAuthenticated)?;

        let timestamp = self.clock.now_ms();
        let path = format!("{}/{}.{}", user.id, timestamp, image.extension());
        let span = info_span!("usecase.create_post.execute", user_id = %user.id, %path, size = image.len());

        async {
            retry_with_backoff(&self.retry, || {
                self.storage.upload(
                    POSTS_BUCKET,
                    &path,
                    image.bytes().to_vec(),
                    image.content_type(),
                    true,
                )
            })
            .await
            .inspect_err(|err| {
                DiagnosticLog::global().error("Post media upload failed", Some(err), Some(LOG_CONTEXT))
            })?;

            let content_url = self.storage.public_url(POSTS_BUCKET, &path);
            let new_post = NewPost::new(user.id.clone(), content_url, caption, self.clock.now());

            let post = retry_with_backoff(&self.retry, || self.posts.create_post(&new_post))
                .await
                .inspect_err(|err| {
                    DiagnosticLog::global().error("Error creating post", Some(err), Some(LOG_CONTEXT))
                })?;

            info!(post_id = %post.id, hashtags = new_post.hashtags.len(), "post created");
            DiagnosticLog::global().info("Post created successfully", Some(LOG_CONTEXT));
            Ok(post)
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use chrono::{DateTime, TimeZone, Utc};
    use mockall::mock;
    use sf_core::auth::UserIdentity;
    use sf_core::guard::GuardSnapshot;
    use sf_core::ids::PostId;

    mock! {
        Storage {}

        #[async_trait]
        impl ObjectStoragePort for Storage {
            async fn upload(
                &self,
                bucket: &str,
                path: &str,
                bytes: Vec<u8>,
                content_type: &str,
                upsert: bool,
            ) -> Result<(), StorageError>;
            fn public_url(&self, bucket: &str, path: &str) -> String;
        }
    }

    mock! {
        Posts {}

        #[async_trait]
        impl PostStorePort for Posts {
            async fn create_post(&self, post: &NewPost) -> Result<Post, ContentStoreError>;
        }
    }

    struct FixedClock;

    impl ClockPort for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            Utc.timestamp_millis_opt(1_700_000_000_000).unwrap()
        }
    }

    fn signed_in() -> GuardHandle {
        let snapshot = GuardSnapshot {
            user: Some(UserIdentity::new("user-1")),
            ..GuardSnapshot::default()
        };
        GuardHandle::detached(snapshot).0
    }

    fn use_case(storage: MockStorage, posts: MockPosts, guard: GuardHandle) -> CreatePost {
        CreatePost::new(
            Arc::new(storage),
            Arc::new(posts),
            Arc::new(FixedClock),
            guard,
            RetryPolicy::new(3, Duration::from_millis(1)).with_jitter(Duration::ZERO),
        )
    }

    fn stored(post: &NewPost) -> Post {
        Post {
            id: PostId::new("post-1"),
            user_id: post.user_id.clone(),
            content_url: post.content_url.clone(),
            caption: Some(post.caption.clone()),
            hashtags: post.hashtags.clone(),
            likes_count: 0,
            created_at: Some(post.created_at),
        }
    }

    #[tokio::test]
    async fn test_execute_uploads_then_inserts_row_with_hashtags() {
        let mut storage = MockStorage::new();
        storage
            .expect_upload()
            .withf(|bucket, path, _, content_type, upsert| {
                bucket == "posts"
                    && path == "user-1/1700000000000.jpeg"
                    && content_type == "image/jpeg"
                    && *upsert
            })
            .times(1)
            .returning(|_, _, _, _, _| Ok(()));
        storage
            .expect_public_url()
            .returning(|bucket, path| format!("https://cdn.test/{bucket}/{path}"));
        let mut posts = MockPosts::new();
        posts
            .expect_create_post()
            .withf(|post| {
                post.user_id.as_str() == "user-1"
                    && post.content_url == "https://cdn.test/posts/user-1/1700000000000.jpeg"
                    && post.caption == "Golden hour #sunset #beach #sunset"
                    && post.hashtags == vec!["#sunset".to_string(), "#beach".to_string()]
            })
            .times(1)
            .returning(|post| Ok(stored(post)));

        let post = use_case(storage, posts, signed_in())
            .execute("image/jpeg", vec![1, 2, 3], "  Golden hour #sunset #beach #sunset ")
            .await
            .unwrap();

        assert_eq!(post.id.as_str(), "post-1");
    }

    #[tokio::test]
    async fn test_execute_accepts_media_between_avatar_and_post_limits() {
        let mut storage = MockStorage::new();
        storage.expect_upload().times(1).returning(|_, _, _, _, _| Ok(()));
        storage.expect_public_url().returning(|_, path| path.to_string());
        let mut posts = MockPosts::new();
        posts.expect_create_post().returning(|post| Ok(stored(post)));

        let six_mib = vec![0; 6 * 1024 * 1024];
        let result = use_case(storage, posts, signed_in())
            .execute("image/jpeg", six_mib, "")
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_execute_rejects_oversized_media_before_uploading() {
        let mut storage = MockStorage::new();
        storage.expect_upload().never();
        let posts = MockPosts::new();

        let err = use_case(storage, posts, signed_in())
            .execute("image/jpeg", vec![0; MAX_POST_UPLOAD_BYTES + 1], "big")
            .await
            .unwrap_err();

        assert!(err.to_string().contains("7MB"));
    }

    #[tokio::test]
    async fn test_execute_skips_insert_when_upload_fails() {
        let mut storage = MockStorage::new();
        storage
            .expect_upload()
            .times(1)
            .returning(|_, _, _, _, _| Err(StorageError::Unauthorized("bucket policy".into())));
        let mut posts = MockPosts::new();
        posts.expect_create_post().never();

        let err = use_case(storage, posts, signed_in())
            .execute("image/png", vec![1], "hi")
            .await
            .unwrap_err();

        assert!(matches!(err, CreatePostError::Storage(StorageError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn test_execute_retries_transient_insert_failures() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let mut storage = MockStorage::new();
        storage.expect_upload().returning(|_, _, _, _, _| Ok(()));
        storage.expect_public_url().returning(|_, path| path.to_string());
        let mut posts = MockPosts::new();
        posts.expect_create_post().returning(move |post| {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(ContentStoreError::Unavailable("503".into()))
            } else {
                Ok(stored(post))
            }
        });

        use_case(storage, posts, signed_in())
            .execute("image/gif", vec![1], "")
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_execute_requires_signed_in_user() {
        let mut storage = MockStorage::new();
        storage.expect_upload().never();
        let guard = GuardHandle::detached(GuardSnapshot::default()).0;

        let err = use_case(storage, MockPosts::new(), guard)
            .execute("image/jpeg", vec![1], "")
            .await
            .unwrap_err();

        assert!(matches!(err, CreatePostError::NotAuthenticated));
    }
}
