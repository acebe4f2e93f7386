//! Mock remote quote source using Axum.
//!
//! Serves the same "posts" shape as the public placeholder endpoint so the
//! sync client can be exercised locally:
//! - GET /posts - All posts
//! - POST /posts - Create a post (assigns the next id)
//! - GET /status - Health check

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::error::{QuoteError, QuoteResult};
use crate::models::QuoteId;
use crate::sync_client::RemotePost;

#[derive(Debug, Default)]
struct Posts {
    posts: Vec<RemotePost>,
    next_id: i64,
}

/// In-memory post collection shared by the mock server and its owner
#[derive(Clone, Default)]
pub struct MockRemote {
    inner: Arc<Mutex<Posts>>,
}

#[derive(Debug, Serialize)]
struct StatusResponse {
    status: String,
    posts: usize,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

impl MockRemote {
    /// Create a mock seeded with posts; ids continue after the largest numeric id
    pub fn new(posts: Vec<RemotePost>) -> Self {
        let max_id = posts
            .iter()
            .filter_map(|p| match p.id {
                Some(QuoteId::Number(n)) => Some(n),
                _ => None,
            })
            .max()
            .unwrap_or(0);

        Self {
            inner: Arc::new(Mutex::new(Posts {
                posts,
                next_id: max_id + 1,
            })),
        }
    }

    /// Snapshot of the current posts
    pub fn posts(&self) -> Vec<RemotePost> {
        self.inner.lock().map(|p| p.posts.clone()).unwrap_or_default()
    }

    /// Change the title of a post, returning whether it existed
    pub fn set_title(&self, id: &QuoteId, title: &str) -> bool {
        let Ok(mut inner) = self.inner.lock() else {
            return false;
        };
        match inner.posts.iter_mut().find(|p| p.id.as_ref() == Some(id)) {
            Some(post) => {
                post.title = title.to_string();
                true
            }
            None => false,
        }
    }

    fn create(&self, mut post: RemotePost) -> Option<RemotePost> {
        let mut inner = self.inner.lock().ok()?;
        post.id = Some(QuoteId::Number(inner.next_id));
        inner.next_id += 1;
        inner.posts.push(post.clone());
        Some(post)
    }
}

fn lock_error() -> axum::response::Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: "Post store lock error".to_string(),
        }),
    )
        .into_response()
}

// Route handlers

async fn list_posts(State(remote): State<MockRemote>) -> impl IntoResponse {
    let posts = remote.posts();
    tracing::debug!("GET /posts -> {} posts", posts.len());
    Json(posts)
}

async fn create_post(
    State(remote): State<MockRemote>,
    Json(post): Json<RemotePost>,
) -> impl IntoResponse {
    match remote.create(post) {
        Some(created) => {
            tracing::debug!("POST /posts created {:?}", created.id);
            (StatusCode::CREATED, Json(created)).into_response()
        }
        None => lock_error(),
    }
}

async fn status(State(remote): State<MockRemote>) -> impl IntoResponse {
    Json(StatusResponse {
        status: "ok".to_string(),
        posts: remote.posts().len(),
    })
}

/// Create the mock server router
pub fn create_router(remote: MockRemote) -> Router {
    Router::new()
        .route("/posts", get(list_posts).post(create_post))
        .route("/status", get(status))
        .with_state(remote)
}

/// Handle to a running mock server
pub struct ServerHandle {
    addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl ServerHandle {
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// URL of the posts collection
    pub fn posts_url(&self) -> String {
        format!("http://{}/posts", self.addr)
    }

    /// Stop the server and wait for it to finish
    pub async fn stop(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        let _ = (&mut self.task).await;
    }
}

/// Start the mock server on `addr` (port 0 picks a free port)
pub async fn start_server(remote: MockRemote, addr: SocketAddr) -> QuoteResult<ServerHandle> {
    let router = create_router(remote);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| QuoteError::Network(e.to_string()))?;
    let addr = listener
        .local_addr()
        .map_err(|e| QuoteError::Network(e.to_string()))?;

    let (tx, rx) = oneshot::channel::<()>();

    tracing::info!("Starting mock quote server on {}", addr);

    let task = tokio::spawn(async move {
        let served = axum::serve(listener, router)
            .with_graceful_shutdown(async {
                rx.await.ok();
            })
            .await;
        if let Err(e) = served {
            tracing::error!("Mock quote server failed: {}", e);
        }
    });

    Ok(ServerHandle {
        addr,
        shutdown: Some(tx),
        task,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(id: i64, title: &str) -> RemotePost {
        RemotePost {
            id: Some(QuoteId::Number(id)),
            title: title.to_string(),
            body: None,
            user_id: Some(1),
            category: None,
        }
    }

    #[test]
    fn test_ids_continue_after_seed() {
        let remote = MockRemote::new(vec![post(1, "a"), post(7, "b")]);
        let created = remote
            .create(RemotePost {
                id: None,
                title: "c".to_string(),
                body: None,
                user_id: None,
                category: None,
            })
            .unwrap();
        assert_eq!(created.id, Some(QuoteId::Number(8)));
        assert_eq!(remote.posts().len(), 3);
    }

    #[test]
    fn test_set_title() {
        let remote = MockRemote::new(vec![post(1, "a")]);
        assert!(remote.set_title(&QuoteId::Number(1), "changed"));
        assert!(!remote.set_title(&QuoteId::Number(2), "missing"));
        assert_eq!(remote.posts()[0].title, "changed");
    }

    #[tokio::test]
    async fn test_server_round_trip() {
        let remote = MockRemote::new(vec![post(1, "hello")]);
        let server = start_server(remote, SocketAddr::from(([127, 0, 0, 1], 0)))
            .await
            .unwrap();

        let client = reqwest::Client::new();
        let posts: Vec<RemotePost> = client
            .get(server.posts_url())
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(posts, vec![post(1, "hello")]);

        let status: serde_json::Value = client
            .get(format!("http://{}/status", server.addr()))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(status["posts"], 1);

        server.stop().await;
    }
}
