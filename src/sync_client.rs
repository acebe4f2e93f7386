//! HTTP client for the remote quote source.
//!
//! The remote side is a placeholder "posts" endpoint: records come back as
//! `{id, title, body, userId}` and are mapped into quotes by taking the title
//! as text and stamping a fixed category. Posts published from here also
//! carry their `category`, which is kept when the remote echoes it back.

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::SyncConfig;
use crate::error::{QuoteError, QuoteResult};
use crate::models::{Quote, QuoteId, QuoteList};

/// User id attached to posted quotes
const POST_USER_ID: i64 = 1;

/// Record shape served by the remote endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemotePost {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<QuoteId>,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl RemotePost {
    /// Map into a quote, `None` for posts without a usable title.
    ///
    /// `default_category` is used unless the post carries its own.
    pub fn into_quote(self, default_category: &str) -> Option<Quote> {
        let text = self.title.trim();
        if text.is_empty() {
            return None;
        }
        let category = self
            .category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(default_category);
        Some(
            Quote {
                id: self.id.clone(),
                text: text.to_string(),
                category: category.to_string(),
                timestamp: None,
            }
            .stamped(),
        )
    }

    /// Outgoing payload for a local quote
    pub fn from_quote(quote: &Quote) -> Self {
        Self {
            id: None,
            title: quote.text.clone(),
            body: Some(quote.category.clone()),
            user_id: Some(POST_USER_ID),
            category: Some(quote.category.clone()),
        }
    }
}

/// Client for the remote quote source
pub struct SyncClient {
    client: Client,
    endpoint: String,
    category: String,
}

impl SyncClient {
    /// Create a new sync client
    pub fn new(config: &SyncConfig) -> QuoteResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| QuoteError::Network(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            category: config.remote_category.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Fetch the remote record set mapped into quotes
    pub async fn fetch_remote(&self) -> QuoteResult<QuoteList> {
        tracing::debug!("GET {}", self.endpoint);

        let response = self
            .client
            .get(&self.endpoint)
            .send()
            .await
            .map_err(|e| QuoteError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(QuoteError::Sync(format!(
                "Fetch failed with status {}",
                response.status()
            )));
        }

        let posts: Vec<RemotePost> = response
            .json()
            .await
            .map_err(|e| QuoteError::Sync(format!("Failed to parse remote quotes: {}", e)))?;

        let total = posts.len();
        let quotes: QuoteList = posts
            .into_iter()
            .filter_map(|post| post.into_quote(&self.category))
            .collect();

        if quotes.len() < total {
            tracing::debug!("Skipped {} remote records without a title", total - quotes.len());
        }

        Ok(quotes)
    }

    /// Publish a local quote, returning the id the remote assigned
    pub async fn post_quote(&self, quote: &Quote) -> QuoteResult<Option<QuoteId>> {
        let payload = RemotePost::from_quote(quote);

        let response = self
            .client
            .post(&self.endpoint)
            .json(&payload)
            .send()
            .await
            .map_err(|e| QuoteError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(QuoteError::Sync(format!(
                "Post failed with status {}",
                response.status()
            )));
        }

        let created: RemotePost = response
            .json()
            .await
            .map_err(|e| QuoteError::Sync(format!("Failed to parse post response: {}", e)))?;

        tracing::debug!("Remote accepted quote as {:?}", created.id);
        Ok(created.id)
    }
}
