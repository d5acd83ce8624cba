//! Reddit fetch collaborator (client-credentials OAuth).

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use snoowatch_core::RedditCredentials;

use super::reddit_helpers::{
    build_search_query, mentions_any_term, thing_text, to_raw_candidate, Listing, Thing,
};
use super::retry::{check_status, RetryPolicy};
use super::CandidateSource;
use crate::error::SentimentError;
use crate::types::RawCandidate;

const DEFAULT_AUTH_BASE: &str = "https://www.reddit.com";
const DEFAULT_API_BASE: &str = "https://oauth.reddit.com";
const PAGE_LIMIT: usize = 100;
const PAGE_COUNT: usize = 2;
const MAX_PER_LISTING: usize = 200;

/// Reddit OAuth token response.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// What to search and how hard to try.
#[derive(Debug, Clone)]
pub struct RedditSettings {
    pub credentials: RedditCredentials,
    pub subreddits: Vec<String>,
    pub search_terms: Vec<String>,
    pub request_timeout_secs: u64,
    pub max_retries: u32,
    pub retry_backoff_base_ms: u64,
}

/// Pulls recent posts and comments mentioning the search terms.
#[derive(Debug)]
pub struct RedditSource {
    client: reqwest::Client,
    settings: RedditSettings,
    retry: RetryPolicy,
    auth_base: String,
    api_base: String,
}

impl RedditSource {
    /// # Errors
    ///
    /// Returns [`SentimentError::Configuration`] when no search terms are set,
    /// or [`SentimentError::Reddit`] if the HTTP client cannot be built.
    pub fn new(settings: RedditSettings) -> Result<Self, SentimentError> {
        if settings.search_terms.iter().all(|t| t.trim().is_empty()) {
            return Err(SentimentError::Configuration(
                "Reddit source needs at least one search term".to_string(),
            ));
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .user_agent(settings.credentials.user_agent.clone())
            .build()
            .map_err(|e| SentimentError::Reddit(format!("failed to build HTTP client: {e}")))?;

        let retry = RetryPolicy::new(settings.max_retries, settings.retry_backoff_base_ms);
        Ok(Self {
            client,
            settings,
            retry,
            auth_base: DEFAULT_AUTH_BASE.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
        })
    }

    /// Point the client at different hosts (used against a mock server).
    #[must_use]
    pub fn with_base_urls(mut self, auth_base: &str, api_base: &str) -> Self {
        self.auth_base = auth_base.trim_end_matches('/').to_string();
        self.api_base = api_base.trim_end_matches('/').to_string();
        self
    }

    async fn fetch_token(&self) -> Result<String, SentimentError> {
        let creds = &self.settings.credentials;
        let url = format!("{}/api/v1/access_token", self.auth_base);
        let url = url.as_str();

        let token_resp: TokenResponse = self
            .retry
            .run("token", || async move {
                let response = self
                    .client
                    .post(url)
                    .basic_auth(&creds.client_id, Some(&creds.client_secret))
                    .form(&[("grant_type", "client_credentials")])
                    .send()
                    .await?;
                check_status(response)?
                    .json::<TokenResponse>()
                    .await
                    .map_err(|e| SentimentError::Reddit(format!("token parse error: {e}")))
            })
            .await?;

        Ok(token_resp.access_token)
    }

    async fn fetch_listing(
        &self,
        token: &str,
        url: &str,
        params: &[(&str, String)],
    ) -> Result<Listing, SentimentError> {
        self.retry
            .run(url, || async move {
                let response = self
                    .client
                    .get(url)
                    .bearer_auth(token)
                    .query(params)
                    .send()
                    .await?;
                check_status(response)?
                    .json::<Listing>()
                    .await
                    .map_err(|e| SentimentError::Reddit(format!("listing parse error: {e}")))
            })
            .await
    }

    /// Walk up to [`PAGE_COUNT`] pages of a listing, keeping children that pass `keep`.
    async fn collect_pages(
        &self,
        token: &str,
        url: &str,
        base_params: &[(&str, String)],
        keep: impl Fn(&Thing) -> bool,
    ) -> Result<Vec<Thing>, SentimentError> {
        let mut after: Option<String> = None;
        let mut things = Vec::new();

        for _ in 0..PAGE_COUNT {
            let mut params = base_params.to_vec();
            params.push(("limit", PAGE_LIMIT.to_string()));
            if let Some(cursor) = &after {
                params.push(("after", cursor.clone()));
            }

            let listing = self.fetch_listing(token, url, &params).await?;
            things.extend(listing.data.children.into_iter().filter(|t| keep(t)));
            if things.len() >= MAX_PER_LISTING {
                things.truncate(MAX_PER_LISTING);
                break;
            }

            after = listing.data.after;
            if after.is_none() {
                break;
            }
        }

        Ok(things)
    }

    async fn search_posts(
        &self,
        token: &str,
        subreddit: &str,
        query: &str,
    ) -> Result<Vec<Thing>, SentimentError> {
        let url = format!("{}/r/{subreddit}/search", self.api_base);
        let params = [
            ("q", query.to_string()),
            ("restrict_sr", "true".to_string()),
            ("sort", "new".to_string()),
            ("type", "link".to_string()),
        ];
        self.collect_pages(token, &url, &params, |_| true).await
    }

    async fn recent_comments(
        &self,
        token: &str,
        subreddit: &str,
    ) -> Result<Vec<Thing>, SentimentError> {
        let url = format!("{}/r/{subreddit}/comments", self.api_base);
        let terms = &self.settings.search_terms;
        self.collect_pages(token, &url, &[], |t| {
            mentions_any_term(&thing_text(t), terms)
        })
        .await
    }
}

#[async_trait]
impl CandidateSource for RedditSource {
    /// Search every configured subreddit for posts and comments.
    ///
    /// A failing listing is logged and skipped. The fetch as a whole fails only
    /// if the token exchange fails or every listing failed.
    async fn fetch_candidates(&self) -> Result<Vec<RawCandidate>, SentimentError> {
        let token = self.fetch_token().await?;
        let query = build_search_query(&self.settings.search_terms);

        let mut candidates = Vec::new();
        let mut seen_ids = HashSet::new();
        let mut attempted = 0usize;
        let mut failed = 0usize;
        let mut last_error = None;

        for subreddit in &self.settings.subreddits {
            let listings = [
                ("posts", self.search_posts(&token, subreddit, &query).await),
                ("comments", self.recent_comments(&token, subreddit).await),
            ];
            for (listing, result) in listings {
                attempted += 1;
                match result {
                    Ok(things) => {
                        tracing::debug!(
                            subreddit = %subreddit,
                            listing,
                            count = things.len(),
                            "collected Reddit listing"
                        );
                        for thing in things {
                            // Records without a name cannot collide; keep them for validation.
                            let fresh = thing
                                .data
                                .name
                                .as_ref()
                                .is_none_or(|name| seen_ids.insert(name.clone()));
                            if fresh {
                                candidates.push(to_raw_candidate(thing));
                            }
                        }
                    }
                    Err(e) => {
                        failed += 1;
                        tracing::warn!(
                            subreddit = %subreddit,
                            listing,
                            error = %e,
                            "Reddit listing failed"
                        );
                        last_error = Some(e);
                    }
                }
            }
        }

        if attempted > 0 && failed == attempted {
            if let Some(e) = last_error {
                return Err(e);
            }
        }

        Ok(candidates)
    }
}
