use anyhow::{anyhow, Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::orchestrator::ContextProvider;
use crate::config::ContextConfig;
use crate::models::ContextSnippet;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchRequest<'a> {
    query: &'a str,
    top_k: usize,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<ContextSnippet>,
}

/// Client for the retrieval service behind `POST {base_url}/search`.
#[derive(Clone)]
pub struct SearchService {
    client: Client,
    config: ContextConfig,
}

impl SearchService {
    pub fn new(config: ContextConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client, config })
    }

    pub async fn search_snippets(&self, query: &str) -> Result<Vec<ContextSnippet>> {
        let url = format!("{}/search", self.config.base_url.trim_end_matches('/'));
        let request = SearchRequest {
            query,
            top_k: self.config.top_k,
        };

        let response = self
            .client
            .post(url)
            .json(&request)
            .send()
            .await
            .context("Failed to call search API")?;

        if !response.status().is_success() {
            return Err(anyhow!("Search API error: {}", response.status()));
        }

        let body: SearchResponse = response
            .json()
            .await
            .context("Failed to parse search response")?;

        let snippets = rank(body.results, self.config.top_k);
        debug!("Search returned {} snippets", snippets.len());
        Ok(snippets)
    }
}

/// Highest score first, at most `top_k`.
pub fn rank(mut snippets: Vec<ContextSnippet>, top_k: usize) -> Vec<ContextSnippet> {
    snippets.sort_by(|a, b| b.score.total_cmp(&a.score));
    snippets.truncate(top_k);
    snippets
}

#[async_trait::async_trait]
impl ContextProvider for SearchService {
    async fn search(&self, query: &str) -> Result<Vec<ContextSnippet>> {
        self.search_snippets(query).await
    }
}
