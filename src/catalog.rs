use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::cmp::Ordering;
use std::env;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::{CastEntry, Episode, Show};

pub const DEFAULT_BASE_URL: &str = "https://api.tvmaze.com";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const FEATURED_MIN_RATING: f64 = 7.0;
const FEATURED_LIMIT: usize = 12;

/// User-facing failure kinds for catalog calls. The `Display` text is what
/// gets rendered, never the raw transport error.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("The search term cannot be empty.")]
    InvalidInput,
    #[error("The connection took too long. Try again.")]
    Timeout,
    #[error("No internet connection. Check your connection.")]
    Offline,
    #[error("No results were found.")]
    NotFound,
    #[error("Could not reach the server. Try again later.")]
    ServerUnreachable,
}

#[async_trait]
pub trait CatalogApi: Send + Sync {
    /// Search the catalog. Rejects empty or whitespace-only queries with
    /// `InvalidInput` before anything goes on the wire.
    async fn search_shows(&self, query: &str) -> Result<Vec<Show>, CatalogError>;

    async fn show_details(&self, id: i64) -> Result<Show, CatalogError>;

    /// Cast is supplementary data: failures are logged and come back as an
    /// empty list so they never block rendering the show itself.
    async fn show_cast(&self, id: i64) -> Result<Vec<CastEntry>, CatalogError>;

    /// Same downgrade policy as `show_cast`.
    async fn show_episodes(&self, id: i64) -> Result<Vec<Episode>, CatalogError>;

    /// Well-rated shows with artwork from the first listing page, best
    /// first, at most twelve. Any failure yields an empty list.
    async fn popular_shows(&self) -> Result<Vec<Show>, CatalogError>;
}

#[derive(Debug, Clone)]
pub struct CatalogClient {
    client: Client,
    base_url: String,
}

impl CatalogClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("building HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    pub fn from_env() -> Result<Self> {
        let base = env::var("TVSHELF_API_BASE").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Self::new(base)
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(
        &self,
        endpoint: &str,
    ) -> Result<T, CatalogError> {
        let url = format!("{}{}", self.base_url, endpoint);
        debug!("Fetching {}", url);
        let res = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(classify_transport)?;
        let status = res.status();
        if status == StatusCode::NOT_FOUND {
            return Err(CatalogError::NotFound);
        }
        if !status.is_success() {
            warn!("Catalog returned {} for {}", status, url);
            return Err(CatalogError::ServerUnreachable);
        }
        res.json::<T>().await.map_err(classify_transport)
    }
}

#[async_trait]
impl CatalogApi for CatalogClient {
    async fn search_shows(&self, query: &str) -> Result<Vec<Show>, CatalogError> {
        #[derive(Deserialize)]
        struct SearchHit {
            show: Show,
        }

        let trimmed = query.trim();
        if trimmed.is_empty() {
            return Err(CatalogError::InvalidInput);
        }
        let endpoint = format!("/search/shows?q={}", urlencoding::encode(trimmed));
        let hits: Vec<SearchHit> = self.get_json(&endpoint).await?;
        Ok(hits.into_iter().map(|h| h.show).collect())
    }

    async fn show_details(&self, id: i64) -> Result<Show, CatalogError> {
        self.get_json(&format!("/shows/{id}")).await
    }

    async fn show_cast(&self, id: i64) -> Result<Vec<CastEntry>, CatalogError> {
        match self.get_json(&format!("/shows/{id}/cast")).await {
            Ok(cast) => Ok(cast),
            Err(e) => {
                warn!("Could not fetch cast for show {}: {}", id, e);
                Ok(Vec::new())
            }
        }
    }

    async fn show_episodes(&self, id: i64) -> Result<Vec<Episode>, CatalogError> {
        match self.get_json(&format!("/shows/{id}/episodes")).await {
            Ok(episodes) => Ok(episodes),
            Err(e) => {
                warn!("Could not fetch episodes for show {}: {}", id, e);
                Ok(Vec::new())
            }
        }
    }

    async fn popular_shows(&self) -> Result<Vec<Show>, CatalogError> {
        match self.get_json::<Vec<Show>>("/shows?page=0").await {
            Ok(shows) => Ok(pick_featured(shows)),
            Err(e) => {
                warn!("Could not fetch the popular listing: {}", e);
                Ok(Vec::new())
            }
        }
    }
}

fn classify_transport(err: reqwest::Error) -> CatalogError {
    if err.is_timeout() {
        return CatalogError::Timeout;
    }
    if err.is_connect() {
        return CatalogError::Offline;
    }
    if err.status() == Some(StatusCode::NOT_FOUND) {
        return CatalogError::NotFound;
    }
    CatalogError::ServerUnreachable
}

/// The "popular" projection over a raw listing page: rated at least 7.0,
/// has a medium image, best rating first, capped at twelve.
pub fn pick_featured(shows: Vec<Show>) -> Vec<Show> {
    let mut picked: Vec<Show> = shows
        .into_iter()
        .filter(|s| {
            s.rating_average()
                .is_some_and(|avg| avg >= FEATURED_MIN_RATING)
                && s.medium_image().is_some()
        })
        .collect();
    picked.sort_by(|a, b| {
        let ra = a.rating_average().unwrap_or(0.0);
        let rb = b.rating_average().unwrap_or(0.0);
        rb.partial_cmp(&ra).unwrap_or(Ordering::Equal)
    });
    picked.truncate(FEATURED_LIMIT);
    picked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Rating, ShowImage};

    fn listing_show(id: i64, average: Option<f64>, with_image: bool) -> Show {
        Show {
            id,
            name: format!("Show {id}"),
            image: with_image.then(|| ShowImage {
                medium: Some(format!("https://img.example/{id}_m.jpg")),
                original: Some(format!("https://img.example/{id}.jpg")),
            }),
            rating: Some(Rating { average }),
            genres: vec![],
            status: None,
            summary: None,
            premiered: None,
            runtime: None,
            average_runtime: None,
            network: None,
            web_channel: None,
            language: None,
            official_site: None,
        }
    }

    #[test]
    fn featured_drops_unrated_low_rated_and_imageless_shows() {
        let shows = vec![
            listing_show(1, Some(8.0), true),
            listing_show(2, Some(6.9), true),
            listing_show(3, None, true),
            listing_show(4, Some(9.0), false),
            listing_show(5, Some(7.0), true),
        ];
        let featured = pick_featured(shows);
        let ids: Vec<i64> = featured.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![1, 5]);
        for show in &featured {
            assert!(show.rating_average().unwrap() >= 7.0);
            assert!(show.medium_image().is_some());
        }
    }

    #[test]
    fn featured_sorts_descending_and_caps_at_twelve() {
        let shows: Vec<Show> = (0..20)
            .map(|i| listing_show(i, Some(7.0 + (i as f64) / 10.0), true))
            .collect();
        let featured = pick_featured(shows);
        assert_eq!(featured.len(), 12);
        let ratings: Vec<f64> = featured
            .iter()
            .map(|s| s.rating_average().unwrap())
            .collect();
        for pair in ratings.windows(2) {
            assert!(pair[0] >= pair[1], "not sorted descending: {ratings:?}");
        }
        assert_eq!(featured[0].id, 19);
    }

    #[tokio::test]
    async fn blank_searches_fail_fast_without_touching_the_network() {
        // Nothing listens on this port; a request attempt would surface as
        // Offline rather than InvalidInput.
        let client = CatalogClient::new("http://127.0.0.1:9").unwrap();
        for query in ["", "   ", "\t\n"] {
            let err = client.search_shows(query).await.unwrap_err();
            assert!(matches!(err, CatalogError::InvalidInput), "query {query:?}");
        }
    }
}
