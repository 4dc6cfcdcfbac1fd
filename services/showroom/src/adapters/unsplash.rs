//! services/showroom/src/adapters/unsplash.rs
//!
//! This module contains the adapter for the Unsplash photo search API.
//! It implements the `ImageSearchService` port from the core crate.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use showroom_core::domain::{Attribution, CarImage, ImageUrls};
use showroom_core::ports::{ImageSearchService, PortError, PortResult};
use tracing::debug;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements the `ImageSearchService` port using Unsplash.
#[derive(Clone)]
pub struct UnsplashAdapter {
    client: reqwest::Client,
    base_url: String,
    access_key: String,
}

impl UnsplashAdapter {
    /// Creates a new `UnsplashAdapter`.
    pub fn new(base_url: String, access_key: String) -> PortResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| PortError::Unexpected(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url,
            access_key,
        })
    }
}

//=========================================================================================
// Unsplash Response Types
//=========================================================================================

#[derive(Deserialize)]
struct SearchResponse {
    results: Vec<Photo>,
}

#[derive(Deserialize)]
struct Photo {
    id: String,
    width: u32,
    height: u32,
    description: Option<String>,
    alt_description: Option<String>,
    urls: PhotoUrls,
    user: Photographer,
}

#[derive(Deserialize)]
struct PhotoUrls {
    raw: String,
    full: String,
    regular: String,
    small: String,
    thumb: String,
}

#[derive(Deserialize)]
struct Photographer {
    name: String,
    links: Option<PhotographerLinks>,
}

#[derive(Deserialize)]
struct PhotographerLinks {
    html: Option<String>,
}

impl Photo {
    fn to_domain(self) -> CarImage {
        CarImage {
            id: self.id,
            urls: ImageUrls {
                raw: self.urls.raw,
                full: self.urls.full,
                regular: self.urls.regular,
                small: self.urls.small,
                thumb: self.urls.thumb,
            },
            width: self.width,
            height: self.height,
            description: self.description.or(self.alt_description),
            attribution: Attribution {
                author_name: self.user.name,
                author_url: self.user.links.and_then(|links| links.html),
            },
        }
    }
}

fn parse_search_response(body: &str) -> PortResult<Vec<CarImage>> {
    let response: SearchResponse = serde_json::from_str(body)
        .map_err(|e| PortError::Unexpected(format!("Failed to parse search response: {}", e)))?;
    Ok(response.results.into_iter().map(Photo::to_domain).collect())
}

//=========================================================================================
// `ImageSearchService` Trait Implementation
//=========================================================================================

#[async_trait]
impl ImageSearchService for UnsplashAdapter {
    async fn search(&self, query: &str, count: usize) -> PortResult<Vec<CarImage>> {
        let url = format!("{}/search/photos", self.base_url);
        let per_page = count.to_string();

        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("Client-ID {}", self.access_key))
            .header("Accept-Version", "v1")
            .query(&[
                ("query", query),
                ("per_page", per_page.as_str()),
                ("orientation", "landscape"),
            ])
            .send()
            .await
            .map_err(|e| PortError::Network(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(PortError::Network(format!(
                "Search request failed with status {}: {}",
                status, error_text
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| PortError::Network(format!("Failed to read response body: {}", e)))?;
        let images = parse_search_response(&body)?;
        debug!(query, count = images.len(), "Unsplash search completed");
        Ok(images)
    }
}

//=========================================================================================
// Fallback when no access key is configured
//=========================================================================================

/// Image search that always fails; the cache then serves whatever it already has.
#[derive(Clone, Copy, Default)]
pub struct DisabledImageSearch;

#[async_trait]
impl ImageSearchService for DisabledImageSearch {
    async fn search(&self, _query: &str, _count: usize) -> PortResult<Vec<CarImage>> {
        Err(PortError::Unexpected(
            "image search is not configured (set UNSPLASH_ACCESS_KEY)".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "total": 2,
        "total_pages": 1,
        "results": [
            {
                "id": "abc123",
                "width": 4000,
                "height": 2667,
                "description": null,
                "alt_description": "red sports car on a coastal road",
                "urls": {
                    "raw": "https://images.unsplash.com/photo-1?ixid=raw",
                    "full": "https://images.unsplash.com/photo-1?q=85",
                    "regular": "https://images.unsplash.com/photo-1?w=1080",
                    "small": "https://images.unsplash.com/photo-1?w=400",
                    "thumb": "https://images.unsplash.com/photo-1?w=200"
                },
                "user": {
                    "name": "Jane Doe",
                    "links": { "html": "https://unsplash.com/@jane" }
                }
            },
            {
                "id": "def456",
                "width": 3000,
                "height": 2000,
                "description": "Garage shot",
                "alt_description": null,
                "urls": {
                    "raw": "r", "full": "f", "regular": "g", "small": "s", "thumb": "t"
                },
                "user": { "name": "John Roe" }
            }
        ]
    }"#;

    #[test]
    fn parses_results_into_car_images() {
        let images = parse_search_response(SAMPLE).unwrap();
        assert_eq!(images.len(), 2);

        let first = &images[0];
        assert_eq!(first.id, "abc123");
        assert_eq!(first.width, 4000);
        assert_eq!(first.urls.small, "https://images.unsplash.com/photo-1?w=400");
        assert_eq!(
            first.description.as_deref(),
            Some("red sports car on a coastal road")
        );
        assert_eq!(
            first.attribution.author_url.as_deref(),
            Some("https://unsplash.com/@jane")
        );

        let second = &images[1];
        assert_eq!(second.description.as_deref(), Some("Garage shot"));
        assert_eq!(second.attribution.author_name, "John Roe");
        assert!(second.attribution.author_url.is_none());
    }

    #[test]
    fn malformed_body_is_an_error() {
        assert!(matches!(
            parse_search_response("<html>rate limited</html>"),
            Err(PortError::Unexpected(_))
        ));
        assert!(parse_search_response(r#"{"results": []}"#).unwrap().is_empty());
    }

    #[tokio::test]
    async fn disabled_search_always_fails() {
        let search = DisabledImageSearch;
        assert!(search.search("Porsche", 5).await.is_err());
    }
}
