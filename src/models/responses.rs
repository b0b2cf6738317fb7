//! Response DTOs for the blog generator API
//!
//! Defines the structure of outgoing HTTP response bodies.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

use crate::cache::CacheStats;
use crate::generation::GeneratedPost;

/// Generic `{status, message?}` body
#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl StatusResponse {
    pub fn new(status: impl Into<String>) -> Self {
        Self {
            status: status.into(),
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Response body for `GET /topics`
///
/// Stored in the cache as-is, hence `Deserialize`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TopicsResponse {
    pub topics: Vec<String>,
}

/// Response body for `POST /generate`
#[derive(Debug, Clone, Serialize)]
pub struct PostResponse {
    pub topic: String,
    pub title: String,
    pub meta_description: String,
    pub post_content: String,
    /// Base64-encoded JPEG
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl From<&GeneratedPost> for PostResponse {
    fn from(post: &GeneratedPost) -> Self {
        Self {
            topic: post.topic.clone(),
            title: post.title.clone(),
            meta_description: post.meta_description.clone(),
            post_content: post.post_content.clone(),
            image: post.image.as_ref().map(|bytes| STANDARD.encode(bytes)),
        }
    }
}

/// Response body for `POST /auth/login`
#[derive(Debug, Clone, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    /// Lifetime in seconds
    pub expires_in: i64,
}

impl TokenResponse {
    pub fn bearer(access_token: String, expires_in: i64) -> Self {
        Self {
            access_token,
            token_type: "bearer".to_string(),
            expires_in,
        }
    }
}

/// Response body for `GET /cache/status`
#[derive(Debug, Clone, Serialize)]
pub struct CacheStatusResponse {
    pub size: usize,
    pub hits: u64,
    pub misses: u64,
    pub expirations: u64,
    /// Percentage in `0..=100`
    pub hit_rate: f64,
    pub default_ttl_seconds: u64,
}

impl CacheStatusResponse {
    pub fn new(size: usize, stats: &CacheStats, default_ttl_seconds: u64) -> Self {
        Self {
            size,
            hits: stats.hits,
            misses: stats.misses,
            expirations: stats.expirations,
            hit_rate: (stats.hit_rate() * 10_000.0).round() / 100.0,
            default_ttl_seconds,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_post_response_encodes_image() {
        let post = GeneratedPost {
            topic: "t".into(),
            title: "T".into(),
            meta_description: "M".into(),
            post_content: "C".into(),
            image: Some(b"jpeg".to_vec()),
        };
        let response = PostResponse::from(&post);
        assert_eq!(response.image.as_deref(), Some("anBlZw=="));
    }

    #[test]
    fn test_post_response_omits_missing_image() {
        let post = GeneratedPost {
            topic: "t".into(),
            title: "T".into(),
            meta_description: "M".into(),
            post_content: "C".into(),
            image: None,
        };
        let json = serde_json::to_value(PostResponse::from(&post)).unwrap();
        assert!(json.get("image").is_none());
        assert_eq!(json["title"], "T");
    }

    #[test]
    fn test_token_response() {
        let json = serde_json::to_value(TokenResponse::bearer("abc".into(), 1800)).unwrap();
        assert_eq!(json["token_type"], "bearer");
        assert_eq!(json["expires_in"], 1800);
    }

    #[test]
    fn test_status_response_skips_empty_message() {
        let json = serde_json::to_value(StatusResponse::new("active")).unwrap();
        assert_eq!(json, serde_json::json!({"status": "active"}));
    }
}
