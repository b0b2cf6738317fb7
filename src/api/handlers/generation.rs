//! Post and image generation endpoints.

use axum::{
    extract::{Path, State},
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use tracing::{error, info};

use crate::api::{ApiJson, AppState};
use crate::error::{ApiError, Result};
use crate::generation::build_image_prompt;
use crate::models::{GenerateRequest, PostResponse};
use crate::notify::messages;
use crate::validation::{sanitize_filename, validate_image_prompt, validate_topic};

/// Handler for POST /generate
///
/// Text failures are a 500; a failed illustration only drops `image`.
pub async fn generate_handler(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<GenerateRequest>,
) -> Result<Json<PostResponse>> {
    let (topic, style) = req.validate()?;

    let post = match state.generator.generate_post(&topic, style.as_deref()).await {
        Ok(post) => post,
        Err(e) => {
            error!(topic = %topic, error = %e, "post generation failed");
            state.notifier.notify(messages::generation_failed(&e.to_string()));
            return Err(e.into());
        }
    };

    info!(topic = %topic, title = %post.title, has_image = post.image.is_some(), "post generated");
    state
        .notifier
        .notify(messages::post_generated(&post.topic, &post.title));
    if let Some(image) = &post.image {
        state
            .notifier
            .notify_photo(image.clone(), messages::image_caption(&post.title));
    }

    Ok(Json(PostResponse::from(&post)))
}

/// Percent-encodes everything outside the RFC 5987 attr-char set.
fn encode_ext_value(value: &str) -> String {
    value
        .bytes()
        .map(|b| match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'!' | b'#' | b'$' | b'&' | b'+' | b'-'
            | b'.' | b'^' | b'_' | b'`' | b'|' | b'~' => (b as char).to_string(),
            _ => format!("%{b:02X}"),
        })
        .collect()
}

/// `attachment` disposition with an ASCII fallback name and the UTF-8 original.
fn attachment_disposition(topic: &str) -> HeaderValue {
    let filename = format!("{}.jpg", sanitize_filename(topic));
    let ascii: String = filename
        .chars()
        .map(|c| if c.is_ascii_graphic() && c != '"' { c } else { '_' })
        .collect();
    let value = format!(
        "attachment; filename=\"{ascii}\"; filename*=UTF-8''{}",
        encode_ext_value(&filename)
    );
    HeaderValue::from_str(&value).unwrap_or_else(|_| HeaderValue::from_static("attachment"))
}

/// Handler for GET /image/:topic
///
/// Streams a captioned JPEG as an attachment.
pub async fn image_handler(
    State(state): State<AppState>,
    Path(topic): Path<String>,
) -> Result<Response> {
    let topic = validate_topic(&topic).map_err(|e| ApiError::validation("topic", e))?;
    validate_image_prompt(&build_image_prompt(&topic))
        .map_err(|e| ApiError::validation("topic", e))?;

    let jpeg = match state.generator.generate_topic_image(&topic).await {
        Ok(jpeg) => jpeg,
        Err(e) => {
            error!(topic = %topic, error = %e, "image generation failed");
            state.notifier.notify(messages::image_failed(&e.to_string()));
            return Err(e.into());
        }
    };

    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("image/jpeg")),
            (header::CONTENT_DISPOSITION, attachment_disposition(&topic)),
        ],
        jpeg,
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attachment_disposition_ascii() {
        assert_eq!(
            attachment_disposition("Travel tips"),
            "attachment; filename=\"Travel_tips.jpg\"; filename*=UTF-8''Travel%20tips.jpg"
        );
    }

    #[test]
    fn test_attachment_disposition_unicode() {
        let value = attachment_disposition("Еда");
        let text = value.to_str().unwrap();
        assert!(text.starts_with("attachment; filename=\"___.jpg\""));
        assert!(text.ends_with("filename*=UTF-8''%D0%95%D0%B4%D0%B0.jpg"));
    }
}
