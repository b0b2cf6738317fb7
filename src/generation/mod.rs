//! Text and image generation against external providers.

pub mod content;
pub mod deepseek;
pub mod illustration;
pub mod provider;
pub mod stability;

#[cfg(test)]
mod property_tests;

use tracing::warn;

pub use content::{
    build_image_prompt, build_post_prompt, parse_labeled_response, ContentGenerator, ParsedPost,
    RetryPolicy,
};
pub use deepseek::{DeepSeekClient, DEFAULT_DEEPSEEK_URL};
pub use illustration::{wrap_words, CaptionError, CaptionRenderer, ImageError, ImageGenerator};
pub use provider::{CompletionRequest, ImageProvider, ProviderError, TextProvider};
pub use stability::{StabilityClient, DEFAULT_STABILITY_URL};

/// A post with its optional captioned illustration (JPEG bytes).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedPost {
    pub topic: String,
    pub title: String,
    pub meta_description: String,
    pub post_content: String,
    pub image: Option<Vec<u8>>,
}

/// Combines the text and image generators into one post pipeline.
#[derive(Debug, Clone)]
pub struct BlogGenerator {
    content: ContentGenerator,
    images: ImageGenerator,
}

impl BlogGenerator {
    pub fn new(content: ContentGenerator, images: ImageGenerator) -> Self {
        Self { content, images }
    }

    pub fn content(&self) -> &ContentGenerator {
        &self.content
    }

    pub fn images(&self) -> &ImageGenerator {
        &self.images
    }

    /// Text failures abort; an image failure only drops the illustration.
    pub async fn generate_post(
        &self,
        topic: &str,
        style: Option<&str>,
    ) -> Result<GeneratedPost, ProviderError> {
        let parsed = self.content.generate_post(topic, style).await?;

        let image = match self
            .images
            .generate_with_caption(&build_image_prompt(topic), parsed.caption(topic))
            .await
        {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                warn!(topic, error = %e, "image generation failed, returning post without image");
                None
            }
        };

        Ok(GeneratedPost {
            topic: topic.to_string(),
            title: parsed.title,
            meta_description: parsed.meta_description,
            post_content: parsed.post_content,
            image,
        })
    }

    /// Captioned illustration for a bare topic.
    pub async fn generate_topic_image(&self, topic: &str) -> Result<Vec<u8>, ImageError> {
        self.images
            .generate_with_caption(&build_image_prompt(topic), topic)
            .await
    }
}
