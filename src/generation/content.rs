//! Blog text generation: prompt construction, retry on timeout, and parsing
//! of the labeled response.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{info, warn};

use crate::generation::provider::{CompletionRequest, ProviderError, TextProvider};

pub const TITLE_LABEL: &str = "Заголовок:";
pub const META_LABEL: &str = "Мета-описание:";
pub const CONTENT_LABEL: &str = "Контент:";

const POST_MAX_TOKENS: u32 = 3072;
const TEMPERATURE: f32 = 0.7;

// == Retry Policy ==
/// Fixed-pause retry applied to timeouts only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub pause: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            pause: Duration::from_secs(2),
        }
    }
}

// == Parsed Post ==
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParsedPost {
    pub title: String,
    pub meta_description: String,
    pub post_content: String,
    /// False when `title` is the topic-derived fallback
    #[serde(skip)]
    pub title_found: bool,
}

impl ParsedPost {
    /// Image caption: the model's title, or the bare topic when it gave none.
    pub fn caption<'a>(&'a self, topic: &'a str) -> &'a str {
        if self.title_found {
            &self.title
        } else {
            topic
        }
    }
}

/// Trims, then strips leading markdown emphasis/heading characters.
fn clean_field(raw: &str) -> String {
    raw.trim()
        .trim_start_matches(['*', '#', ' '])
        .trim()
        .to_string()
}

/// Text after the first `label`, up to the next newline.
fn line_after<'a>(text: &'a str, label: &str) -> Option<&'a str> {
    text.split_once(label)
        .map(|(_, rest)| rest.split_once('\n').map_or(rest, |(line, _)| line))
}

/// Splits a labeled completion into its fields.
///
/// Missing labels yield empty strings; the title falls back to one derived
/// from `topic`.
pub fn parse_labeled_response(text: &str, topic: &str) -> ParsedPost {
    let title = line_after(text, TITLE_LABEL).map(clean_field).unwrap_or_default();
    let meta_description = line_after(text, META_LABEL)
        .map(clean_field)
        .unwrap_or_default();
    let post_content = text
        .split_once(CONTENT_LABEL)
        .map(|(_, rest)| clean_field(rest))
        .unwrap_or_default();

    let title_found = !title.is_empty();
    ParsedPost {
        title: if title_found {
            title
        } else {
            fallback_title(topic)
        },
        meta_description,
        post_content,
        title_found,
    }
}

pub fn fallback_title(topic: &str) -> String {
    format!("Пост на тему: {topic}")
}

/// Prompt requesting a labeled SEO post.
pub fn build_post_prompt(topic: &str, style: Option<&str>) -> String {
    let mut prompt = format!(
        "Сгенерируй SEO-оптимизированный пост на тему '{topic}' со следующей структурой:\n\
         1. Цепляющий SEO-заголовок (не более 70 символов)\n\
         2. Мета-описание длиной 120-160 символов с ключевыми словами\n\
         3. Основной контент с подзаголовками H2/H3, короткими абзацами, \
         маркированными списками и практическими примерами\n"
    );
    if let Some(style) = style {
        prompt.push_str(&format!("Стиль написания: {style}\n"));
    }
    prompt.push_str(&format!(
        "\nФормат вывода:\n\
         {TITLE_LABEL} [здесь заголовок]\n\
         {META_LABEL} [здесь мета-описание]\n\
         {CONTENT_LABEL} [здесь контент]"
    ));
    prompt
}

/// Prompt for the illustration that accompanies a post.
pub fn build_image_prompt(topic: &str) -> String {
    format!(
        "High-quality illustration for a blog post about: {topic}. \
         Digital art, vibrant colors, detailed, professional, trending on artstation."
    )
}

// == Content Generator ==
#[derive(Clone)]
pub struct ContentGenerator {
    provider: Arc<dyn TextProvider>,
    retry: RetryPolicy,
}

impl std::fmt::Debug for ContentGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentGenerator")
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

impl ContentGenerator {
    pub fn new(provider: Arc<dyn TextProvider>, retry: RetryPolicy) -> Self {
        Self { provider, retry }
    }

    pub fn is_configured(&self) -> bool {
        self.provider.is_configured()
    }

    /// Calls the provider, retrying timeouts with a fixed pause.
    ///
    /// Any other failure is returned immediately; after the last timed-out
    /// attempt the timeout itself is returned.
    pub async fn complete_with_retry(
        &self,
        request: &CompletionRequest,
    ) -> Result<String, ProviderError> {
        let attempts = self.retry.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.provider.complete(request).await {
                Err(e) if e.is_timeout() && attempt < attempts => {
                    warn!(attempt, attempts, "text provider timed out, retrying");
                    tokio::time::sleep(self.retry.pause).await;
                    attempt += 1;
                }
                Err(e) => {
                    if e.is_timeout() {
                        warn!(attempts, "text provider timed out on every attempt");
                    }
                    return Err(e);
                }
                Ok(text) => return Ok(text),
            }
        }
    }

    /// Generates and parses a post for `topic`.
    pub async fn generate_post(
        &self,
        topic: &str,
        style: Option<&str>,
    ) -> Result<ParsedPost, ProviderError> {
        let request = CompletionRequest {
            prompt: build_post_prompt(topic, style),
            max_tokens: POST_MAX_TOKENS,
            temperature: TEMPERATURE,
        };

        let text = self.complete_with_retry(&request).await?;
        let post = parse_labeled_response(&text, topic);
        info!(topic, title = %post.title, "post text generated");
        Ok(post)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays scripted results and counts calls.
    struct ScriptedProvider {
        script: Mutex<VecDeque<Result<String, ProviderError>>>,
        calls: Mutex<u32>,
    }

    impl ScriptedProvider {
        fn new(script: Vec<Result<String, ProviderError>>) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script.into()),
                calls: Mutex::new(0),
            })
        }

        fn calls(&self) -> u32 {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl TextProvider for ScriptedProvider {
        async fn complete(&self, _request: &CompletionRequest) -> Result<String, ProviderError> {
            *self.calls.lock().unwrap() += 1;
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(ProviderError::Timeout { provider: "mock" }))
        }
    }

    fn timeout() -> Result<String, ProviderError> {
        Err(ProviderError::Timeout { provider: "mock" })
    }

    fn no_pause() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            pause: Duration::ZERO,
        }
    }

    #[test]
    fn test_default_retry_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.pause, Duration::from_secs(2));
    }

    #[test]
    fn test_parse_exact_fields() {
        let parsed = parse_labeled_response(
            "Заголовок: X\nМета-описание: Y\nКонтент: Z",
            "topic",
        );
        assert_eq!(
            parsed,
            ParsedPost {
                title: "X".to_string(),
                meta_description: "Y".to_string(),
                post_content: "Z".to_string(),
                title_found: true,
            }
        );
        assert_eq!(parsed.caption("topic"), "X");
    }

    #[test]
    fn test_caption_falls_back_to_topic() {
        let parsed = parse_labeled_response("Просто текст без меток", "Йога дома");
        assert!(!parsed.title_found);
        assert_eq!(parsed.title, fallback_title("Йога дома"));
        assert_eq!(parsed.caption("Йога дома"), "Йога дома");
    }

    #[test]
    fn test_parse_indented_multiline_body() {
        let text = "\n        Заголовок: Тестовый заголовок\n        Мета-описание: Тестовое описание\n        Контент: Тестовый контент поста\n## Раздел\nТекст\n        ";
        let parsed = parse_labeled_response(text, "Тестовая тема");

        assert_eq!(parsed.title, "Тестовый заголовок");
        assert_eq!(parsed.meta_description, "Тестовое описание");
        assert!(parsed.post_content.starts_with("Тестовый контент поста"));
        assert!(parsed.post_content.ends_with("Текст"));
    }

    #[test]
    fn test_parse_strips_markdown_prefix() {
        let parsed = parse_labeled_response(
            "Заголовок: **# Важное\nМета-описание: * Описание\nКонтент:\n## Body",
            "t",
        );
        assert_eq!(parsed.title, "Важное");
        assert_eq!(parsed.meta_description, "Описание");
        assert_eq!(parsed.post_content, "Body");
    }

    #[test]
    fn test_parse_missing_labels() {
        let parsed = parse_labeled_response("just some text", "Здоровое питание");
        assert_eq!(parsed.title, "Пост на тему: Здоровое питание");
        assert_eq!(parsed.meta_description, "");
        assert_eq!(parsed.post_content, "");
    }

    #[test]
    fn test_prompts() {
        let prompt = build_post_prompt("Тестовая тема", Some("разговорный"));
        assert!(prompt.contains("'Тестовая тема'"));
        assert!(prompt.contains("Стиль написания: разговорный"));
        assert!(prompt.contains(TITLE_LABEL));
        assert!(prompt.contains(META_LABEL));
        assert!(prompt.contains(CONTENT_LABEL));
        assert!(!build_post_prompt("t", None).contains("Стиль"));

        let image = build_image_prompt("Тестовая тема");
        assert!(image.contains("Тестовая тема"));
        assert!(image.starts_with("High-quality illustration"));
    }

    #[tokio::test]
    async fn test_retry_succeeds_on_third_attempt() {
        let provider = ScriptedProvider::new(vec![timeout(), timeout(), Ok("Success".into())]);
        let generator = ContentGenerator::new(provider.clone(), no_pause());

        let request = CompletionRequest {
            prompt: "p".into(),
            max_tokens: 10,
            temperature: 0.7,
        };
        assert_eq!(generator.complete_with_retry(&request).await.unwrap(), "Success");
        assert_eq!(provider.calls(), 3);
    }

    #[tokio::test]
    async fn test_three_timeouts_propagate() {
        let provider = ScriptedProvider::new(vec![timeout(), timeout(), timeout(), Ok("late".into())]);
        let generator = ContentGenerator::new(provider.clone(), no_pause());

        let err = generator.generate_post("topic", None).await.unwrap_err();
        assert!(err.is_timeout());
        assert_eq!(provider.calls(), 3);
    }

    #[tokio::test]
    async fn test_non_timeout_errors_are_not_retried() {
        let provider = ScriptedProvider::new(vec![Err(ProviderError::Http {
            provider: "mock",
            status: 401,
            body: "unauthorized".into(),
        })]);
        let generator = ContentGenerator::new(provider.clone(), no_pause());

        let err = generator.generate_post("topic", None).await.unwrap_err();
        assert!(matches!(err, ProviderError::Http { status: 401, .. }));
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_retry_pause_is_applied() {
        let provider = ScriptedProvider::new(vec![timeout(), Ok("ok".into())]);
        let generator = ContentGenerator::new(
            provider.clone(),
            RetryPolicy {
                max_attempts: 3,
                pause: Duration::from_millis(50),
            },
        );

        let started = std::time::Instant::now();
        generator.generate_post("topic", None).await.unwrap();
        assert!(started.elapsed() >= Duration::from_millis(50));
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn test_generate_post_parses_response() {
        let provider = ScriptedProvider::new(vec![Ok(
            "Заголовок: Тестовый заголовок\nМета-описание: Тестовое описание\nКонтент: Тестовый контент".into(),
        )]);
        let generator = ContentGenerator::new(provider, no_pause());

        let post = generator.generate_post("Тестовая тема", None).await.unwrap();
        assert_eq!(post.title, "Тестовый заголовок");
        assert_eq!(post.meta_description, "Тестовое описание");
        assert_eq!(post.post_content, "Тестовый контент");
    }
}
