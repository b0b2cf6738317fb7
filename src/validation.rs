//! Input validation and sanitizing helpers.
//!
//! Validators return `Err(message)` with a human-readable reason; callers
//! attach the field name when building the HTTP error.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

pub const TOPIC_MIN_CHARS: usize = 3;
pub const TOPIC_MAX_CHARS: usize = 100;
pub const STYLE_MAX_CHARS: usize = 50;
pub const IMAGE_PROMPT_MIN_CHARS: usize = 10;
pub const IMAGE_PROMPT_MAX_CHARS: usize = 500;
pub const PASSWORD_MIN_CHARS: usize = 8;

const FORBIDDEN_TOPIC_WORDS: &[&str] = &[
    "спам", "реклама", "взлом", "хак", "взломать", "обмануть", "spam", "hack", "crack", "cheat",
    "scam", "fraud",
];

const FORBIDDEN_IMAGE_WORDS: &[&str] = &[
    "nude", "naked", "porn", "sex", "violence", "blood", "gore", "обнаженный", "насилие", "кровь",
    "порно", "секс",
];

const PASSWORD_SPECIAL_CHARS: &str = "!@#$%^&*()_+-=[]{}|;:,.<>?";

pub const WEBHOOK_EVENTS: &[&str] = &[
    "new_generation",
    "health_check",
    "error",
    "image_generated",
    "post_published",
];

static FORBIDDEN_TOPIC_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"https?://\S+",
        r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b",
        r"[<>{}\[\]]",
        r"\b\d{4,}\b",
    ]
    .iter()
    .filter_map(|p| Regex::new(p).ok())
    .collect()
});

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").expect("static regex")
});
static HTML_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]+>").expect("static regex"));
static UNSAFE_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[<>{}\[\]]").expect("static regex"));
static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("static regex"));

/// True if any character repeats five or more times in a row.
fn has_long_repeat(text: &str) -> bool {
    let mut previous = None;
    let mut run = 0;
    for c in text.chars() {
        if Some(c) == previous {
            run += 1;
            if run >= 5 {
                return true;
            }
        } else {
            previous = Some(c);
            run = 1;
        }
    }
    false
}

/// Validates a post topic and returns it trimmed.
pub fn validate_topic(topic: &str) -> Result<String, String> {
    let topic = topic.trim();
    if topic.is_empty() {
        return Err("Тема не может быть пустой".to_string());
    }

    let length = topic.chars().count();
    if length < TOPIC_MIN_CHARS {
        return Err(format!("Тема должна содержать минимум {TOPIC_MIN_CHARS} символа"));
    }
    if length > TOPIC_MAX_CHARS {
        return Err(format!("Тема не должна превышать {TOPIC_MAX_CHARS} символов"));
    }

    let lower = topic.to_lowercase();
    if let Some(word) = FORBIDDEN_TOPIC_WORDS.iter().find(|w| lower.contains(*w)) {
        return Err(format!("Тема содержит запрещенное слово: {word}"));
    }

    if FORBIDDEN_TOPIC_PATTERNS.iter().any(|re| re.is_match(topic)) {
        return Err("Тема содержит недопустимые символы или паттерны".to_string());
    }

    if has_long_repeat(topic) {
        return Err("Тема содержит слишком много повторяющихся символов".to_string());
    }

    Ok(topic.to_string())
}

/// Validates an optional style hint; blank styles collapse to `None`.
pub fn validate_style(style: Option<&str>) -> Result<Option<String>, String> {
    match style.map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) if s.chars().count() > STYLE_MAX_CHARS => Err(format!(
            "Стиль не должен превышать {STYLE_MAX_CHARS} символов"
        )),
        Some(s) => Ok(Some(s.to_string())),
    }
}

pub fn validate_image_prompt(prompt: &str) -> Result<(), String> {
    let prompt = prompt.trim();
    if prompt.is_empty() {
        return Err("Промпт не может быть пустым".to_string());
    }

    let length = prompt.chars().count();
    if length < IMAGE_PROMPT_MIN_CHARS {
        return Err(format!(
            "Промпт должен содержать минимум {IMAGE_PROMPT_MIN_CHARS} символов"
        ));
    }
    if length > IMAGE_PROMPT_MAX_CHARS {
        return Err(format!(
            "Промпт не должен превышать {IMAGE_PROMPT_MAX_CHARS} символов"
        ));
    }

    let lower = prompt.to_lowercase();
    if let Some(word) = FORBIDDEN_IMAGE_WORDS.iter().find(|w| lower.contains(*w)) {
        return Err(format!("Промпт содержит запрещенное слово: {word}"));
    }

    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), String> {
    if password.chars().count() < PASSWORD_MIN_CHARS {
        return Err(format!(
            "Password must be at least {PASSWORD_MIN_CHARS} characters long"
        ));
    }
    if !password.chars().any(|c| PASSWORD_SPECIAL_CHARS.contains(c)) {
        return Err("Password must contain at least one special character".to_string());
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err("Password must contain at least one number".to_string());
    }
    if !password.chars().any(char::is_uppercase) {
        return Err("Password must contain at least one uppercase letter".to_string());
    }
    Ok(())
}

pub fn validate_username(username: &str) -> Result<(), String> {
    let length = username.chars().count();
    if !(3..=50).contains(&length) {
        return Err("Username must be between 3 and 50 characters".to_string());
    }
    if !username
        .chars()
        .all(|c| c.is_alphanumeric() || c == '_' || c == '-' || c == '.')
    {
        return Err("Username may only contain letters, digits, '_', '-' and '.'".to_string());
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), String> {
    if EMAIL.is_match(email.trim()) {
        Ok(())
    } else {
        Err("Invalid email address".to_string())
    }
}

/// Checks the event name and the fields each event requires.
pub fn validate_webhook(event: &str, data: &Value) -> Result<(), String> {
    if !WEBHOOK_EVENTS.contains(&event) {
        return Err(format!("Неизвестное событие: {event}"));
    }

    let Some(object) = data.as_object() else {
        return Err("Данные должны быть объектом".to_string());
    };

    let required: &[&str] = match event {
        "new_generation" => &["topic", "title"],
        "error" => &["message"],
        _ => &[],
    };
    if let Some(missing) = required.iter().find(|f| !object.contains_key(**f)) {
        return Err(format!("Отсутствует обязательное поле: {missing}"));
    }

    Ok(())
}

/// Strips tags and bracket characters and collapses whitespace.
pub fn sanitize_text(text: &str) -> String {
    let text = HTML_TAG.replace_all(text, "");
    let text = UNSAFE_CHARS.replace_all(&text, "");
    let text = WHITESPACE_RUN.replace_all(&text, " ");
    text.trim().to_string()
}

/// Replaces path and shell-sensitive characters and caps the length at 255 chars.
pub fn sanitize_filename(filename: &str) -> String {
    filename
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '|' | '?' | '*' | '\\' | '/' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .take(255)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_valid_topic_is_trimmed() {
        assert_eq!(validate_topic("  Здоровое питание ").unwrap(), "Здоровое питание");
    }

    #[test]
    fn test_topic_length_counts_characters() {
        assert!(validate_topic("аб").is_err());
        assert!(validate_topic("абв").is_ok());
        assert!(validate_topic(&"я".repeat(100)).is_err()); // repeated run
        assert!(validate_topic(&"абвгд".repeat(20)).is_ok());
        assert!(validate_topic(&"абвгд".repeat(21)).is_err());
    }

    #[test]
    fn test_topic_forbidden_words_and_patterns() {
        assert!(validate_topic("Как взломать сайт").is_err());
        assert!(validate_topic("Free SPAM tips").is_err());
        assert!(validate_topic("see https://example.com").is_err());
        assert!(validate_topic("write me at a@b.com").is_err());
        assert!(validate_topic("topic <script>").is_err());
        assert!(validate_topic("Итоги 2024 года").is_err());
        assert!(validate_topic("Топ 10 книг").is_ok());
    }

    #[test]
    fn test_topic_repeated_characters() {
        assert!(validate_topic("Ураааааа").is_err());
        assert!(validate_topic("Ураааа").is_ok());
    }

    #[test]
    fn test_style() {
        assert_eq!(validate_style(None).unwrap(), None);
        assert_eq!(validate_style(Some("  ")).unwrap(), None);
        assert_eq!(
            validate_style(Some(" разговорный ")).unwrap(),
            Some("разговорный".to_string())
        );
        assert!(validate_style(Some(&"x".repeat(51))).is_err());
    }

    #[test]
    fn test_image_prompt() {
        assert!(validate_image_prompt("short").is_err());
        assert!(validate_image_prompt("A calm mountain lake at dawn").is_ok());
        assert!(validate_image_prompt("A scene full of blood and gore").is_err());
        assert!(validate_image_prompt(&"a".repeat(501)).is_err());
    }

    #[test]
    fn test_password_policy() {
        assert!(validate_password("Sh0rt!").is_err());
        assert!(validate_password("nouppercase1!").is_err());
        assert!(validate_password("NoDigits!!").is_err());
        assert!(validate_password("NoSpecial123").is_err());
        assert!(validate_password("Val1d-Password").is_ok());
    }

    #[test]
    fn test_username() {
        assert!(validate_username("ab").is_err());
        assert!(validate_username("bad name").is_err());
        assert!(validate_username("good_name-1").is_ok());
    }

    #[test]
    fn test_email() {
        assert!(validate_email("user@example.com").is_ok());
        assert!(validate_email("not-an-email").is_err());
        assert!(validate_email("a@b").is_err());
    }

    #[test]
    fn test_webhook_validation() {
        assert!(validate_webhook("health_check", &json!({})).is_ok());
        assert!(validate_webhook("unknown", &json!({})).is_err());
        assert!(validate_webhook("error", &json!([])).is_err());
        assert!(validate_webhook("error", &json!({})).is_err());
        assert!(validate_webhook("error", &json!({"message": "boom"})).is_ok());
        assert!(validate_webhook("new_generation", &json!({"topic": "t"})).is_err());
        assert!(validate_webhook("new_generation", &json!({"topic": "t", "title": "x"})).is_ok());
    }

    #[test]
    fn test_sanitize_text() {
        assert_eq!(
            sanitize_text("  <b>Hello</b>   {world}\n\tagain "),
            "Hello world again"
        );
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("a/b:c*d?.jpg"), "a_b_c_d_.jpg");
        assert_eq!(sanitize_filename(&"x".repeat(300)).len(), 255);
    }
}
