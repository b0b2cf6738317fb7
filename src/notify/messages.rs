//! Notification texts (Telegram HTML parse mode).

use serde_json::Value;

/// Escapes the characters Telegram's HTML mode treats as markup.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

pub fn post_generated(topic: &str, title: &str) -> String {
    format!(
        "🚀 Сгенерирован новый пост!\n📌 Тема: {}\n📝 Заголовок: {}",
        escape_html(topic),
        escape_html(title)
    )
}

pub fn image_caption(title: &str) -> String {
    format!("🖼️ Изображение для поста: {title}")
}

pub fn generation_failed(details: &str) -> String {
    format!("⚠️ Ошибка генерации: {}", escape_html(details))
}

pub fn image_failed(details: &str) -> String {
    format!("⚠️ Ошибка генерации изображения: {}", escape_html(details))
}

pub fn internal_error(details: &str) -> String {
    format!("⚠️ Ошибка в API: {}", escape_html(details))
}

pub fn test_message(message: &str) -> String {
    format!("🔔 {}", escape_html(message))
}

fn field(data: &Value, key: &str, fallback: &str) -> String {
    match data.get(key) {
        Some(Value::String(s)) => escape_html(s),
        Some(other) => escape_html(&other.to_string()),
        None => fallback.to_string(),
    }
}

/// Relay text for a webhook event.
pub fn webhook(event: &str, data: &Value, base_url: &str) -> String {
    match event {
        "new_generation" => format!(
            "🚀 <b>Новый пост сгенерирован!</b>\n📌 Тема: <code>{}</code>\n📝 Заголовок: {}\n🌐 Ссылка: <a href='{}/docs'>Swagger UI</a>",
            field(data, "topic", "unknown topic"),
            field(data, "title", "untitled"),
            base_url.trim_end_matches('/'),
        ),
        "health_check" => "🟢 API работает корректно!".to_string(),
        "error" => format!(
            "⚠️ <b>Ошибка в API!</b>\n{}",
            field(data, "message", "unknown error")
        ),
        other => format!("ℹ️ Событие: <code>{}</code>", escape_html(other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_post_generated_escapes() {
        let text = post_generated("a<b", "T&C");
        assert!(text.contains("a&lt;b"));
        assert!(text.contains("T&amp;C"));
    }

    #[test]
    fn test_webhook_new_generation() {
        let text = webhook(
            "new_generation",
            &json!({"topic": "Здоровое питание", "title": "Заголовок"}),
            "http://localhost:8000/",
        );
        assert!(text.contains("<code>Здоровое питание</code>"));
        assert!(text.contains("Заголовок"));
        assert!(text.contains("http://localhost:8000/docs"));
    }

    #[test]
    fn test_webhook_error_and_health() {
        let text = webhook("error", &json!({"message": "boom"}), "");
        assert!(text.ends_with("boom"));
        assert_eq!(
            webhook("health_check", &json!({}), ""),
            "🟢 API работает корректно!"
        );
    }

    #[test]
    fn test_webhook_generic_event() {
        assert_eq!(
            webhook("post_published", &json!({}), ""),
            "ℹ️ Событие: <code>post_published</code>"
        );
    }

    #[test]
    fn test_non_string_fields() {
        let text = webhook("error", &json!({"message": 42}), "");
        assert!(text.ends_with("42"));
    }
}
