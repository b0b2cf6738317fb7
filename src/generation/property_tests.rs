//! Property tests for labeled-response parsing.

use proptest::prelude::*;

use crate::generation::content::{fallback_title, parse_labeled_response};

/// Single-line field text that cannot be mistaken for a label or markup prefix.
fn field() -> impl Strategy<Value = String> {
    "[A-Za-zА-Яа-я0-9][A-Za-zА-Яа-я0-9 ,.!?-]{0,40}[A-Za-zА-Яа-я0-9.!?]"
}

proptest! {
    #[test]
    fn prop_labeled_fields_round_trip(title in field(), meta in field(), body in field()) {
        let text = format!("Заголовок: {title}\nМета-описание: {meta}\nКонтент: {body}");
        let parsed = parse_labeled_response(&text, "topic");

        prop_assert_eq!(parsed.title, title);
        prop_assert_eq!(parsed.meta_description, meta);
        prop_assert_eq!(parsed.post_content, body);
    }

    #[test]
    fn prop_body_keeps_every_line(lines in prop::collection::vec(field(), 1..6)) {
        let body = lines.join("\n");
        let text = format!("Заголовок: T\nКонтент: {body}");
        let parsed = parse_labeled_response(&text, "topic");

        prop_assert_eq!(parsed.post_content, body);
        prop_assert_eq!(parsed.meta_description, "");
    }

    #[test]
    fn prop_unlabeled_text_falls_back(text in "[a-z ]{0,60}", topic in field()) {
        let parsed = parse_labeled_response(&text, &topic);
        prop_assert_eq!(parsed.title, fallback_title(&topic));
        prop_assert!(parsed.post_content.is_empty());
    }
}
