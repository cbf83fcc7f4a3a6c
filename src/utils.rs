// src/utils.rs
use serde_json::Value;

/// Language selector for the flattened export payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    Hr,
    En,
}

impl Language {
    /// Normalize a language token. Unknown tokens fall back to English.
    pub fn parse(token: &str) -> Self {
        match token.to_lowercase().as_str() {
            "hr" | "croatian" | "hrvatski" => Language::Hr,
            _ => Language::En,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Language::Hr => "HR",
            Language::En => "EN",
        }
    }

    /// Pick the matching half of a bilingual name like "Hrvatski / Croatian".
    pub fn pick_variant<'a>(&self, name: &'a str) -> &'a str {
        let mut parts = name.split(" / ");
        match self {
            Language::Hr => parts.next().unwrap_or(name).trim(),
            Language::En => parts.last().unwrap_or(name).trim(),
        }
    }
}

/// Normalize a display name into a filename stem.
pub fn sanitize_file_stem(name: &str) -> String {
    let stem: String = name
        .trim()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect();
    let mut collapsed = String::with_capacity(stem.len());
    for c in stem.chars() {
        if c == '_' && collapsed.ends_with('_') {
            continue;
        }
        collapsed.push(c);
    }
    collapsed.trim_matches('_').to_string()
}

/// String lookup in a loose JSON map, defaulting to empty.
pub fn text_field<'a>(data: &'a serde_json::Map<String, Value>, key: &str) -> &'a str {
    data.get(key).and_then(Value::as_str).unwrap_or("")
}

/// List lookup in a loose JSON map, defaulting to empty.
pub fn list_field<'a>(data: &'a serde_json::Map<String, Value>, key: &str) -> &'a [Value] {
    data.get(key).and_then(Value::as_array).map(Vec::as_slice).unwrap_or(&[])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_parse() {
        assert_eq!(Language::parse("HR"), Language::Hr);
        assert_eq!(Language::parse("hrvatski"), Language::Hr);
        assert_eq!(Language::parse("EN"), Language::En);
        assert_eq!(Language::parse("unknown"), Language::En);
    }

    #[test]
    fn test_pick_variant() {
        assert_eq!(Language::Hr.pick_variant("Njemački / German"), "Njemački");
        assert_eq!(Language::En.pick_variant("Njemački / German"), "German");
        assert_eq!(Language::En.pick_variant("Esperanto"), "Esperanto");
    }

    #[test]
    fn test_sanitize_file_stem() {
        assert_eq!(sanitize_file_stem("Ana Horvat"), "Ana_Horvat");
        assert_eq!(sanitize_file_stem("  Ana  Horvat  "), "Ana_Horvat");
        assert_eq!(sanitize_file_stem("a@b!c"), "a_b_c");
        assert_eq!(sanitize_file_stem(""), "");
    }

    #[test]
    fn test_field_lookups() {
        let data: serde_json::Map<String, Value> = serde_json::from_str(
            r#"{"name": "Ana", "skills": ["a", "b"], "count": 3}"#,
        )
        .unwrap();
        assert_eq!(text_field(&data, "name"), "Ana");
        assert_eq!(text_field(&data, "missing"), "");
        assert_eq!(text_field(&data, "count"), "");
        assert_eq!(list_field(&data, "skills").len(), 2);
        assert!(list_field(&data, "missing").is_empty());
    }
}
