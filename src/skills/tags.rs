//! Annotation Tag Extraction
//!
//! Skills carry a free-text annotation blob where designers write tags such as
//! `<cooldown: 120>`, `<direct>` or `<guard:[15, true]>`. This module finds
//! those tags and coerces their values.
//!
//! Rules shared by every tag:
//! - Tag names match case-insensitively; whitespace around `:` is ignored.
//! - Text is scanned line by line and the first matching line wins.
//! - Coercion failures never error: callers get their default back and a
//!   warning is logged.

use bevy::log::warn;
use regex::Regex;
use std::collections::HashMap;

/// A coerced tag value.
#[derive(Debug, Clone, PartialEq)]
pub enum TagValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    Array(Vec<TagValue>),
    Str(String),
}

impl TagValue {
    /// Coerce one array element. Order: boolean, integer, float, then string.
    fn parse_scalar(raw: &str) -> TagValue {
        if raw.eq_ignore_ascii_case("true") {
            return TagValue::Bool(true);
        }
        if raw.eq_ignore_ascii_case("false") {
            return TagValue::Bool(false);
        }
        if let Ok(i) = raw.parse::<i64>() {
            return TagValue::Int(i);
        }
        if let Ok(f) = raw.parse::<f64>() {
            return TagValue::Float(f);
        }
        TagValue::Str(raw.to_string())
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            TagValue::Int(i) => i32::try_from(*i).ok(),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            TagValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

/// Split `[a, b, c]` into coerced elements. Nested brackets are not supported.
fn parse_array(raw: &str) -> Option<Vec<TagValue>> {
    let inner = raw.strip_prefix('[')?.strip_suffix(']')?;
    if inner.contains('[') || inner.contains(']') {
        return None;
    }
    if inner.trim().is_empty() {
        return Some(Vec::new());
    }
    Some(
        inner
            .split(',')
            .map(|item| TagValue::parse_scalar(item.trim()))
            .collect(),
    )
}

/// A compiled pattern for a single tag name.
#[derive(Debug, Clone)]
pub struct TagPattern {
    name: String,
    regex: Regex,
}

impl TagPattern {
    /// Pattern for `<name: value>`.
    pub fn value(name: &str) -> Self {
        let source = format!(r"(?i)<\s*{}\s*:\s*([^>]*?)\s*>", regex::escape(name));
        Self::compile(name, &source)
    }

    /// Pattern for the bare presence tag `<name>`.
    pub fn flag(name: &str) -> Self {
        let source = format!(r"(?i)<\s*{}\s*>", regex::escape(name));
        Self::compile(name, &source)
    }

    fn compile(name: &str, source: &str) -> Self {
        // The name is escaped, so the pattern is always valid.
        let regex = Regex::new(source).unwrap_or_else(|_| unreachable!("escaped tag pattern"));
        Self {
            name: name.to_string(),
            regex,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Raw value text of the first line that carries this tag.
    ///
    /// Flag patterns return an empty string when present.
    pub fn first_match<'t>(&self, text: &'t str) -> Option<&'t str> {
        text.lines().find_map(|line| {
            let caps = self.regex.captures(line)?;
            Some(caps.get(1).map_or("", |m| m.as_str()))
        })
    }
}

/// A table of compiled tag patterns with typed, defaulting accessors.
#[derive(Debug, Clone, Default)]
pub struct TagResolver {
    patterns: HashMap<String, TagPattern>,
}

impl TagResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a resolver that knows the given value tags and flag tags.
    pub fn with_tags(value_tags: &[&str], flag_tags: &[&str]) -> Self {
        let mut resolver = Self::new();
        for name in value_tags {
            resolver.register(TagPattern::value(name));
        }
        for name in flag_tags {
            resolver.register(TagPattern::flag(name));
        }
        resolver
    }

    pub fn register(&mut self, pattern: TagPattern) {
        self.patterns.insert(pattern.name().to_ascii_lowercase(), pattern);
    }

    fn pattern(&self, tag: &str) -> Option<&TagPattern> {
        let pattern = self.patterns.get(&tag.to_ascii_lowercase());
        if pattern.is_none() {
            warn!("Tag <{}> queried but never registered", tag);
        }
        pattern
    }

    /// Raw text of the first occurrence of a value tag.
    pub fn find_raw<'t>(&self, text: &'t str, tag: &str) -> Option<&'t str> {
        self.pattern(tag)?.first_match(text)
    }

    /// Integer tag; missing tags and unparseable values yield `default`.
    pub fn int(&self, text: &str, tag: &str, default: i32) -> i32 {
        self.int_opt(text, tag).unwrap_or(default)
    }

    /// Integer tag where absence is meaningful (`None` is not `0`).
    pub fn int_opt(&self, text: &str, tag: &str) -> Option<i32> {
        let raw = self.find_raw(text, tag)?;
        match raw.trim().parse::<i32>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Tag <{}> has non-integer value {:?}, using default", tag, raw);
                None
            }
        }
    }

    /// Float tag; missing tags and unparseable values yield `default`.
    pub fn float(&self, text: &str, tag: &str, default: f32) -> f32 {
        let Some(raw) = self.find_raw(text, tag) else {
            return default;
        };
        match raw.trim().parse::<f32>() {
            Ok(value) if value.is_finite() => value,
            _ => {
                warn!("Tag <{}> has non-numeric value {:?}, using default", tag, raw);
                default
            }
        }
    }

    /// Presence tag: true iff any line carries it.
    pub fn flag(&self, text: &str, tag: &str) -> bool {
        self.pattern(tag)
            .map(|pattern| pattern.first_match(text).is_some())
            .unwrap_or(false)
    }

    /// String tag, trimmed.
    pub fn string(&self, text: &str, tag: &str) -> Option<String> {
        self.find_raw(text, tag).map(|raw| raw.trim().to_string())
    }

    /// Bracketed array tag. Malformed brackets yield `None` and a warning.
    pub fn array(&self, text: &str, tag: &str) -> Option<Vec<TagValue>> {
        let raw = self.find_raw(text, tag)?;
        let items = parse_array(raw.trim());
        if items.is_none() {
            warn!("Tag <{}> has malformed array {:?}, using default", tag, raw);
        }
        items
    }

    /// Bracketed array tag that must have exactly `arity` elements.
    pub fn tuple(&self, text: &str, tag: &str, arity: usize) -> Option<Vec<TagValue>> {
        let items = self.array(text, tag)?;
        if items.len() != arity {
            warn!(
                "Tag <{}> expects {} values but got {}, using default",
                tag,
                arity,
                items.len()
            );
            return None;
        }
        Some(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_coercion_order() {
        assert_eq!(TagValue::parse_scalar("12"), TagValue::Int(12));
        assert_eq!(TagValue::parse_scalar("-1"), TagValue::Int(-1));
        assert_eq!(TagValue::parse_scalar("1.5"), TagValue::Float(1.5));
        assert_eq!(TagValue::parse_scalar("TRUE"), TagValue::Bool(true));
        assert_eq!(TagValue::parse_scalar("rhombus"), TagValue::Str("rhombus".to_string()));
        assert_eq!(
            parse_array("[15, false]"),
            Some(vec![TagValue::Int(15), TagValue::Bool(false)])
        );
    }

    #[test]
    fn test_value_pattern_ignores_case_and_spacing() {
        let pattern = TagPattern::value("cooldown");
        assert_eq!(pattern.first_match("<CoolDown :  120 >"), Some("120"));
        assert_eq!(pattern.first_match("<cooldown:30>"), Some("30"));
        assert_eq!(pattern.first_match("<cooldowns:30>"), None);
    }

    #[test]
    fn test_flag_pattern_matches_bare_tag_only() {
        let pattern = TagPattern::flag("direct");
        assert!(pattern.first_match("<direct>").is_some());
        assert!(pattern.first_match("< Direct >").is_some());
        assert!(pattern.first_match("<direct: 1>").is_none());
    }

    #[test]
    fn test_first_line_wins() {
        let pattern = TagPattern::value("range");
        let text = "<range: 3>\n<range: 9>";
        assert_eq!(pattern.first_match(text), Some("3"));
        assert_eq!(pattern.first_match("no tag here\n<range: 9>"), Some("9"));
    }

    #[test]
    fn test_malformed_array_falls_back() {
        let resolver = TagResolver::with_tags(&["guard"], &[]);
        assert!(resolver.array("<guard:[15, true>", "guard").is_none());
        assert!(resolver.tuple("<guard:[15]>", "guard", 2).is_none());
        assert_eq!(
            resolver.tuple("<guard:[15,true]>", "guard", 2),
            Some(vec![TagValue::Int(15), TagValue::Bool(true)])
        );
    }

    #[test]
    fn test_numeric_defaults_on_garbage() {
        let resolver = TagResolver::with_tags(&["cooldown", "aggroMultiplier"], &[]);
        assert_eq!(resolver.int("<cooldown: soon>", "cooldown", 0), 0);
        assert_eq!(resolver.float("<aggroMultiplier: lots>", "aggroMultiplier", 1.0), 1.0);
        assert_eq!(resolver.float("<aggroMultiplier: 2.5>", "aggroMultiplier", 1.0), 2.5);
    }

    #[test]
    fn test_unregistered_tag_is_absent() {
        let resolver = TagResolver::new();
        assert_eq!(resolver.find_raw("<cooldown: 5>", "cooldown"), None);
        assert!(!resolver.flag("<direct>", "direct"));
    }
}
