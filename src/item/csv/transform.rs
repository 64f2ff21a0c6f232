use std::{fmt, sync::Arc};

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ImportError;

/// A caller-supplied string rewrite, used through [`Transformation::Custom`].
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use csv_link::item::csv::transform::{Transform, Transformation};
///
/// #[derive(Debug)]
/// struct Upper;
///
/// impl Transform for Upper {
///     fn process(&self, value: &str) -> String {
///         value.to_uppercase()
///     }
/// }
///
/// let step = Transformation::Custom(Arc::new(Upper));
/// assert_eq!(step.process("abc"), "ABC");
/// ```
pub trait Transform: fmt::Debug + Send + Sync {
    fn process(&self, value: &str) -> String;
}

/// A compiled regular expression that (de)serializes as its source text.
#[derive(Debug, Clone)]
pub struct Pattern(Regex);

impl Pattern {
    pub fn new(pattern: &str) -> Result<Self, ImportError> {
        Regex::new(pattern)
            .map(Pattern)
            .map_err(|error| ImportError::Transformation(error.to_string()))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Serialize for Pattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Pattern {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let source = String::deserialize(deserializer)?;
        Pattern::new(&source).map_err(serde::de::Error::custom)
    }
}

/// One string rewrite step applied to a raw field before conversion.
///
/// Every step accepts the empty string. Positions and lengths count
/// characters, not bytes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Transformation {
    /// Removes the text delimiters wrapping a field.
    ///
    /// Applies only when the field starts and ends with `quote` and is at
    /// least two characters long. The whole run of wrapping delimiters on
    /// each side is removed, so stripping twice equals stripping once.
    StripQuotes { quote: char },
    /// Removes every space character.
    StripSpaces,
    /// Removes every character contained in `chars`.
    StripChars { chars: String },
    /// Keeps decimal digits only.
    NumericsOnly,
    /// Replaces `length` characters from `start` with `text`.
    ///
    /// Returns the input unchanged when `start` is past its end.
    InsertText {
        start: usize,
        length: usize,
        text: String,
    },
    /// Keeps the last `max` characters.
    Right { max: usize },
    /// Keeps the first match of `pattern`, or nothing.
    Match { pattern: Pattern },
    #[serde(skip)]
    Custom(Arc<dyn Transform>),
}

impl Transformation {
    /// A [`Transformation::Match`] step, failing on an invalid pattern.
    pub fn matching(pattern: &str) -> Result<Self, ImportError> {
        Ok(Transformation::Match {
            pattern: Pattern::new(pattern)?,
        })
    }

    pub fn strip_chars(chars: impl Into<String>) -> Self {
        Transformation::StripChars {
            chars: chars.into(),
        }
    }

    pub fn insert_text(start: usize, length: usize, text: impl Into<String>) -> Self {
        Transformation::InsertText {
            start,
            length,
            text: text.into(),
        }
    }

    pub fn right(max: usize) -> Self {
        Transformation::Right { max }
    }

    pub fn process(&self, value: &str) -> String {
        match self {
            Transformation::StripQuotes { quote } => strip_quotes(value, *quote).to_string(),
            Transformation::StripSpaces => value.chars().filter(|c| *c != ' ').collect(),
            Transformation::StripChars { chars } => {
                value.chars().filter(|c| !chars.contains(*c)).collect()
            }
            Transformation::NumericsOnly => value.chars().filter(char::is_ascii_digit).collect(),
            Transformation::InsertText {
                start,
                length,
                text,
            } => insert_text(value, *start, *length, text),
            Transformation::Right { max } => {
                let count = value.chars().count();
                value.chars().skip(count.saturating_sub(*max)).collect()
            }
            Transformation::Match { pattern } => pattern
                .0
                .find(value)
                .map(|found| found.as_str().to_string())
                .unwrap_or_default(),
            Transformation::Custom(transform) => transform.process(value),
        }
    }
}

fn strip_quotes(value: &str, quote: char) -> &str {
    let wrapped = value.chars().count() >= 2 && value.starts_with(quote) && value.ends_with(quote);
    if wrapped {
        value.trim_matches(quote)
    } else {
        value
    }
}

fn insert_text(value: &str, start: usize, length: usize, text: &str) -> String {
    let count = value.chars().count();
    if start >= count {
        return value.to_string();
    }

    let end = start.saturating_add(length).min(count);
    let mut result: String = value.chars().take(start).collect();
    result.push_str(text);
    result.extend(value.chars().skip(end));
    result
}

/// An ordered chain of transformations.
#[derive(Debug, Clone, Default)]
pub struct Transformations {
    steps: Vec<Transformation>,
}

impl Transformations {
    pub fn new() -> Self {
        Self::default()
    }

    /// The chain every resolved link starts from: quote stripping first.
    pub fn for_field(text_delimiter: char) -> Self {
        Self {
            steps: vec![Transformation::StripQuotes {
                quote: text_delimiter,
            }],
        }
    }

    pub fn push(&mut self, step: Transformation) {
        self.steps.push(step);
    }

    pub fn steps(&self) -> &[Transformation] {
        &self.steps
    }

    pub fn process(&self, value: &str) -> String {
        self.steps
            .iter()
            .fold(value.to_string(), |current, step| step.process(&current))
    }
}

impl Extend<Transformation> for Transformations {
    fn extend<I: IntoIterator<Item = Transformation>>(&mut self, iter: I) {
        self.steps.extend(iter);
    }
}

impl FromIterator<Transformation> for Transformations {
    fn from_iter<I: IntoIterator<Item = Transformation>>(iter: I) -> Self {
        Self {
            steps: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Transformation, Transformations};

    fn strip_quotes() -> Transformation {
        Transformation::StripQuotes { quote: '"' }
    }

    #[test]
    fn strip_quotes_removes_wrapping_delimiters() {
        assert_eq!(strip_quotes().process("\"split,string\""), "split,string");
        assert_eq!(strip_quotes().process("\"\""), "");
        assert_eq!(strip_quotes().process("no quotes"), "no quotes");
        assert_eq!(strip_quotes().process("\"open"), "\"open");
        assert_eq!(strip_quotes().process("\""), "\"");
        assert_eq!(strip_quotes().process(""), "");
    }

    #[test]
    fn strip_quotes_is_idempotent() {
        for input in ["\"a\"", "\"\"a\"\"", "\"\"\"", "\"a\"b\"", "\"", "plain", ""] {
            let once = strip_quotes().process(input);
            let twice = strip_quotes().process(&once);
            assert_eq!(once, twice, "input {input:?}");
        }
    }

    #[test]
    fn strip_spaces_and_chars() {
        assert_eq!(Transformation::StripSpaces.process(" 1 2 3 "), "123");
        assert_eq!(
            Transformation::strip_chars("-()").process("(01) 234-567"),
            "01 234567"
        );
        assert_eq!(Transformation::strip_chars("").process("abc"), "abc");
    }

    #[test]
    fn numerics_only_keeps_digits() {
        assert_eq!(Transformation::NumericsOnly.process("£1,234.50p"), "123450");
        assert_eq!(Transformation::NumericsOnly.process(""), "");
    }

    #[test]
    fn insert_text_replaces_slice() {
        let step = Transformation::insert_text(2, 3, "XY");
        assert_eq!(step.process("abcdefg"), "abXYfg");
        assert_eq!(step.process("abcd"), "abXY");
        assert_eq!(step.process("ab"), "ab");
        assert_eq!(step.process(""), "");

        assert_eq!(
            Transformation::insert_text(0, 0, "+").process("44"),
            "+44"
        );
    }

    #[test]
    fn right_keeps_last_characters() {
        assert_eq!(Transformation::right(4).process("0123456789"), "6789");
        assert_eq!(Transformation::right(4).process("12"), "12");
        assert_eq!(Transformation::right(0).process("12"), "");
        assert_eq!(Transformation::right(2).process("Zürich"), "ch");
    }

    #[test]
    fn match_keeps_first_match_or_nothing() {
        let step = Transformation::matching(r"^[\d]{0,2}").unwrap();
        assert_eq!(step.process("42abc"), "42");
        assert_eq!(step.process("123"), "12");
        assert_eq!(step.process("abc"), "");

        let step = Transformation::matching(r"\d+").unwrap();
        assert_eq!(step.process("no digits"), "");
    }

    #[test]
    fn invalid_pattern_is_rejected() {
        assert!(Transformation::matching("(unclosed").is_err());
    }

    #[test]
    fn chain_applies_steps_in_order() {
        let mut chain = Transformations::for_field('"');
        chain.push(Transformation::StripSpaces);
        chain.push(Transformation::right(3));

        assert_eq!(chain.process("\"1 2 3 4\""), "234");
        assert_eq!(chain.steps().len(), 3);
    }

    #[test]
    fn steps_deserialize_from_tagged_json() {
        let steps: Vec<Transformation> = serde_json::from_str(
            r#"[{"type":"strip_spaces"},{"type":"right","max":2},{"type":"match","pattern":"\\d+"}]"#,
        )
        .unwrap();
        let chain: Transformations = steps.into_iter().collect();

        assert_eq!(chain.process("a 1 2 3"), "23");
    }

    #[test]
    fn invalid_pattern_fails_deserialization() {
        let result: Result<Transformation, _> =
            serde_json::from_str(r#"{"type":"match","pattern":"("}"#);
        assert!(result.is_err());
    }
}
