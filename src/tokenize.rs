use crate::error::Result;
use crate::types::QueryWeight;

/// A single token extracted from text, paired with a query-time weight.
/// On the ingest side the weight is always `1`; on the query side a
/// caller may boost individual terms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeightedToken {
    pub text: String,
    pub weight: QueryWeight,
}

impl WeightedToken {
    pub fn new(text: impl Into<String>, weight: QueryWeight) -> Self {
        WeightedToken {
            text: text.into(),
            weight,
        }
    }
}

/// Text-to-token seam. The core never inspects raw text itself; every
/// place that needs tokens either receives them pre-split (`has_attr_token`)
/// or goes through an injected implementation of this trait.
///
/// `language_hint` carries the caller's best guess at the text's language
/// (e.g. `"en"`, `"ja"`) so a dictionary-backed implementation can select
/// the right analyzer; `None` means no hint was supplied and an
/// implementation should fall back to its default language.
pub trait Tokenize: Send + Sync {
    fn tokenize(&self, text: &str, language_hint: Option<&str>) -> Result<Vec<WeightedToken>>;
}

/// Splits on Unicode whitespace, lowercases, assigns weight 1 to every
/// token. The fallback used when a caller doesn't supply a dictionary-backed
/// tokenizer -- mirrors the teacher's `analysis::tokenizer` default mode in
/// spirit, not in code (that module's dictionary machinery is out of scope
/// here). Language-independent, so `language_hint` is accepted but unused.
#[derive(Debug, Default)]
pub struct WhitespaceTokenizer;

impl Tokenize for WhitespaceTokenizer {
    fn tokenize(&self, text: &str, _language_hint: Option<&str>) -> Result<Vec<WeightedToken>> {
        Ok(text
            .split_whitespace()
            .map(|word| WeightedToken::new(word.to_lowercase(), 1))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_and_lowercases() {
        let tokens = WhitespaceTokenizer.tokenize("Hello  World", None).unwrap();
        assert_eq!(
            tokens,
            vec![
                WeightedToken::new("hello", 1),
                WeightedToken::new("world", 1),
            ]
        );
    }

    #[test]
    fn empty_text_yields_no_tokens() {
        assert!(WhitespaceTokenizer.tokenize("   ", None).unwrap().is_empty());
    }

    #[test]
    fn language_hint_is_accepted_and_ignored() {
        let hinted = WhitespaceTokenizer.tokenize("Hello World", Some("en")).unwrap();
        let unhinted = WhitespaceTokenizer.tokenize("Hello World", None).unwrap();
        assert_eq!(hinted, unhinted);
    }
}
