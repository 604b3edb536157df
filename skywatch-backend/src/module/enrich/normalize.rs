///! Free-text normalization for reference cells

use crate::config::{EnrichmentConfig, Substitution};

/// Cleans country/purpose/operator cells: blank and placeholder values
/// become `None`, the rest is title-cased and passed through an ordered
/// substitution table.
#[derive(Debug, Clone)]
pub struct TextNormalizer {
    /// Lowercased
    missing_tokens: Vec<String>,
    substitutions: Vec<Substitution>,
}

impl TextNormalizer {
    pub fn new(missing_tokens: &[String], substitutions: Vec<Substitution>) -> Self {
        Self {
            missing_tokens: missing_tokens.iter().map(|t| t.to_lowercase()).collect(),
            substitutions,
        }
    }

    pub fn from_config(config: &EnrichmentConfig) -> Self {
        Self::new(&config.missing_tokens, config.substitutions.clone())
    }

    pub fn normalize(&self, value: Option<&str>) -> Option<String> {
        let value = value?.trim();
        if value.is_empty() || self.is_missing_token(value) {
            return None;
        }

        // Substitution patterns are written against the title-cased form
        let mut text = title_case(value);
        for sub in &self.substitutions {
            text = text.replace(&sub.pattern, &sub.replacement);
        }
        Some(text)
    }

    fn is_missing_token(&self, value: &str) -> bool {
        let lower = value.to_lowercase();
        self.missing_tokens.iter().any(|t| *t == lower)
    }
}

impl Default for TextNormalizer {
    fn default() -> Self {
        Self::from_config(&EnrichmentConfig::default())
    }
}

/// Normalize with the default token and substitution tables.
pub fn normalize_text(value: Option<&str>) -> Option<String> {
    TextNormalizer::default().normalize(value)
}

/// Uppercase every letter that does not follow another letter, lowercase the rest.
///
/// `"people's republic"` becomes `"People'S Republic"`.
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut previous_is_letter = false;

    for c in text.chars() {
        if previous_is_letter {
            out.extend(c.to_lowercase());
        } else {
            out.extend(c.to_uppercase());
        }
        previous_is_letter = c.is_alphabetic();
    }
    out
}
