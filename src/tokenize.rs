//! Tokenization and pluggable stemming.
//!
//! A token is a maximal run of alphanumeric characters; everything else is a
//! separator. The same tokenizer is used on indexed text and on queries so
//! lexicon lookups agree.

use rust_stemmers::{Algorithm, Stemmer as SnowballStemmer};

/// Splits text into lowercase alphanumeric runs.
pub fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    for ch in text.chars() {
        if ch.is_alphanumeric() {
            current.extend(ch.to_lowercase());
        } else if !current.is_empty() {
            tokens.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

/// A deterministic, pure token reducer applied identically at index time and
/// query time.
pub trait Stemmer: Send + Sync {
    fn stem(&self, token: &str) -> String;

    /// A short identifier persisted in the store manifest so a retriever can
    /// confirm it is using the same stemmer the index was built with.
    fn identifier(&self) -> &'static str;
}

/// Stems with the Snowball/Porter English algorithm (via `rust-stemmers`).
pub struct EnglishStemmer(SnowballStemmer);

impl EnglishStemmer {
    pub fn new() -> Self {
        Self(SnowballStemmer::create(Algorithm::English))
    }
}

impl Default for EnglishStemmer {
    fn default() -> Self {
        Self::new()
    }
}

impl Stemmer for EnglishStemmer {
    fn stem(&self, token: &str) -> String {
        self.0.stem(token).into_owned()
    }

    fn identifier(&self) -> &'static str {
        "porter-english"
    }
}

/// Leaves tokens unstemmed; useful for callers that index raw tokens.
#[derive(Default)]
pub struct IdentityStemmer;

impl Stemmer for IdentityStemmer {
    fn stem(&self, token: &str) -> String {
        token.to_string()
    }

    fn identifier(&self) -> &'static str {
        "identity"
    }
}

/// Resolves a persisted stemmer identifier back to an implementation.
pub fn stemmer_for(identifier: &str) -> Box<dyn Stemmer> {
    match identifier {
        "identity" => Box::new(IdentityStemmer),
        _ => Box::new(EnglishStemmer::new()),
    }
}

/// Tokenizes then stems, the pipeline used for both document text and
/// queries.
pub fn tokenize_and_stem(text: &str, stemmer: &dyn Stemmer) -> Vec<String> {
    tokenize(text).into_iter().map(|t| stemmer.stem(&t)).collect()
}
