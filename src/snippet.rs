//! Query-biased snippet extraction.
//!
//! Walks a document's raw stored text, harvesting sentences out of the
//! regions a reader would actually want summarized, scores each sentence
//! against the query, and stitches the two highest-scoring sentences
//! together. Tie-breaking uses an explicit `(score, insertion order)` pair
//! and a stable sort rather than perturbing scores to make them unique.

use crate::tokenize::{tokenize, Stemmer};

const MAX_SENTENCE_TOKENS: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Region {
    /// `title` / `HEADLINE`
    Title,
    /// `content` / `TEXT` — gets the first-body boost.
    Content,
    /// `item key="og_image:alt"` image caption.
    Caption,
}

struct Sentence {
    text: String,
    /// First sentence emitted from a `content`/`TEXT` region (the original's
    /// one-shot "first-body boost", not every sentence in the region).
    gets_body_boost: bool,
    ordinal: usize,
}

/// Extracts sentences from the recognized regions of a raw document.
///
/// Recognizes `title`/`content`/`item key="og_image:alt"` (the regions the
/// original snippet builder targeted) plus `HEADLINE`/`TEXT`, so snippets
/// are non-empty over the SGML this crate's indexer actually parses.
fn extract_sentences(raw: &str) -> Vec<Sentence> {
    let mut sentences = Vec::new();
    let mut region: Option<Region> = None;
    let mut in_tag = false;
    let mut tag_buf = String::new();
    let mut sentence_buf = String::new();
    let mut ordinal = 0usize;
    // Set on entering a content region, consumed by the first sentence
    // flushed out of it; a second content region re-arms the boost.
    let mut body_boost_pending = false;

    let mut flush = |buf: &mut String,
                      region: Option<Region>,
                      sentences: &mut Vec<Sentence>,
                      ordinal: &mut usize,
                      body_boost_pending: &mut bool| {
        let trimmed = buf.trim();
        if let Some(r) = region {
            if !trimmed.is_empty() {
                *ordinal += 1;
                let gets_body_boost = r == Region::Content && *body_boost_pending;
                if gets_body_boost {
                    *body_boost_pending = false;
                }
                sentences.push(Sentence {
                    text: trimmed.to_string(),
                    gets_body_boost,
                    ordinal: *ordinal,
                });
            }
        }
        buf.clear();
    };

    for ch in raw.chars() {
        if ch == '<' {
            in_tag = true;
            tag_buf.clear();
            continue;
        }
        if in_tag {
            if ch == '>' {
                in_tag = false;
                let tag = tag_buf.trim();
                let closing = tag.starts_with('/');
                let name_part = tag.trim_start_matches('/');
                let name = name_part
                    .split(|c: char| c.is_whitespace())
                    .next()
                    .unwrap_or("")
                    .to_lowercase();

                if closing {
                    let closes_current = match region {
                        Some(Region::Title) => name == "title" || name == "headline",
                        Some(Region::Content) => name == "content" || name == "text",
                        Some(Region::Caption) => name == "item",
                        None => false,
                    };
                    if closes_current {
                        flush(&mut sentence_buf, region, &mut sentences, &mut ordinal, &mut body_boost_pending);
                        region = None;
                    }
                } else {
                    match name.as_str() {
                        "title" | "headline" => region = Some(Region::Title),
                        "content" | "text" => {
                            region = Some(Region::Content);
                            body_boost_pending = true;
                        }
                        "item" if name_part.contains("og_image:alt") => region = Some(Region::Caption),
                        _ => {}
                    }
                }
            } else {
                tag_buf.push(ch);
            }
            continue;
        }

        if region.is_some() {
            match ch {
                '.' | '?' | '!' => {
                    flush(&mut sentence_buf, region, &mut sentences, &mut ordinal, &mut body_boost_pending);
                }
                _ => sentence_buf.push(ch),
            }
        }
    }
    flush(&mut sentence_buf, region, &mut sentences, &mut ordinal, &mut body_boost_pending);

    sentences
}

fn score_sentence(sentence: &Sentence, query: &[String], stemmer: &dyn Stemmer) -> f32 {
    let tokens: Vec<String> = tokenize(&sentence.text)
        .into_iter()
        .map(|t| stemmer.stem(&t))
        .collect();

    let c = tokens.iter().filter(|t| query.contains(t)).count() as f32;
    let d = {
        let mut distinct: Vec<&String> = tokens.iter().filter(|t| query.contains(t)).collect();
        distinct.sort();
        distinct.dedup();
        distinct.len() as f32
    };

    // Longest run of query matches, tolerating a single intervening
    // non-matching token (so two keywords either side of one connector word
    // still count as proximate) but breaking on two or more in a row.
    let mut k = 0usize;
    let mut run = 0usize;
    let mut gap = 0usize;
    for token in &tokens {
        if query.contains(token) {
            if run > 0 && gap <= 1 {
                run += 1;
            } else {
                run = 1;
            }
            gap = 0;
            k = k.max(run);
        } else if run > 0 {
            gap += 1;
            if gap > 1 {
                run = 0;
            }
        }
    }

    let l = if sentence.gets_body_boost { 2.0 } else { 0.0 };
    let i = sentence.ordinal.max(1) as f32;

    5.0 * k as f32 + 4.0 * d + c + l + 1.0 / i
}

fn truncate_to_tokens(text: &str, max_tokens: usize) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() <= max_tokens {
        text.trim().to_string()
    } else {
        format!("{}...", words[..max_tokens].join(" "))
    }
}

/// Builds a query-biased snippet of at most two sentences. Returns an empty
/// string if the document has no recognized regions or no query term
/// matches anything in them.
pub fn build_snippet(raw: &str, stemmed_query: &[String], stemmer: &dyn Stemmer) -> String {
    let sentences = extract_sentences(raw);
    if sentences.is_empty() {
        return String::new();
    }

    // (score, insertion_order) pairs, stably sorted descending by score;
    // insertion_order (the sentence's position in extraction order) breaks
    // ties deterministically instead of perturbing the float.
    let mut scored: Vec<(f32, usize, &Sentence)> = sentences
        .iter()
        .enumerate()
        .map(|(insertion_order, s)| (score_sentence(s, stemmed_query, stemmer), insertion_order, s))
        .collect();
    scored.sort_by(|a, b| {
        b.0.partial_cmp(&a.0)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.1.cmp(&b.1))
    });

    scored
        .into_iter()
        .take(2)
        .map(|(_, _, s)| truncate_to_tokens(&s.text, MAX_SENTENCE_TOKENS))
        .collect::<Vec<_>>()
        .join(" ")
}
