//! Indexer: streams a gzip-compressed SGML-like archive and writes a
//! persistent store (docs/offsets/inverted-index/lexicon/docnos/lengths).

use std::collections::HashMap;
use std::fs;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use flate2::read::GzDecoder;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::lexicon::Lexicon;
use crate::postings::{self, PostingsAccumulator};
use crate::store::BlobWriter;
use crate::tokenize::{tokenize, EnglishStemmer, Stemmer};

const FORMAT_VERSION: u32 = 1;
const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Tunables for a single indexing run.
pub struct IndexerConfig {
    pub stemmer: Box<dyn Stemmer>,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            stemmer: Box::new(EnglishStemmer::new()),
        }
    }
}

/// Store provenance, persisted as `manifest.json`.
#[derive(Debug, Serialize, Deserialize)]
pub struct Manifest {
    pub format_version: u32,
    pub num_documents: u32,
    pub num_terms: u32,
    pub stemmer: String,
    pub created_at: u64,
}

/// Explicit parser states, one per recognized SGML region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Outside,
    InDoc,
    InHeadline,
    InText,
    InGraphic,
}

#[derive(Default)]
struct DocAccumulator {
    raw_lines: Vec<String>,
    docno: String,
    headline: String,
    term_counts: HashMap<u32, u32>,
    length: u32,
}

impl DocAccumulator {
    fn record_content(&mut self, text: &str, lexicon: &mut Lexicon, stemmer: &dyn Stemmer) {
        for token in tokenize(text) {
            let stemmed = stemmer.stem(&token);
            let id = lexicon.intern(&stemmed);
            *self.term_counts.entry(id).or_insert(0) += 1;
            self.length += 1;
        }
    }
}

/// Derives `"<Month> <DD>, 19<YY>"` from a DOCNO whose characters 2..4 are
/// the month, 4..6 the day, and 6..8 the two-digit year. Malformed DOCNOs
/// degrade to an empty string rather than aborting indexing.
fn derive_date(docno: &str) -> String {
    let chars: Vec<char> = docno.chars().collect();
    if chars.len() < 8 {
        return String::new();
    }
    let month_str: String = chars[2..4].iter().collect();
    let day_str: String = chars[4..6].iter().collect();
    let year_str: String = chars[6..8].iter().collect();

    if !day_str.chars().all(|c| c.is_ascii_digit()) || !year_str.chars().all(|c| c.is_ascii_digit()) {
        return String::new();
    }
    let month_num: usize = match month_str.parse() {
        Ok(n) => n,
        Err(_) => return String::new(),
    };
    if month_num == 0 || month_num > 12 {
        return String::new();
    }
    format!("{} {}, 19{}", MONTHS[month_num - 1], day_str, year_str)
}

fn extract_between<'a>(line: &'a str, open: &str, close: &str) -> Option<&'a str> {
    let start = line.find(open)? + open.len();
    let end = line[start..].find(close)? + start;
    Some(line[start..end].trim())
}

fn format_payload(internal_id: u32, docno: &str, date: &str, headline: &str, raw: &str) -> String {
    format!(
        "docno: {}\ninternal id: {}\ndate: {}\nheadline: {}\nraw document:\n{}",
        docno, internal_id, date, headline, raw
    )
}

/// Indexes `archive_path` into a freshly created `output_dir`. Fails with
/// [`Error::StoreExists`] if the directory already exists.
pub fn build_index(archive_path: &Path, output_dir: &Path, config: &IndexerConfig) -> Result<Manifest> {
    if output_dir.exists() {
        return Err(Error::StoreExists(output_dir.display().to_string()));
    }
    fs::create_dir_all(output_dir)?;

    let file = fs::File::open(archive_path)?;
    let decoder = GzDecoder::new(file);
    let reader = BufReader::new(decoder);

    let mut lexicon = Lexicon::new();
    let mut postings_acc = PostingsAccumulator::new();
    let mut docs_writer = BlobWriter::create(&output_dir.join("docs.bin"))?;
    let mut docnos: Vec<String> = Vec::new();
    let mut doc_lengths: Vec<u32> = Vec::new();

    let mut state = State::Outside;
    let mut doc = DocAccumulator::default();

    for line in reader.lines() {
        let line = line?;

        match state {
            State::Outside => {
                if line.trim() == "<DOC>" {
                    doc = DocAccumulator::default();
                    doc.raw_lines.push(line);
                    state = State::InDoc;
                }
                // stray lines outside any <DOC> block are ignored
            }
            State::InDoc => {
                doc.raw_lines.push(line.clone());
                if line.contains("</DOC>") {
                    finalize_document(
                        &mut doc,
                        &mut postings_acc,
                        &mut docs_writer,
                        &mut docnos,
                        &mut doc_lengths,
                    )?;
                    state = State::Outside;
                } else if line.contains("<DOCNO>") {
                    if let Some(docno) = extract_between(&line, "<DOCNO>", "</DOCNO>") {
                        doc.docno = docno.to_string();
                    }
                } else if line.contains("<HEADLINE>") {
                    if let Some(content) = extract_between(&line, "<HEADLINE>", "</HEADLINE>") {
                        doc.record_content(content, &mut lexicon, config.stemmer.as_ref());
                        if !doc.headline.is_empty() {
                            doc.headline.push(' ');
                        }
                        doc.headline.push_str(content);
                    } else {
                        state = State::InHeadline;
                    }
                } else if line.contains("<TEXT>") {
                    if let Some(content) = extract_between(&line, "<TEXT>", "</TEXT>") {
                        doc.record_content(content, &mut lexicon, config.stemmer.as_ref());
                    } else {
                        state = State::InText;
                    }
                } else if line.contains("<GRAPHIC>") {
                    if let Some(content) = extract_between(&line, "<GRAPHIC>", "</GRAPHIC>") {
                        doc.record_content(content, &mut lexicon, config.stemmer.as_ref());
                    } else {
                        state = State::InGraphic;
                    }
                }
            }
            State::InHeadline => {
                doc.raw_lines.push(line.clone());
                if line.contains("</HEADLINE>") {
                    if let Some(content) = line.split("</HEADLINE>").next() {
                        if !content.is_empty() {
                            doc.record_content(content, &mut lexicon, config.stemmer.as_ref());
                            if !doc.headline.is_empty() {
                                doc.headline.push(' ');
                            }
                            doc.headline.push_str(content.trim());
                        }
                    }
                    state = State::InDoc;
                } else if !line.contains('<') {
                    doc.record_content(&line, &mut lexicon, config.stemmer.as_ref());
                    if !doc.headline.is_empty() {
                        doc.headline.push(' ');
                    }
                    doc.headline.push_str(line.trim());
                }
            }
            State::InText => {
                doc.raw_lines.push(line.clone());
                if line.contains("</TEXT>") {
                    if let Some(content) = line.split("</TEXT>").next() {
                        if !content.is_empty() {
                            doc.record_content(content, &mut lexicon, config.stemmer.as_ref());
                        }
                    }
                    state = State::InDoc;
                } else if !line.contains('<') {
                    doc.record_content(&line, &mut lexicon, config.stemmer.as_ref());
                }
            }
            State::InGraphic => {
                doc.raw_lines.push(line.clone());
                if line.contains("</GRAPHIC>") {
                    if let Some(content) = line.split("</GRAPHIC>").next() {
                        if !content.is_empty() {
                            doc.record_content(content, &mut lexicon, config.stemmer.as_ref());
                        }
                    }
                    state = State::InDoc;
                } else if !line.contains('<') {
                    doc.record_content(&line, &mut lexicon, config.stemmer.as_ref());
                }
            }
        }
    }

    if state != State::Outside {
        log::warn!("archive ended with an unterminated <DOC> block; dropping it");
    }

    docs_writer.finish(&output_dir.join("offsets.bin"))?;

    let mut inverted_writer = BlobWriter::create(&output_dir.join("inverted_index.bin"))?;
    for term_id in 0..lexicon.len() as u32 {
        let bytes = postings::encode(postings_acc.get(term_id))?;
        inverted_writer.push(&bytes)?;
    }
    inverted_writer.finish(&output_dir.join("index_offsets.bin"))?;

    lexicon.save(&output_dir.join("lexicon.json"))?;

    let mut docnos_file = std::io::BufWriter::new(fs::File::create(output_dir.join("docnos.txt"))?);
    for docno in &docnos {
        use std::io::Write;
        writeln!(docnos_file, "{}", docno)?;
    }
    let mut lengths_file = std::io::BufWriter::new(fs::File::create(output_dir.join("doc_lengths.txt"))?);
    for len in &doc_lengths {
        use std::io::Write;
        writeln!(lengths_file, "{}", len)?;
    }

    let manifest = Manifest {
        format_version: FORMAT_VERSION,
        num_documents: docnos.len() as u32,
        num_terms: lexicon.len() as u32,
        stemmer: config.stemmer.identifier().to_string(),
        created_at: SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0),
    };
    let manifest_file = fs::File::create(output_dir.join("manifest.json"))?;
    serde_json::to_writer_pretty(manifest_file, &manifest)?;

    log::info!(
        "indexed {} documents, {} terms",
        manifest.num_documents,
        manifest.num_terms
    );

    Ok(manifest)
}

fn finalize_document(
    doc: &mut DocAccumulator,
    postings_acc: &mut PostingsAccumulator,
    docs_writer: &mut BlobWriter,
    docnos: &mut Vec<String>,
    doc_lengths: &mut Vec<u32>,
) -> Result<()> {
    let internal_id = docnos.len() as u32;
    let date = derive_date(&doc.docno);

    for (&term_id, &count) in doc.term_counts.iter() {
        postings_acc.record(term_id, internal_id, count);
    }

    let raw = doc.raw_lines.join("\n");
    let payload = format_payload(internal_id, &doc.docno, &date, doc.headline.trim(), &raw);
    docs_writer.push(payload.as_bytes())?;

    docnos.push(doc.docno.clone());
    doc_lengths.push(doc.length);
    Ok(())
}
