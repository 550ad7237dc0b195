//! Retriever: loads a store built by [`crate::index::build_index`] and
//! answers ranked queries.

use std::fs;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::index::Manifest;
use crate::lexicon::Lexicon;
use crate::postings;
use crate::scorer::{Bm25Scorer, Scorer};
use crate::snippet;
use crate::store::BlobReader;
use crate::tokenize::{stemmer_for, tokenize, Stemmer};

/// One ranked hit. Only the top 10 ranks carry `date`/`headline`/`snippet`;
/// the rest carry just `docno`/`rank`.
#[derive(Debug, Clone)]
pub struct Hit {
    pub rank: usize,
    pub docno: String,
    pub score: f32,
    pub date: Option<String>,
    pub headline: Option<String>,
    pub snippet: Option<String>,
}

const DECORATED_RANKS: usize = 10;
const DEFAULT_TOP_K: usize = 1000;

/// Fields parsed back out of a document's stored metadata prefix.
struct StoredDoc {
    date: String,
    headline: String,
    raw: String,
}

fn parse_stored_doc(payload: &str) -> StoredDoc {
    let mut date = String::new();
    let mut headline = String::new();
    let mut raw_start = 0usize;

    // Walk the fixed metadata header line by line; everything after the
    // "raw document:" marker is the original block, preserved byte-for-byte.
    let marker = "raw document:\n";
    if let Some(idx) = payload.find(marker) {
        raw_start = idx + marker.len();
        for line in payload[..idx].lines() {
            if let Some(rest) = line.strip_prefix("date: ") {
                date = rest.to_string();
            } else if let Some(rest) = line.strip_prefix("headline: ") {
                headline = rest.to_string();
            }
        }
    }

    StoredDoc {
        date,
        headline,
        raw: payload[raw_start..].to_string(),
    }
}

/// A loaded, query-ready store.
pub struct Retriever {
    store_dir: PathBuf,
    lexicon: Lexicon,
    docnos: Vec<String>,
    doc_lengths: Vec<u32>,
    avg_doc_length: f32,
    stemmer: Box<dyn Stemmer>,
    #[allow(dead_code)]
    manifest: Manifest,
}

impl Retriever {
    /// Loads all store artifacts except the two blob files, which are
    /// reopened per query.
    pub fn open(store_dir: &Path) -> Result<Self> {
        let require = |name: &str| -> Result<PathBuf> {
            let path = store_dir.join(name);
            if !path.exists() {
                return Err(Error::StoreIncomplete(name.to_string()));
            }
            Ok(path)
        };

        let lexicon_path = require("lexicon.json")?;
        let docnos_path = require("docnos.txt")?;
        let lengths_path = require("doc_lengths.txt")?;
        require("offsets.bin")?;
        require("docs.bin")?;
        require("index_offsets.bin")?;
        require("inverted_index.bin")?;
        let manifest_path = require("manifest.json")?;

        let lexicon = Lexicon::load(&lexicon_path)?;

        let docnos: Vec<String> = BufReader::new(fs::File::open(&docnos_path)?)
            .lines()
            .collect::<std::io::Result<Vec<_>>>()?;

        let doc_lengths: Vec<u32> = BufReader::new(fs::File::open(&lengths_path)?)
            .lines()
            .map(|line| {
                line.map_err(Error::from).and_then(|l| {
                    l.trim()
                        .parse::<u32>()
                        .map_err(|e| Error::Corrupt(format!("doc_lengths.txt: {}", e)))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        if docnos.len() != doc_lengths.len() {
            return Err(Error::Corrupt(
                "docnos.txt and doc_lengths.txt disagree on document count".into(),
            ));
        }

        let manifest: Manifest = serde_json::from_reader(fs::File::open(&manifest_path)?)?;
        let stemmer = stemmer_for(&manifest.stemmer);

        let avg_doc_length = if doc_lengths.is_empty() {
            0.0
        } else {
            doc_lengths.iter().map(|&l| l as u64).sum::<u64>() as f32 / doc_lengths.len() as f32
        };

        Ok(Self {
            store_dir: store_dir.to_path_buf(),
            lexicon,
            docnos,
            doc_lengths,
            avg_doc_length,
            stemmer,
            manifest,
        })
    }

    pub fn num_documents(&self) -> usize {
        self.docnos.len()
    }

    fn postings_reader(&self) -> Result<BlobReader> {
        BlobReader::open(
            &self.store_dir.join("inverted_index.bin"),
            &self.store_dir.join("index_offsets.bin"),
        )
    }

    fn docs_reader(&self) -> Result<BlobReader> {
        BlobReader::open(&self.store_dir.join("docs.bin"), &self.store_dir.join("offsets.bin"))
    }

    /// Tokenizes, stems, scores, ranks, and decorates a query's top-k hits.
    pub fn search(&self, query: &str, k: usize) -> Result<Vec<Hit>> {
        self.search_with(query, k, &Bm25Scorer::default())
    }

    /// Same as [`Retriever::search`] but with an explicit [`Scorer`], e.g.
    /// [`crate::scorer::CosineScorer`].
    pub fn search_with(&self, query: &str, k: usize, scorer: &dyn Scorer) -> Result<Vec<Hit>> {
        let started = std::time::Instant::now();
        let result = self.search_with_inner(query, k, scorer);
        log::debug!("query {:?} took {:?}", query, started.elapsed());
        result
    }

    fn search_with_inner(&self, query: &str, k: usize, scorer: &dyn Scorer) -> Result<Vec<Hit>> {
        let stemmed_query: Vec<String> = tokenize(query)
            .into_iter()
            .map(|t| self.stemmer.stem(&t))
            .collect();

        let mut postings_reader = self.postings_reader()?;
        let num_docs = self.docnos.len() as u32;

        let mut contributions: std::collections::HashMap<u32, f32> = std::collections::HashMap::new();
        let mut any_known_term = false;

        for term in &stemmed_query {
            let term_id = match self.lexicon.get(term) {
                Some(id) => id,
                None => continue,
            };
            any_known_term = true;

            let bytes = postings_reader.read(term_id as usize)?;
            let posting = postings::decode(&bytes)?;
            let df = posting.len() as u32;

            for &(doc_id, tf) in &posting {
                let doc_len = self.doc_lengths.get(doc_id as usize).copied().unwrap_or(0);
                let contribution = scorer.score_term(tf, df, doc_len, self.avg_doc_length, num_docs);
                *contributions.entry(doc_id).or_insert(0.0) += contribution;
            }
        }

        if !any_known_term {
            return Err(Error::EmptyResult);
        }

        // Sort by descending score, ties broken by ascending doc_id.
        let mut ranked: Vec<(u32, f32)> = contributions.into_iter().collect();
        ranked.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });
        ranked.truncate(k);

        let mut docs_reader = self.docs_reader()?;
        let mut hits = Vec::with_capacity(ranked.len());
        for (rank, (doc_id, score)) in ranked.into_iter().enumerate() {
            let rank = rank + 1;
            let docno = self.docnos[doc_id as usize].clone();

            if rank <= DECORATED_RANKS {
                match self.decorate(&mut docs_reader, doc_id, &stemmed_query) {
                    Ok((date, headline, snippet)) => {
                        hits.push(Hit {
                            rank,
                            docno,
                            score,
                            date: Some(date),
                            headline: Some(headline),
                            snippet: Some(snippet),
                        });
                    }
                    Err(e) => {
                        log::warn!("failed to decorate doc_id {}: {}", doc_id, e);
                        hits.push(Hit {
                            rank,
                            docno,
                            score,
                            date: None,
                            headline: None,
                            snippet: None,
                        });
                    }
                }
            } else {
                hits.push(Hit {
                    rank,
                    docno,
                    score,
                    date: None,
                    headline: None,
                    snippet: None,
                });
            }
        }

        Ok(hits)
    }

    /// Reads and summarizes a single document's `(date, headline, snippet)`
    /// for decoration. Fallible on its own so one bad document can't abort
    /// the whole query (SPEC_FULL.md §7: per-document snippet failures
    /// degrade, they don't propagate).
    fn decorate(&self, docs_reader: &mut BlobReader, doc_id: u32, stemmed_query: &[String]) -> Result<(String, String, String)> {
        let payload = docs_reader.read_string(doc_id as usize)?;
        let stored = parse_stored_doc(&payload);
        let biased_query = snippet::build_snippet(&stored.raw, stemmed_query, self.stemmer.as_ref());
        let headline = if stored.headline.is_empty() {
            let mut fallback: String = biased_query.chars().take(50).collect();
            fallback.push_str("...");
            fallback
        } else {
            stored.headline
        };
        Ok((stored.date, headline, biased_query))
    }

    /// Reads the stored payload for an internal document id.
    pub fn document_by_id(&self, id: u32) -> Result<String> {
        if id as usize >= self.docnos.len() {
            return Err(Error::NotFound(format!("document id {}", id)));
        }
        let mut reader = self.docs_reader()?;
        reader.read_string(id as usize)
    }

    /// Reads the stored payload for an external DOCNO.
    pub fn document_by_docno(&self, docno: &str) -> Result<String> {
        let id = self
            .docnos
            .iter()
            .position(|d| d == docno)
            .ok_or_else(|| Error::NotFound(format!("docno {}", docno)))?;
        self.document_by_id(id as u32)
    }
}

/// Default top-k used by the interactive front-end.
pub fn default_top_k() -> usize {
    DEFAULT_TOP_K
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{build_index, IndexerConfig};
    use crate::tokenize::IdentityStemmer;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;
    use tempfile::tempdir;

    const THREE_DOC_CORPUS: &str = "\
<DOC>
<DOCNO> LA010189-0001 </DOCNO>
<HEADLINE>
Soviets Announce Policy
</HEADLINE>
<TEXT>
glasnost glasnost glasnost glasnost glasnost glasnost glasnost glasnost glasnost glasnost
</TEXT>
</DOC>
<DOC>
<DOCNO> LA010189-0002 </DOCNO>
<HEADLINE>
Summit Talks
</HEADLINE>
<TEXT>
glasnost appears once here and nothing else relevant
</TEXT>
</DOC>
<DOC>
<DOCNO> LA010289-0003 </DOCNO>
<HEADLINE>
Unrelated Story
</HEADLINE>
<TEXT>
completely unrelated sports coverage today
</TEXT>
</DOC>
";

    fn build_test_store() -> (tempfile::TempDir, PathBuf) {
        let dir = tempdir().unwrap();
        let archive_path = dir.path().join("archive.gz");
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(THREE_DOC_CORPUS.as_bytes()).unwrap();
        fs::write(&archive_path, encoder.finish().unwrap()).unwrap();

        let store_dir = dir.path().join("store");
        let config = IndexerConfig {
            stemmer: Box::new(IdentityStemmer),
        };
        build_index(&archive_path, &store_dir, &config).unwrap();
        (dir, store_dir)
    }

    #[test]
    fn unknown_query_term_returns_empty_result_error() {
        let (_dir, store_dir) = build_test_store();
        let retriever = Retriever::open(&store_dir).unwrap();
        let result = retriever.search("gorbachev", 10);
        assert!(matches!(result, Err(Error::EmptyResult)));
    }

    #[test]
    fn ranks_higher_term_frequency_above_lower() {
        let (_dir, store_dir) = build_test_store();
        let retriever = Retriever::open(&store_dir).unwrap();
        let hits = retriever.search("glasnost", 10).unwrap();
        assert_eq!(hits[0].docno, "LA010189-0001");
    }

    #[test]
    fn decorates_only_top_ten_ranks() {
        let (_dir, store_dir) = build_test_store();
        let retriever = Retriever::open(&store_dir).unwrap();
        let hits = retriever.search("glasnost", 10).unwrap();
        assert!(hits[0].headline.is_some());
        assert!(hits[0].date.is_some());
    }

    #[test]
    fn corrupt_document_payload_degrades_instead_of_failing_the_query() {
        let (_dir, store_dir) = build_test_store();

        // Truncate the first compressed record so it fails to decompress,
        // without touching the offset table.
        let docs_path = store_dir.join("docs.bin");
        let mut bytes = fs::read(&docs_path).unwrap();
        bytes.truncate(2);
        fs::write(&docs_path, bytes).unwrap();

        let retriever = Retriever::open(&store_dir).unwrap();
        let hits = retriever.search("glasnost", 10).unwrap();
        assert_eq!(hits[0].docno, "LA010189-0001");
        assert!(hits[0].date.is_none());
        assert!(hits[0].headline.is_none());
        assert!(hits[0].snippet.is_none());
    }

    #[test]
    fn document_by_id_out_of_range_is_not_found() {
        let (_dir, store_dir) = build_test_store();
        let retriever = Retriever::open(&store_dir).unwrap();
        assert_eq!(retriever.num_documents(), 3);
        assert!(matches!(retriever.document_by_id(3), Err(Error::NotFound(_))));
        assert!(retriever.document_by_id(2).is_ok());
    }

    #[test]
    fn document_by_docno_round_trips() {
        let (_dir, store_dir) = build_test_store();
        let retriever = Retriever::open(&store_dir).unwrap();
        let payload = retriever.document_by_docno("LA010289-0003").unwrap();
        assert!(payload.contains("docno: LA010289-0003"));
    }

    #[test]
    fn opening_incomplete_store_fails() {
        let dir = tempdir().unwrap();
        let result = Retriever::open(dir.path());
        assert!(matches!(result, Err(Error::StoreIncomplete(_))));
    }
}
