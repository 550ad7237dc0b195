//! Posting lists: `(doc_id, term_frequency)` pairs per term, persisted as a
//! flat JSON array `[doc0, tf0, doc1, tf1, ...]` inside each compressed
//! `inverted_index.bin` record.

use crate::error::{Error, Result};

pub type PostingList = Vec<(u32, u32)>;

/// Encodes a posting list into its on-disk flat JSON form.
pub fn encode(postings: &[(u32, u32)]) -> Result<Vec<u8>> {
    let mut flat = Vec::with_capacity(postings.len() * 2);
    for &(doc_id, tf) in postings {
        flat.push(doc_id);
        flat.push(tf);
    }
    Ok(serde_json::to_vec(&flat)?)
}

/// Decodes a flat JSON array back into `(doc_id, tf)` pairs.
pub fn decode(bytes: &[u8]) -> Result<PostingList> {
    let flat: Vec<u32> = serde_json::from_slice(bytes)?;
    if flat.len() % 2 != 0 {
        return Err(Error::Corrupt("posting list has odd element count".into()));
    }
    Ok(flat.chunks_exact(2).map(|pair| (pair[0], pair[1])).collect())
}

/// Accumulates per-term posting lists during indexing. Since documents are
/// processed in input order, appending to `lists[term_id]` keeps every list
/// sorted by ascending `doc_id` for free.
#[derive(Default)]
pub struct PostingsAccumulator {
    lists: Vec<PostingList>,
}

impl PostingsAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ensures a (possibly empty) list exists for every term_id up to and
    /// including `term_id`.
    fn ensure_capacity(&mut self, term_id: u32) {
        let needed = term_id as usize + 1;
        if self.lists.len() < needed {
            self.lists.resize_with(needed, Vec::new);
        }
    }

    pub fn record(&mut self, term_id: u32, doc_id: u32, tf: u32) {
        self.ensure_capacity(term_id);
        self.lists[term_id as usize].push((doc_id, tf));
    }

    pub fn get(&self, term_id: u32) -> &[(u32, u32)] {
        self.lists
            .get(term_id as usize)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn term_count(&self) -> usize {
        self.lists.len()
    }

    pub fn into_lists(self) -> Vec<PostingList> {
        self.lists
    }
}
