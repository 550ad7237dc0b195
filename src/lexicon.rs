//! Dense term -> term_id lexicon, persisted as JSON.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::path::Path;

use crate::error::Result;

/// Bijective term dictionary. `term_id` is assigned in first-seen order, so
/// it doubles as the index into the posting-list offset table.
#[derive(Default)]
pub struct Lexicon {
    ids: HashMap<String, u32>,
}

impl Lexicon {
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up `term`, inserting it with the next dense id if absent.
    pub fn intern(&mut self, term: &str) -> u32 {
        if let Some(&id) = self.ids.get(term) {
            return id;
        }
        let id = self.ids.len() as u32;
        self.ids.insert(term.to_string(), id);
        id
    }

    pub fn get(&self, term: &str) -> Option<u32> {
        self.ids.get(term).copied()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn write<W: Write>(&self, writer: W) -> Result<()> {
        serde_json::to_writer(writer, &self.ids)?;
        Ok(())
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let file = std::fs::File::create(path)?;
        self.write(std::io::BufWriter::new(file))
    }

    pub fn read<R: Read>(reader: R) -> Result<Self> {
        let ids: HashMap<String, u32> = serde_json::from_reader(reader)?;
        Ok(Self { ids })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Self::read(std::io::BufReader::new(file))
    }
}
