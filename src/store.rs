//! Compressed, offset-addressed random-access blob store.
//!
//! Used for both `docs.bin`/`offsets.bin` and `inverted_index.bin`/
//! `index_offsets.bin`: a blob file holding the concatenation of
//! independently zlib-compressed records, and a dense little-endian `u32`
//! offset table of length `N+1` where record `i` occupies
//! `[offsets[i], offsets[i+1])`.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;

use crate::error::{Error, Result};

/// Appends zlib-compressed records to a blob file while accumulating the
/// offset table; `finish` flushes both files.
pub struct BlobWriter {
    blob: BufWriter<File>,
    offsets: Vec<u32>,
    cursor: u32,
}

impl BlobWriter {
    pub fn create(blob_path: &Path) -> Result<Self> {
        let blob = BufWriter::new(File::create(blob_path)?);
        Ok(Self {
            blob,
            offsets: vec![0],
            cursor: 0,
        })
    }

    /// Compresses and appends one record, recording its offset.
    pub fn push(&mut self, record: &[u8]) -> Result<()> {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(record)?;
        let compressed = encoder.finish()?;
        self.blob.write_all(&compressed)?;
        self.cursor += compressed.len() as u32;
        self.offsets.push(self.cursor);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.offsets.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flushes the blob file and writes the offsets file.
    pub fn finish(mut self, offsets_path: &Path) -> Result<()> {
        self.blob.flush()?;
        let mut offsets_writer = BufWriter::new(File::create(offsets_path)?);
        for offset in &self.offsets {
            offsets_writer.write_u32::<LittleEndian>(*offset)?;
        }
        offsets_writer.flush()?;
        Ok(())
    }
}

/// Opens a blob/offsets pair for random-access reads.
pub struct BlobReader {
    blob: BufReader<File>,
    offsets: Vec<u32>,
}

impl BlobReader {
    pub fn open(blob_path: &Path, offsets_path: &Path) -> Result<Self> {
        let offsets = read_offsets(offsets_path)?;
        let blob = BufReader::new(File::open(blob_path)?);
        Ok(Self { blob, offsets })
    }

    pub fn len(&self) -> usize {
        self.offsets.len().saturating_sub(1)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reads and decompresses record `i`.
    pub fn read(&mut self, i: usize) -> Result<Vec<u8>> {
        if i + 1 >= self.offsets.len() {
            return Err(Error::NotFound(format!("record {}", i)));
        }
        let start = self.offsets[i] as u64;
        let end = self.offsets[i + 1] as u64;
        let len = (end - start) as usize;

        self.blob.seek(SeekFrom::Start(start))?;
        let mut compressed = vec![0u8; len];
        self.blob.read_exact(&mut compressed)?;

        let mut decoder = ZlibDecoder::new(&compressed[..]);
        let mut out = Vec::new();
        decoder
            .read_to_end(&mut out)
            .map_err(|e| Error::Corrupt(format!("record {}: {}", i, e)))?;
        Ok(out)
    }

    pub fn read_string(&mut self, i: usize) -> Result<String> {
        let bytes = self.read(i)?;
        String::from_utf8(bytes).map_err(|e| Error::Corrupt(e.to_string()))
    }
}

fn read_offsets(path: &Path) -> Result<Vec<u32>> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut offsets = Vec::new();
    loop {
        match reader.read_u32::<LittleEndian>() {
            Ok(v) => offsets.push(v),
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(Error::Io(e)),
        }
    }
    if offsets.is_empty() {
        offsets.push(0);
    }
    Ok(offsets)
}
