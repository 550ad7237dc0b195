//! End-to-end indexer -> retriever tests against the spec's seed corpus.

use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use tempfile::TempDir;

use newsdex::error::Error;
use newsdex::index::{build_index, IndexerConfig};
use newsdex::retrieve::Retriever;
use newsdex::tokenize::IdentityStemmer;

const CORPUS: &str = "\
<DOC>
<DOCNO> LA010189-0001 </DOCNO>
<HEADLINE>
Soviets Weigh New Course
</HEADLINE>
<TEXT>
Western leaders watched closely as the new policy took shape.
</TEXT>
</DOC>
<DOC>
<DOCNO> LA010189-0002 </DOCNO>
<HEADLINE>
Glasnost Spreads
</HEADLINE>
<TEXT>
glasnost glasnost glasnost glasnost glasnost glasnost glasnost glasnost glasnost glasnost
</TEXT>
</DOC>
<DOC>
<DOCNO> LA010289-0003 </DOCNO>
<HEADLINE>
Local Sports Roundup
</HEADLINE>
<TEXT>
glasnost appears just once amid routine sports coverage today
</TEXT>
</DOC>
";

fn build_seed_store() -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let archive_path = dir.path().join("corpus.gz");
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(CORPUS.as_bytes()).unwrap();
    fs::write(&archive_path, encoder.finish().unwrap()).unwrap();

    let store_dir = dir.path().join("store");
    let config = IndexerConfig {
        stemmer: Box::new(IdentityStemmer),
    };
    build_index(&archive_path, &store_dir, &config).unwrap();
    (dir, store_dir)
}

#[test]
fn scenario_1_absent_term_returns_empty_result() {
    let (_dir, store_dir) = build_seed_store();
    let retriever = Retriever::open(&store_dir).unwrap();
    let result = retriever.search("gorbachev", 10);
    assert!(matches!(result, Err(Error::EmptyResult)));
}

#[test]
fn scenario_2_single_matching_document_ranks_first() {
    let (_dir, store_dir) = build_seed_store();
    let retriever = Retriever::open(&store_dir).unwrap();
    let hits = retriever.search("western", 10).unwrap();
    assert_eq!(hits[0].rank, 1);
    assert_eq!(hits[0].docno, "LA010189-0001");
}

#[test]
fn scenario_3_higher_term_frequency_outranks_lower() {
    let (_dir, store_dir) = build_seed_store();
    let retriever = Retriever::open(&store_dir).unwrap();
    let hits = retriever.search("glasnost", 10).unwrap();
    assert_eq!(hits[0].docno, "LA010189-0002");
    assert_eq!(hits[1].docno, "LA010289-0003");
}

#[test]
fn scenario_4_document_id_at_n_is_not_found_n_minus_one_succeeds() {
    let (_dir, store_dir) = build_seed_store();
    let retriever = Retriever::open(&store_dir).unwrap();
    assert_eq!(retriever.num_documents(), 3);
    assert!(matches!(retriever.document_by_id(3), Err(Error::NotFound(_))));
    assert!(retriever.document_by_id(2).is_ok());
}

#[test]
fn scenario_5_indexing_into_existing_directory_fails_without_modifying_it() {
    let dir = tempfile::tempdir().unwrap();
    let archive_path = dir.path().join("corpus.gz");
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(CORPUS.as_bytes()).unwrap();
    fs::write(&archive_path, encoder.finish().unwrap()).unwrap();

    let store_dir = dir.path().join("store");
    fs::create_dir_all(&store_dir).unwrap();
    fs::write(store_dir.join("sentinel.txt"), b"untouched").unwrap();

    let result = build_index(&archive_path, &store_dir, &IndexerConfig::default());
    assert!(matches!(result, Err(Error::StoreExists(_))));
    assert!(store_dir.join("sentinel.txt").exists());
    assert!(!store_dir.join("docs.bin").exists());
}

#[test]
fn search_decorates_top_ten_with_date_and_headline() {
    let (_dir, store_dir) = build_seed_store();
    let retriever = Retriever::open(&store_dir).unwrap();
    let hits = retriever.search("glasnost", 10).unwrap();
    assert_eq!(hits[0].date.as_deref(), Some("Jan 01, 1989"));
    assert_eq!(hits[0].headline.as_deref(), Some("Glasnost Spreads"));
}

#[test]
fn document_lookup_by_docno_matches_lookup_by_id() {
    let (_dir, store_dir) = build_seed_store();
    let retriever = Retriever::open(&store_dir).unwrap();
    let by_id = retriever.document_by_id(1).unwrap();
    let by_docno = retriever.document_by_docno("LA010189-0002").unwrap();
    assert_eq!(by_id, by_docno);
}
