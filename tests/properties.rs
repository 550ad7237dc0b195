//! Property-based tests for the round-trip and ranking laws.

use newsdex::postings;
use newsdex::scorer::{Bm25Scorer, Scorer};
use newsdex::store::{BlobReader, BlobWriter};
use proptest::prelude::*;
use tempfile::tempdir;

proptest! {
    #[test]
    fn blob_store_round_trips_arbitrary_records(records in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..200), 0..20)) {
        let dir = tempdir().unwrap();
        let blob_path = dir.path().join("blob.bin");
        let offsets_path = dir.path().join("offsets.bin");

        let mut writer = BlobWriter::create(&blob_path).unwrap();
        for record in &records {
            writer.push(record).unwrap();
        }
        writer.finish(&offsets_path).unwrap();

        let mut reader = BlobReader::open(&blob_path, &offsets_path).unwrap();
        prop_assert_eq!(reader.len(), records.len());
        for (i, expected) in records.iter().enumerate() {
            let actual = reader.read(i).unwrap();
            prop_assert_eq!(&actual, expected);
        }
    }

    #[test]
    fn posting_list_encode_decode_round_trips(pairs in prop::collection::vec((any::<u32>(), 1u32..1000), 0..50)) {
        let bytes = postings::encode(&pairs).unwrap();
        let decoded = postings::decode(&bytes).unwrap();
        prop_assert_eq!(pairs, decoded);
    }

    #[test]
    fn bm25_score_is_monotonic_in_term_frequency(
        tf_low in 1u32..50,
        extra in 1u32..50,
        df in 1u32..20,
        doc_len in 1u32..500,
        avg_len in 1.0f32..500.0,
        num_docs in 21u32..1000,
    ) {
        let scorer = Bm25Scorer::default();
        let low = scorer.score_term(tf_low, df, doc_len, avg_len, num_docs);
        let high = scorer.score_term(tf_low + extra, df, doc_len, avg_len, num_docs);
        prop_assert!(high >= low);
    }

    #[test]
    fn bm25_score_is_monotonic_in_document_frequency(
        tf in 1u32..50,
        df_low in 1u32..20,
        extra in 1u32..20,
        doc_len in 1u32..500,
        avg_len in 1.0f32..500.0,
    ) {
        let scorer = Bm25Scorer::default();
        let num_docs = df_low + extra + 100;
        let common = scorer.score_term(tf, df_low + extra, doc_len, avg_len, num_docs);
        let rare = scorer.score_term(tf, df_low, doc_len, avg_len, num_docs);
        prop_assert!(rare >= common);
    }
}
