//! End-to-end pipeline scenarios and cross-cutting invariants, run
//! against the public API the way a downstream caller would use it —
//! through `MemoryStore` and `execute_query`, never by poking at a
//! module's internals directly.

use chrono::Utc;
use chunkloom::config::Config;
use chunkloom::core::index::build_index;
use chunkloom::core::orchestrator::{execute_query, CancelToken, QueryStructureDto, TopicQueryDto};
use chunkloom::error::CoreError;
use chunkloom::store::MemoryStore;
use chunkloom::types::{Chunk, Document};

fn dto(topics: &[&str], max_chars: usize, doc_ids: Vec<i64>) -> QueryStructureDto {
    QueryStructureDto {
        version: "2.3".into(),
        account_tier: "standard".into(),
        max_chars_per_super_chunk: max_chars,
        source_type: "documents".into(),
        document_ids: doc_ids,
        collection_id: None,
        topics: topics
            .iter()
            .map(|q| TopicQueryDto { topic_id: None, question: q.to_string(), spatial_category: "auto".into() })
            .collect(),
        limit_super_chunks: false,
        max_super_chunks_per_topic: 3,
    }
}

async fn seed(store: &MemoryStore, doc_id: i64, name: &str, chunks: &[&str]) {
    store.put_document(Document { id: doc_id, name: name.into() }).await;
    let structured: Vec<Chunk> = chunks
        .iter()
        .enumerate()
        .map(|(i, c)| Chunk::new(doc_id * 100 + i as i64, doc_id, i as u32, *c))
        .collect();
    store.put_chunks(structured).await;
    let full_text = chunks.join(" ");
    store.add_vectors(doc_id, build_index(&full_text, &Config::default())).await;
}

// S1: a single topic over a single document, everything fits in one
// super chunk, only the relevant chunk is selected.
#[tokio::test]
async fn s1_single_topic_single_document_fits_in_one_super_chunk() {
    let store = MemoryStore::new();
    seed(
        &store,
        1,
        "manual.txt",
        &[
            "Install the fuel pump. The fuel line must be clean before installation.",
            "Safety procedures require goggles and gloves at all times.",
        ],
    )
    .await;

    let query = dto(&["fuel system"], 30_000, vec![1]);
    let result = execute_query(&query, &store, &Config::default(), Utc::now(), None, None)
        .await
        .unwrap();

    assert_eq!(result.super_chunks.len(), 1);
    let content = &result.super_chunks[0].content;
    assert!(content.contains("fuel pump"));
    assert!(!content.contains("goggles"));
}

// S2: two independent topics over the same document set stay isolated
// — each topic's section only contains chunks relevant to it.
#[tokio::test]
async fn s2_multiple_topics_stay_isolated() {
    let store = MemoryStore::new();
    seed(
        &store,
        1,
        "manual.txt",
        &[
            "Install the fuel pump. The fuel line must be clean before installation.",
            "Safety procedures require goggles and protective gloves at all times.",
        ],
    )
    .await;

    let query = dto(&["fuel system", "safety procedures"], 30_000, vec![1]);
    let result = execute_query(&query, &store, &Config::default(), Utc::now(), None, None)
        .await
        .unwrap();

    assert_eq!(result.topic_results.len(), 2);
    let fuel_topic = &result.topic_results[0];
    let safety_topic = &result.topic_results[1];
    assert!(fuel_topic.chunks.iter().any(|c| c.chunk.content.contains("fuel pump")));
    assert!(safety_topic.chunks.iter().any(|c| c.chunk.content.contains("goggles")));
}

// S3: a query spanning multiple documents pulls chunks from all of them.
#[tokio::test]
async fn s3_multi_document_query_pulls_from_every_document() {
    let store = MemoryStore::new();
    seed(&store, 1, "engine.txt", &["The engine fuel injector must be replaced every 40000 miles."]).await;
    seed(&store, 2, "brakes.txt", &["The brake fuel reservoir should be checked during fuel system service."]).await;

    let query = dto(&["fuel system service"], 30_000, vec![1, 2]);
    let result = execute_query(&query, &store, &Config::default(), Utc::now(), None, None)
        .await
        .unwrap();

    let all_content: String = result.super_chunks.iter().map(|s| s.content.clone()).collect();
    assert!(all_content.contains("engine.txt"));
    assert!(all_content.contains("brakes.txt"));
}

// S4: a tight max_chars_per_super_chunk forces the packer to split a
// topic section across more than one super chunk, marking the later
// ones as continuations.
#[tokio::test]
async fn s4_tight_budget_splits_into_continuations() {
    let store = MemoryStore::new();
    let big_a = "Fuel system maintenance requires draining the tank completely. ".repeat(10);
    let big_b = "Fuel system diagnostics begin with a pressure test of the line. ".repeat(10);
    let big_c = "Fuel system filters should be replaced annually for safety. ".repeat(10);
    seed(&store, 1, "manual.txt", &[&big_a, &big_b, &big_c]).await;

    let query = dto(&["fuel system"], 400, vec![1]);
    let result = execute_query(&query, &store, &Config::default(), Utc::now(), None, None)
        .await
        .unwrap();

    assert!(result.super_chunks.len() > 1, "expected the packer to split across super chunks");
    assert!(result.super_chunks[1].content.contains("(continued)"));
}

// S5: no chunk clears the relevance threshold for a nonsense topic —
// the topic's own section stays empty but the call still succeeds.
#[tokio::test]
async fn s5_irrelevant_topic_yields_no_chunks() {
    let store = MemoryStore::new();
    seed(&store, 1, "manual.txt", &["Install the fuel pump and check the fuel line."]).await;

    let query = dto(&["astrophysics and quantum gravity"], 30_000, vec![1]);
    let result = execute_query(&query, &store, &Config::default(), Utc::now(), None, None)
        .await
        .unwrap();

    assert!(result.topic_results[0].chunks.is_empty());
}

// S6: cancelling mid-run returns Cancelled, never a partial result.
#[tokio::test]
async fn s6_cancellation_never_yields_partial_output() {
    let store = MemoryStore::new();
    seed(&store, 1, "manual.txt", &["Install the fuel pump and check the fuel line."]).await;

    let query = dto(&["fuel system"], 30_000, vec![1]);
    let token = CancelToken::new();
    token.cancel();
    let err = execute_query(&query, &store, &Config::default(), Utc::now(), None, Some(&token))
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Cancelled));
}

// Invariant: running the identical query twice produces byte-identical
// output.
#[tokio::test]
async fn invariant_determinism_across_repeated_runs() {
    let store = MemoryStore::new();
    seed(&store, 1, "manual.txt", &["Install the fuel pump and check the fuel line thoroughly."]).await;
    let query = dto(&["fuel system"], 30_000, vec![1]);

    let r1 = execute_query(&query, &store, &Config::default(), Utc::now(), None, None).await.unwrap();
    let r2 = execute_query(&query, &store, &Config::default(), Utc::now(), None, None).await.unwrap();

    assert_eq!(r1.super_chunks.len(), r2.super_chunks.len());
    for (a, b) in r1.super_chunks.iter().zip(r2.super_chunks.iter()) {
        assert_eq!(a.content, b.content);
    }
}

// Invariant: within a topic section, chunks render in chronological
// (documentId, chunkNumber) order regardless of score ranking order.
#[tokio::test]
async fn invariant_chunks_render_in_chronological_order() {
    let store = MemoryStore::new();
    seed(
        &store,
        1,
        "manual.txt",
        &[
            "Fuel system overview: general background only.",
            "Fuel system fuel system fuel system step by step instructions.",
        ],
    )
    .await;

    let query = dto(&["fuel system"], 30_000, vec![1]);
    let result = execute_query(&query, &store, &Config::default(), Utc::now(), None, None)
        .await
        .unwrap();

    let content = &result.super_chunks[0].content;
    let pos_overview = content.find("general background").unwrap();
    let pos_step = content.find("step by step").unwrap();
    assert!(pos_overview < pos_step, "chunk 0 must render before chunk 1");
}

// Invariant: an unknown account tier is rejected before any retrieval
// happens.
#[tokio::test]
async fn invariant_rejects_unknown_account_tier() {
    let store = MemoryStore::new();
    seed(&store, 1, "manual.txt", &["Install the fuel pump."]).await;
    let mut query = dto(&["fuel system"], 30_000, vec![1]);
    query.account_tier = "enterprise".into();

    let err = execute_query(&query, &store, &Config::default(), Utc::now(), None, None)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::InputInvalid(_)));
}

// Invariant: a chunk matched by two topics is emitted in both topics'
// sections — duplication across topics is allowed.
#[tokio::test]
async fn invariant_shared_chunk_appears_in_every_matching_topic() {
    let store = MemoryStore::new();
    seed(
        &store,
        1,
        "manual.txt",
        &["Fuel system safety requires goggles when servicing the fuel pump."],
    )
    .await;

    let query = dto(&["fuel system", "safety goggles"], 30_000, vec![1]);
    let result = execute_query(&query, &store, &Config::default(), Utc::now(), None, None)
        .await
        .unwrap();

    assert!(!result.topic_results[0].chunks.is_empty());
    assert!(!result.topic_results[1].chunks.is_empty());
    assert_eq!(
        result.topic_results[0].chunks[0].chunk.id,
        result.topic_results[1].chunks[0].chunk.id
    );
}

// Invariant: the envelope is byte-exact — starts/ends with the fixed
// package markers and every super chunk is wrapped in its own markers.
#[tokio::test]
async fn invariant_envelope_markers_are_well_formed() {
    let store = MemoryStore::new();
    seed(&store, 1, "manual.txt", &["Install the fuel pump and check the fuel line."]).await;
    let query = dto(&["fuel system"], 30_000, vec![1]);
    let result = execute_query(&query, &store, &Config::default(), Utc::now(), None, None)
        .await
        .unwrap();

    let content = &result.super_chunks[0].content;
    assert!(content.starts_with("[[chat package]]"));
    assert!(content.contains("[[super chunk 1 of 1]]"));
    assert!(content.contains("[[/super chunk 1]]"));
    assert!(content.trim_end().ends_with("[[/chat package]]"));
}
