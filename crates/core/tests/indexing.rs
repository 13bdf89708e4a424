mod common;

use assistant_core::composer::Composer;
use assistant_core::embeddings::Embedder;
use assistant_core::indexer::{
    render_catalog_text, render_knowledge_text, BuildError, IndexBuilder,
};
use assistant_core::models::{ClassificationLabel, RecordKind};
use assistant_core::records::StaticRecordSource;
use assistant_core::search::{RetrievalOutcome, Retriever};
use assistant_core::vectorstore::VectorIndex;
use assistant_core::search::TOP_K;
use common::{catalog, item, knowledge, FailingEmbedder, KeywordEmbedder};
use std::sync::atomic::Ordering;
use std::sync::Arc;

fn keyword_embedder() -> Embedder {
    Embedder::new("keywords", Arc::new(KeywordEmbedder::default()))
}

#[tokio::test]
async fn index_rows_line_up_with_records() {
    let embedder = keyword_embedder();
    let source = StaticRecordSource {
        catalog: catalog(),
        knowledge: knowledge(),
    };
    let indexes = IndexBuilder::new(&embedder).build(&source).await.unwrap();

    let cat = indexes.catalog().unwrap();
    assert_eq!(cat.index().len(), source.catalog.len());
    assert_eq!(cat.records(), source.catalog.as_slice());
    for (i, item) in source.catalog.iter().enumerate() {
        let expected = KeywordEmbedder::vector(&render_catalog_text(item));
        assert_eq!(cat.index().vector(i).unwrap(), expected.as_slice());
    }

    let kb = indexes.knowledge().unwrap();
    assert_eq!(kb.index().len(), source.knowledge.len());
    for (i, entry) in source.knowledge.iter().enumerate() {
        let expected = KeywordEmbedder::vector(&render_knowledge_text(entry));
        assert_eq!(kb.index().vector(i).unwrap(), expected.as_slice());
    }
}

#[tokio::test]
async fn small_batches_keep_record_order() {
    let provider = Arc::new(KeywordEmbedder::default());
    let embedder = Embedder::new("keywords", provider.clone());
    let source = StaticRecordSource {
        catalog: catalog(),
        knowledge: vec![],
    };
    let indexes = IndexBuilder::new(&embedder)
        .with_batch_size(3)
        .build(&source)
        .await
        .unwrap();

    assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    assert_eq!(provider.texts_seen.load(Ordering::SeqCst), 4);
    let cat = indexes.catalog().unwrap();
    let last = KeywordEmbedder::vector(&render_catalog_text(&source.catalog[3]));
    assert_eq!(cat.index().vector(3).unwrap(), last.as_slice());
    assert!(indexes.knowledge().is_none());
    assert_eq!(indexes.size(RecordKind::Knowledge), None);
}

#[tokio::test]
async fn building_with_no_records_fails() {
    let embedder = keyword_embedder();
    let err = IndexBuilder::new(&embedder)
        .build(&StaticRecordSource::default())
        .await
        .unwrap_err();
    assert!(matches!(err, BuildError::NoData));
}

#[tokio::test]
async fn embedding_failure_is_fatal_to_the_build() {
    let embedder = Embedder::new("down", Arc::new(FailingEmbedder));
    let err = IndexBuilder::new(&embedder)
        .build(&StaticRecordSource {
            catalog: catalog(),
            knowledge: vec![],
        })
        .await
        .unwrap_err();
    assert!(matches!(err, BuildError::Embedding(_)));
}

#[tokio::test]
async fn retrieval_returns_at_most_three_valid_sorted_positions() {
    let embedder = keyword_embedder();
    let source = StaticRecordSource {
        catalog: catalog(),
        knowledge: knowledge(),
    };
    let indexes = IndexBuilder::new(&embedder).build(&source).await.unwrap();
    let retriever = Retriever::new(&indexes, &embedder);

    let outcome = retriever
        .retrieve("Tell me about mango", ClassificationLabel::Catalog)
        .await
        .unwrap();
    let RetrievalOutcome::Matches { kind, hits } = &outcome else {
        panic!("expected matches, got {outcome:?}");
    };
    assert_eq!(*kind, RecordKind::Catalog);
    assert_eq!(hits.len(), 3);
    assert!(hits.iter().all(|h| h.position < source.catalog.len()));
    assert!(hits.windows(2).all(|w| w[0].distance <= w[1].distance));
    // "Mango" and "Mango Juice" tie; construction order decides.
    assert_eq!(hits[0].position, 1);
    assert_eq!(hits[1].position, 3);

    let context = Composer::new(&indexes).context_for(&outcome);
    assert!(context.starts_with("Product: Mango\n"));
    assert_eq!(context.matches("Product: ").count(), 3);
    assert!(context.contains("\n\nProduct: Mango Juice\n"));
}

#[tokio::test]
async fn fewer_records_than_k_skips_invalid_slots() {
    let embedder = keyword_embedder();
    let indexes = IndexBuilder::new(&embedder)
        .build(&StaticRecordSource {
            catalog: vec![],
            knowledge: knowledge(),
        })
        .await
        .unwrap();

    let outcome = Retriever::new(&indexes, &embedder)
        .retrieve("What is your return policy?", ClassificationLabel::Knowledge)
        .await
        .unwrap();
    match outcome {
        RetrievalOutcome::Matches { hits, .. } => {
            assert_eq!(hits.len(), 2);
            assert_eq!(hits[0].position, 0);
        }
        other => panic!("expected matches, got {other:?}"),
    }

    let none = Retriever::new(&indexes, &embedder)
        .retrieve("Tell me about mango", ClassificationLabel::Catalog)
        .await
        .unwrap();
    assert_eq!(none, RetrievalOutcome::NoDataForDomain(RecordKind::Catalog));

    let unclassified = Retriever::new(&indexes, &embedder)
        .retrieve("anything", ClassificationLabel::Unknown)
        .await
        .unwrap();
    assert_eq!(unclassified, RetrievalOutcome::Unclassified);
}

#[tokio::test]
async fn many_equal_matches_are_capped_at_three() {
    let embedder = keyword_embedder();
    let mangoes: Vec<_> = (1..=6)
        .map(|i| item(&format!("Mango {i}"), "Sweet tropical fruit", "Fruit", 100.0))
        .collect();
    let indexes = IndexBuilder::new(&embedder)
        .build(&StaticRecordSource {
            catalog: mangoes,
            knowledge: vec![],
        })
        .await
        .unwrap();

    let outcome = Retriever::new(&indexes, &embedder)
        .retrieve("mango", ClassificationLabel::Catalog)
        .await
        .unwrap();
    match outcome {
        RetrievalOutcome::Matches { hits, .. } => {
            assert_eq!(TOP_K, 3);
            assert_eq!(hits.len(), 3);
            let positions: Vec<usize> = hits.iter().map(|h| h.position).collect();
            assert_eq!(positions, vec![0, 1, 2]);
        }
        other => panic!("expected matches, got {other:?}"),
    }
}
