//! Documents and vectors stay in one-to-one correspondence across any
//! interleaving of adds and clears.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use proptest::prelude::*;
use ragify::{HashEmbeddingProvider, KnowledgeBase};
use serde_json::json;
use tempfile::TempDir;

#[derive(Debug, Clone)]
enum Op {
    Add { id: u8, content: String },
    Clear,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        6 => (0u8..12, "[a-z]{2,8}( [a-z]{2,8}){0,3}")
            .prop_map(|(id, content)| Op::Add { id, content }),
        1 => Just(Op::Clear),
    ]
}

async fn check(kb: &KnowledgeBase, expected: &HashMap<String, String>) {
    let stats = kb.stats().await.unwrap();
    assert_eq!(stats.documents, expected.len());
    assert_eq!(stats.vectors, expected.len());
    assert_eq!(stats.orphaned_vectors, 0);

    // Every live slot resolves to exactly one record.
    let results = kb.search("probe query", stats.vectors + 5).await.unwrap();
    assert_eq!(results.len(), expected.len());

    let slots: HashSet<u64> = results.iter().map(|r| r.vector_slot).collect();
    assert_eq!(slots.len(), results.len());
    assert!(slots.iter().all(|&s| (s as usize) < stats.vectors));

    for result in &results {
        assert_eq!(expected.get(&result.original_id), Some(&result.content));
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn adds_and_clears_keep_stores_in_step(ops in proptest::collection::vec(op(), 1..30)) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        runtime.block_on(async {
            let dir = TempDir::new().unwrap();
            let kb = KnowledgeBase::open(
                dir.path().join("documents.redb"),
                dir.path().join("vectors.idx"),
                Arc::new(HashEmbeddingProvider::new(32)),
            )
            .unwrap();

            let mut expected: HashMap<String, String> = HashMap::new();
            for op in ops {
                match op {
                    Op::Add { id, content } => {
                        let id = format!("doc-{id}");
                        let added = kb.add_document(&id, &content, json!({})).await.unwrap();
                        assert_eq!(added, !expected.contains_key(&id));
                        expected.entry(id).or_insert(content);
                    }
                    Op::Clear => {
                        kb.clear_knowledge_base().await.unwrap();
                        expected.clear();
                    }
                }
                check(&kb, &expected).await;
            }
        });
    }
}
