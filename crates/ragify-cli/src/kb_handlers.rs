//! Handlers for the knowledge base commands.
//!
//! Each handler works on an already opened [`KnowledgeBase`] and writes its
//! report to stdout. Rejections (a duplicate id, say) are reported, not
//! treated as errors.

use std::path::Path;

use ragify::{KnowledgeBase, KnowledgeBaseStats, Metadata, PptxDirectorySource, SearchResult};
use ragify_core::{Error, Result};

/// Parse a `--metadata` argument; no argument means `{}`.
pub fn parse_metadata(raw: Option<&str>) -> Result<Metadata> {
    match raw {
        None => Ok(Metadata::Object(Default::default())),
        Some(raw) => serde_json::from_str(raw)
            .map_err(|e| Error::parse(format!("--metadata is not valid JSON: {e}"))),
    }
}

/// `ragify add`.
pub async fn handle_add(
    kb: &KnowledgeBase,
    id: &str,
    text: &str,
    metadata: Option<&str>,
) -> Result<bool> {
    let metadata = parse_metadata(metadata)?;
    let added = kb.add_document(id, text, metadata).await?;
    if added {
        println!("Added {id}");
    } else {
        println!("Not added: {id} already exists or its metadata is not a JSON object");
    }
    Ok(added)
}

/// `ragify search`.
pub async fn handle_search(
    kb: &KnowledgeBase,
    query: &str,
    limit: usize,
    json: bool,
) -> Result<Vec<SearchResult>> {
    let results = kb.search(query, limit).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        print!("{}", format_results(&results));
    }
    Ok(results)
}

/// `ragify load`.
pub async fn handle_load(kb: &KnowledgeBase, dir: &Path) -> Result<usize> {
    let source = PptxDirectorySource::new(dir)?;
    let report = kb.load_documents_from(&source).await?;
    println!(
        "Loaded {} of {} slides from {} ({} rejected, {} failed)",
        report.added,
        report.attempted,
        dir.display(),
        report.rejected,
        report.failed
    );
    Ok(report.added)
}

/// `ragify clear`.
pub async fn handle_clear(kb: &KnowledgeBase) -> Result<()> {
    kb.clear_knowledge_base().await?;
    println!("Knowledge base cleared");
    Ok(())
}

/// `ragify stats`.
pub async fn handle_stats(kb: &KnowledgeBase) -> Result<KnowledgeBaseStats> {
    let stats = kb.stats().await?;
    println!("Documents:        {}", stats.documents);
    println!("Vectors:          {}", stats.vectors);
    if stats.orphaned_vectors > 0 {
        println!("Orphaned vectors: {}", stats.orphaned_vectors);
    }
    println!("Dimension:        {}", stats.dimension);
    println!("Provider:         {}", stats.provider);
    Ok(stats)
}

/// Human-readable rendering of ranked results.
pub fn format_results(results: &[SearchResult]) -> String {
    if results.is_empty() {
        return "No results\n".to_string();
    }

    let mut out = String::new();
    for (rank, result) in results.iter().enumerate() {
        out.push_str(&format!(
            "{}. {} (score {:.3})\n",
            rank + 1,
            result.original_id,
            result.similarity_score
        ));
        out.push_str(&format!("   {}\n", preview(&result.content, 120)));
        if result.metadata.as_object().is_some_and(|m| !m.is_empty()) {
            out.push_str(&format!("   {}\n", result.metadata));
        }
    }
    out
}

/// First `max_chars` characters of `text` on one line.
fn preview(text: &str, max_chars: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max_chars {
        return flat;
    }
    let cut: String = flat.chars().take(max_chars).collect();
    format!("{cut}...")
}
