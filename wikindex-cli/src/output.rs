use anyhow::Result;
use clap::ValueEnum;
use serde_json::json;
use tabled::settings::Style;
use tabled::{Table, Tabled};
use wikindex::{IndexMeta, SearchResults};

/// Output format for CLI results.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table.
    Text,
    /// JSON output.
    Json,
}

/// Print search results.
pub fn print_search_results(
    query: &str,
    results: &SearchResults,
    format: OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let output = json!({
                "query": query,
                "total": results.total,
                "widened": results.widened,
                "hits": results.hits,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Text => {
            if results.is_empty() {
                println!("No results found matching \"{query}\".");
                return Ok(());
            }

            let rows: Vec<SearchHitRow> = results
                .hits
                .iter()
                .enumerate()
                .map(|(rank, hit)| SearchHitRow {
                    rank: rank + 1,
                    doc_id: hit.doc_id,
                    title: hit.title.clone(),
                    score: format_slots(&hit.score.slots()),
                })
                .collect();

            let table = Table::new(&rows).with(Style::rounded()).to_string();
            println!("{table}");
            let note = if results.widened {
                " (matched after searching all fields)"
            } else {
                ""
            };
            println!(
                "Showing {} of {} matching documents{note}.",
                results.hits.len(),
                results.total
            );
        }
    }
    Ok(())
}

/// Print index statistics.
pub fn print_stats(meta: &IndexMeta, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(meta)?);
        }
        OutputFormat::Text => {
            println!("Document count: {}", meta.total_docs);
            println!("Raw tokens:     {}", meta.raw_tokens);
            println!("Batch size:     {}", meta.batch_size);
            println!("Shard size:     {}", meta.shard_size);
            println!("Title shards:   {}", meta.title_shards);
            println!("Created at:     {} (unix time)", meta.created_at);

            let rows: Vec<FieldStatsRow> = meta
                .fields
                .iter()
                .map(|(field, stats)| FieldStatsRow {
                    field: field.to_string(),
                    unique_terms: stats.unique_terms,
                    shards: stats.shards,
                    postings: stats.postings,
                })
                .collect();

            let table = Table::new(&rows).with(Style::rounded()).to_string();
            println!("\nFields:\n{table}");
        }
    }
    Ok(())
}

// --- Helper types and functions ---

#[derive(Tabled)]
struct SearchHitRow {
    #[tabled(rename = "#")]
    rank: usize,
    #[tabled(rename = "Doc Id")]
    doc_id: u32,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Relevance")]
    score: String,
}

#[derive(Tabled)]
struct FieldStatsRow {
    #[tabled(rename = "Field")]
    field: String,
    #[tabled(rename = "Unique terms")]
    unique_terms: u64,
    #[tabled(rename = "Shards")]
    shards: usize,
    #[tabled(rename = "Postings")]
    postings: u64,
}

/// Render a relevance vector as `[2 1 2 0 0 0 1 | 3.5012]`.
fn format_slots(slots: &[f64]) -> String {
    let counts: Vec<String> = slots[..slots.len() - 1]
        .iter()
        .map(|v| format!("{v:.0}"))
        .collect();
    format!("[{} | {:.4}]", counts.join(" "), slots[slots.len() - 1])
}
