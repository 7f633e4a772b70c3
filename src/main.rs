//! Standalone ingestion command.
//!
//! Run whenever new documents land in `data/raw/`. Exits 0 on success,
//! including the "no documents found" case; exits non-zero when ingestion
//! itself fails.

use anyhow::Context;

use askdocs::core::config::{AppPaths, Settings};
use askdocs::rag::RagPipeline;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let paths = AppPaths::new();
    askdocs::logging::init(&paths);

    let settings = Settings::load(&paths.data_dir.join("config.yml"))
        .context("Failed to load configuration")?;

    tracing::info!("Starting document ingestion process...");
    tracing::info!("Raw documents directory: {}", paths.raw_dir.display());

    let pipeline = RagPipeline::new(settings, &paths)
        .await
        .context("Failed to open the vector collection")?;

    match pipeline
        .ingest_documents()
        .await
        .context("Document ingestion failed")?
    {
        Some(report) => {
            tracing::info!(
                "Ingestion complete: {} document(s), {} chunk(s) added, {} chunk(s) total",
                report.documents,
                report.chunks_added,
                report.total_chunks
            );
            tracing::info!("You can now query your documents.");
        }
        None => {
            tracing::warn!(
                "No documents were processed. Check that documents exist in {}",
                paths.raw_dir.display()
            );
        }
    }

    Ok(())
}
