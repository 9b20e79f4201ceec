//! Search command handler.

use std::process::ExitCode;

use color_eyre::Result;

use crate::services::ContextualRetriever;

use super::App;

impl App {
    /// Print the top-k contextual retrieval results for a topic.
    pub async fn run_search(&self, topic: &str, k: usize, json: bool) -> Result<ExitCode> {
        let ctx = self.open_context().await?;
        let retriever: ContextualRetriever = ctx.resolve();
        let results = retriever.retrieve(topic, k).await?;

        if json {
            println!("{}", serde_json::to_string_pretty(&results)?);
            return Ok(ExitCode::SUCCESS);
        }

        if results.is_empty() {
            println!("No functions found for '{}'", topic);
        }
        for (rank, result) in results.iter().enumerate() {
            println!(
                "{}. {} ({}) score {:.3}",
                rank + 1,
                result.function.name,
                result.function.filename,
                result.score
            );
            let callers = if result.callers.is_empty() {
                "(none)".to_string()
            } else {
                result.callers.join(", ")
            };
            println!("   callers: {}", callers);
        }

        Ok(ExitCode::SUCCESS)
    }
}
