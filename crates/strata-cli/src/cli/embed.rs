//! Embedding inspection command.

use anyhow::Result;
use console::style;

use crate::state::AppState;

/// Print the vectors produced for `texts`.
///
/// Provider failures fall back to hash vectors per text, so this always
/// prints one vector per input.
pub async fn embed(state: &AppState, texts: &[String], json: bool) -> Result<()> {
    let vectors = if texts.len() == 1 {
        vec![state.memory.get_embedding(&texts[0]).await]
    } else {
        state.memory.get_batch_embeddings(texts).await
    };

    if json {
        let out: Vec<_> = texts
            .iter()
            .zip(&vectors)
            .map(|(text, vector)| serde_json::json!({ "text": text, "vector": vector }))
            .collect();
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!();
    println!(
        "  Model: {} ({} dimensions)",
        style(state.memory.embeddings().model_name()).cyan(),
        state.memory.embeddings().dimension()
    );
    println!();
    for (text, vector) in texts.iter().zip(&vectors) {
        let head: Vec<String> = vector.iter().take(6).map(|v| format!("{v:.4}")).collect();
        println!(
            "  {} [{}{}]",
            style(super::truncate(text, 40)).bold(),
            head.join(", "),
            if vector.len() > 6 { ", ..." } else { "" }
        );
    }
    println!();
    Ok(())
}
