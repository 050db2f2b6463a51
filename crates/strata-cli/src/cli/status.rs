//! Store status dashboard and retention sweep commands.

use anyhow::Result;
use console::style;

use crate::state::AppState;

/// Display the status dashboard.
///
/// Shows record counts by tier, graph shape, retention settings, and the
/// active embedding model.
pub fn status(state: &AppState, json: bool) -> Result<()> {
    let stats = state.memory.stats();
    let config = &state.config;

    if json {
        let status = serde_json::json!({
            "version": env!("CARGO_PKG_VERSION"),
            "data_dir": state.data_dir.display().to_string(),
            "stats": stats,
            "retention": {
                "hot_days": config.hot_retention_days,
                "cold_days": config.cold_retention_days,
                "granularity": config.partition_granularity,
            },
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!();
    println!("  {} Strata v{}", style("≋").bold(), env!("CARGO_PKG_VERSION"));
    println!();

    println!("  {}", style("── Records ──").dim());
    println!("  Total:      {}", style(stats.store.total).bold());
    println!("  Hot:        {}", style(stats.store.hot).red());
    println!("  Cold:       {}", style(stats.store.cold).blue());
    println!("  Partitions: {}", stats.store.partitions);
    println!();

    println!("  {}", style("── Graph ──").dim());
    println!("  Nodes: {}", stats.graph_nodes);
    println!("  Edges: {}", stats.graph_edges);
    println!();

    println!("  {}", style("── Retention ──").dim());
    println!(
        "  Hot for {} days, kept for {} days, {} partitions",
        config.hot_retention_days, config.cold_retention_days, config.partition_granularity
    );
    println!();

    println!("  {}", style("── System ──").dim());
    println!("  Data dir:  {}", style(state.data_dir.display()).dim());
    println!("  Embedding: {}", style(&stats.embedding_model).dim());
    println!();

    Ok(())
}

/// Run a retention sweep and report what changed.
pub async fn sweep(state: &mut AppState, json: bool) -> Result<()> {
    let report = state.memory.apply_retention().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    if report.is_empty() {
        println!("  {} Nothing to sweep.", style("i").blue().bold());
        return Ok(());
    }

    println!(
        "  {} Sweep complete: {} partition{} deleted ({} record{}), {} tier change{}",
        style("*").green().bold(),
        report.deleted_partitions.len(),
        if report.deleted_partitions.len() == 1 { "" } else { "s" },
        report.removed_ids.len(),
        if report.removed_ids.len() == 1 { "" } else { "s" },
        report.tier_changes,
        if report.tier_changes == 1 { "" } else { "s" }
    );
    for key in &report.deleted_partitions {
        println!("    {} {}", style("-").red(), key);
    }
    Ok(())
}
