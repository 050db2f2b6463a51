//! Similarity and graph CLI commands: query, trace, relate.

use anyhow::{Result, bail};
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;

use strata_types::graph::EdgeType;
use strata_types::memory::QueryOptions;

use super::FilterArgs;
use super::memory::{preview, tier_label};
use crate::state::AppState;

/// Rank records against a text or a raw vector.
///
/// # Examples
///
/// ```bash
/// strata query "how often do keys rotate" -k 3
/// strata query --vector 1,0,0 --include-cold --json
/// ```
pub async fn query(
    state: &AppState,
    text: Option<&str>,
    vector: Option<Vec<f32>>,
    top_k: usize,
    filter: &FilterArgs,
    json: bool,
) -> Result<()> {
    let options = QueryOptions {
        top_k,
        filter: filter.to_list_options()?,
    };

    let hits = match (text, vector) {
        (_, Some(vector)) => state.memory.query_embedding(&vector, &options),
        (Some(text), None) => state.memory.query_by_text(text, &options).await,
        (None, None) => bail!("Provide a query text or --vector"),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&hits)?);
        return Ok(());
    }

    if hits.is_empty() {
        println!();
        println!("  {} No matching records.", style("i").blue().bold());
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("#").fg(Color::White),
        Cell::new("Id").fg(Color::White),
        Cell::new("Similarity").fg(Color::White),
        Cell::new("Tier").fg(Color::White),
        Cell::new("Neighbors").fg(Color::White),
        Cell::new("Text").fg(Color::White),
    ]);

    for (rank, hit) in hits.iter().enumerate() {
        let record = &hit.scored.record;
        table.add_row(vec![
            Cell::new(rank + 1).fg(Color::DarkGrey),
            Cell::new(&record.id).fg(Color::Cyan),
            Cell::new(format!("{:.4}", hit.scored.similarity)).fg(Color::Yellow),
            Cell::new(record.tier.to_string()),
            Cell::new(hit.neighbors.len()).fg(Color::DarkGrey),
            Cell::new(preview(record)),
        ]);
    }

    println!();
    println!("{table}");
    println!();
    Ok(())
}

/// Print the lineage of a record.
pub fn trace(state: &AppState, id: &str, depth: Option<usize>, json: bool) -> Result<()> {
    let trace = state.memory.trace_lineage(id, depth);

    if json {
        println!("{}", serde_json::to_string_pretty(&trace)?);
        return Ok(());
    }

    let Some(root) = &trace.root else {
        println!();
        println!(
            "  {} No record '{}' to trace from.",
            style("i").blue().bold(),
            style(id).cyan()
        );
        println!();
        return Ok(());
    };

    println!();
    println!(
        "  Lineage of '{}' ({})",
        style(&root.id).cyan().bold(),
        tier_label(root.tier)
    );
    println!();
    if trace.edges.is_empty() {
        println!("  {}", style("no related records").dim());
    }
    for edge in &trace.edges {
        let kind = match edge.edge.edge_type {
            EdgeType::Similarity => style("similarity").dim().to_string(),
            EdgeType::Manual => style("manual").magenta().to_string(),
        };
        println!(
            "  {} {} {} ({kind}, {:.3})",
            edge.source,
            style("→").dim(),
            style(&edge.edge.target).cyan(),
            edge.edge.weight
        );
    }
    println!();
    println!(
        "  {} node{}, {} edge{}",
        style(trace.nodes.len()).bold(),
        if trace.nodes.len() == 1 { "" } else { "s" },
        style(trace.edges.len()).bold(),
        if trace.edges.len() == 1 { "" } else { "s" }
    );
    println!();
    Ok(())
}

/// Link two records.
///
/// # Examples
///
/// ```bash
/// strata relate incident-42 postmortem-42 --weight 0.9
/// ```
pub async fn relate(
    state: &mut AppState,
    a: &str,
    b: &str,
    weight: f32,
    edge_type: EdgeType,
    json: bool,
) -> Result<()> {
    if !weight.is_finite() {
        bail!("Weight must be a finite number");
    }

    let linked = state
        .memory
        .register_relationship(a, b, weight, Some(edge_type))
        .await?;

    if json {
        println!(
            "{}",
            serde_json::json!({ "a": a, "b": b, "type": edge_type, "weight": weight, "linked": linked })
        );
        return Ok(());
    }

    if linked {
        println!(
            "  {} Linked '{}' ↔ '{}' ({edge_type}, {weight})",
            style("*").green().bold(),
            style(a).cyan(),
            style(b).cyan()
        );
    } else {
        println!(
            "  {} Both records must exist to be linked.",
            style("!").yellow().bold()
        );
    }
    Ok(())
}
