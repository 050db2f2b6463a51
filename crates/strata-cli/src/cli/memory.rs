//! Record CLI commands: add, add-vector, list, get, ids, slice.

use anyhow::{Context, Result, bail};
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;
use uuid::Uuid;

use strata_core::memory::timestamp::format_iso;
use strata_types::memory::{ListOptions, Tier, VectorRecord};

use super::{FilterArgs, parse_metadata, parse_time, truncate};
use crate::state::AppState;

/// Embed and store a text.
///
/// # Examples
///
/// ```bash
/// strata add "the deploy key rotates monthly" --meta source=runbook
/// strata add "retry budget is 3" --id ops-retry
/// ```
pub async fn add_document(
    state: &mut AppState,
    id: Option<String>,
    text: &str,
    meta: &[String],
    json: bool,
) -> Result<()> {
    let metadata = parse_metadata(meta)?;
    let id = id.unwrap_or_else(|| Uuid::now_v7().to_string());

    state
        .memory
        .add_document(id.clone(), text, Some(metadata))
        .await
        .with_context(|| format!("Failed to store '{id}'"))?;

    print_stored(state, &id, json)
}

/// Store a caller-supplied vector.
///
/// # Examples
///
/// ```bash
/// strata add-vector doc-1 --vector 0.1,0.2,0.3 --timestamp 2026-01-15T09:00:00Z
/// ```
pub async fn add_vector(
    state: &mut AppState,
    id: &str,
    vector: Vec<f32>,
    timestamp: Option<&str>,
    meta: &[String],
    json: bool,
) -> Result<()> {
    let metadata = parse_metadata(meta)?;
    let timestamp = timestamp.map(parse_time).transpose()?;

    state
        .memory
        .add_embedding(id, vector, metadata, timestamp)
        .await
        .with_context(|| format!("Failed to store '{id}'"))?;

    print_stored(state, id, json)
}

fn print_stored(state: &AppState, id: &str, json: bool) -> Result<()> {
    let Some(record) = state.memory.get_item(id) else {
        // Written and immediately swept: older than the cold horizon.
        if json {
            println!("{}", serde_json::json!({ "id": id, "stored": false }));
        } else {
            println!(
                "  {} '{}' is older than the retention window and was not kept.",
                style("!").yellow().bold(),
                style(id).cyan()
            );
        }
        return Ok(());
    };

    if json {
        println!("{}", serde_json::to_string_pretty(record)?);
        return Ok(());
    }

    let neighbors = state.memory.graph().neighbors(id).len();
    println!(
        "  {} Stored '{}' in partition {} ({}, {} neighbor{})",
        style("*").green().bold(),
        style(id).cyan(),
        style(&record.partition).bold(),
        tier_label(record.tier),
        neighbors,
        if neighbors == 1 { "" } else { "s" }
    );
    Ok(())
}

/// List records without ranking.
pub fn list_items(state: &AppState, filter: &FilterArgs, json: bool) -> Result<()> {
    let options = filter.to_list_options()?;
    let mut records = state.memory.list_items(&options);
    records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    print_records(&records, json, "No records match.")
}

/// Show one record in full.
pub fn get_item(state: &AppState, id: &str, json: bool) -> Result<()> {
    let Some(record) = state.memory.get_item(id) else {
        bail!("Record '{id}' not found");
    };

    if json {
        println!("{}", serde_json::to_string_pretty(record)?);
        return Ok(());
    }

    println!();
    println!("  {}", style(&record.id).cyan().bold());
    println!();
    println!("  Time:      {}", format_iso(record.timestamp));
    println!("  Partition: {}", record.partition);
    println!("  Tier:      {}", tier_label(record.tier));
    println!("  Dimension: {}", record.vector.len());
    if !record.metadata.is_empty() {
        println!();
        println!("  {}", style("── Metadata ──").dim());
        for (key, value) in &record.metadata {
            println!("  {key}: {value}");
        }
    }

    let neighbors = state.memory.graph().neighbors(id);
    if !neighbors.is_empty() {
        println!();
        println!("  {}", style("── Neighbors ──").dim());
        for edge in neighbors {
            println!(
                "  {} {} ({}, {:.3})",
                style("→").dim(),
                edge.target,
                edge.edge_type,
                edge.weight
            );
        }
    }
    println!();
    Ok(())
}

/// Print every stored id, one per line.
pub fn list_ids(state: &AppState, json: bool) -> Result<()> {
    let mut ids = state.memory.get_all_ids();
    ids.sort();
    if json {
        println!("{}", serde_json::to_string_pretty(&ids)?);
    } else {
        for id in ids {
            println!("{id}");
        }
    }
    Ok(())
}

/// Records within `[start, end]`.
pub fn slice(state: &AppState, start: &str, end: &str, include_cold: bool, json: bool) -> Result<()> {
    let start = parse_time(start)?;
    let end = parse_time(end)?;
    if start > end {
        bail!("Window start is after its end");
    }

    let options = ListOptions {
        include_cold,
        ..ListOptions::default()
    };
    let mut records = state.memory.get_temporal_slice(start, end, &options);
    records.sort_by_key(|r| r.timestamp);
    print_records(&records, json, "No records in that window.")
}

pub(crate) fn tier_label(tier: Tier) -> String {
    match tier {
        Tier::Hot => style("hot").red().to_string(),
        Tier::Cold => style("cold").blue().to_string(),
    }
}

/// A short preview of a record: its `text` metadata if present.
pub(crate) fn preview(record: &VectorRecord) -> String {
    record
        .metadata
        .get("text")
        .and_then(|v| v.as_str())
        .map(|t| truncate(t, 50))
        .unwrap_or_default()
}

fn print_records(records: &[VectorRecord], json: bool, empty_message: &str) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(records)?);
        return Ok(());
    }

    if records.is_empty() {
        println!();
        println!("  {} {empty_message}", style("i").blue().bold());
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Id").fg(Color::White),
        Cell::new("Time").fg(Color::White),
        Cell::new("Tier").fg(Color::White),
        Cell::new("Partition").fg(Color::White),
        Cell::new("Text").fg(Color::White),
    ]);

    for record in records {
        let tier = match record.tier {
            Tier::Hot => Cell::new("hot").fg(Color::Red),
            Tier::Cold => Cell::new("cold").fg(Color::Blue),
        };
        table.add_row(vec![
            Cell::new(truncate(&record.id, 24)).fg(Color::Cyan),
            Cell::new(format_iso(record.timestamp)).fg(Color::DarkGrey),
            tier,
            Cell::new(&record.partition).fg(Color::DarkGrey),
            Cell::new(preview(record)),
        ]);
    }

    println!();
    println!("{table}");
    println!();
    println!(
        "  {} record{}",
        style(records.len()).bold(),
        if records.len() == 1 { "" } else { "s" }
    );
    println!();
    Ok(())
}
