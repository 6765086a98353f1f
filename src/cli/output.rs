//! Output formatting helpers for CLI commands

use crate::monitor::RequestStats;
use crate::store::{AppState, TicketTotals};
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};
use serde_json::json;

fn table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(header);
    table
}

fn totals_row(label: &str, totals: &TicketTotals) -> Vec<Cell> {
    vec![
        Cell::new(label),
        Cell::new(totals.new),
        Cell::new(totals.in_progress),
        Cell::new(totals.pending),
        Cell::new(totals.resolved),
        Cell::new(totals.closed),
        Cell::new(totals.total),
    ]
}

/// Format the dashboard state as tables with a status line.
pub fn format_dashboard(state: &AppState) -> String {
    let mut sections = Vec::new();

    let status = match (&state.error, state.last_updated) {
        (Some(error), _) => format!("{} {}", "✗".red(), error.as_str().red()),
        (None, Some(at)) => format!(
            "{} Updated {}",
            "✓".green(),
            at.format("%Y-%m-%d %H:%M:%S UTC")
        ),
        (None, None) => "No data yet".yellow().to_string(),
    };
    sections.push(status);

    let Some(data) = &state.dashboard_data else {
        return sections.join("\n");
    };

    let mut totals = table(vec![
        "Level",
        "New",
        "In progress",
        "Pending",
        "Resolved",
        "Closed",
        "Total",
    ]);
    for (level, level_totals) in &data.by_level {
        totals.add_row(totals_row(level, level_totals));
    }
    totals.add_row(totals_row("All", &data.totals));
    sections.push(totals.to_string());

    if !data.technician_ranking.is_empty() {
        let mut ranking = table(vec!["#", "Technician", "Level", "Resolved", "Total"]);
        for (position, tech) in data.technician_ranking.iter().enumerate() {
            ranking.add_row(vec![
                Cell::new(position + 1),
                Cell::new(&tech.name),
                Cell::new(tech.level.as_deref().unwrap_or("-")),
                Cell::new(tech.resolved),
                Cell::new(tech.total),
            ]);
        }
        sections.push(ranking.to_string());
    }

    let cache = &state.cache;
    if cache.enabled {
        sections.push(format!(
            "Cache: {} hits, {} misses, {} entries ({:.0}% hit rate)",
            cache.stats.hits,
            cache.stats.misses,
            cache.stats.size,
            cache.stats.hit_rate() * 100.0
        ));
    } else {
        sections.push("Cache: disabled".dimmed().to_string());
    }

    sections.join("\n")
}

/// Format request statistics as a table
pub fn format_stats_table(stats: &RequestStats) -> String {
    let mut summary = table(vec!["Metric", "Value"]);
    summary.add_row(vec![Cell::new("Total requests"), Cell::new(stats.total_requests)]);
    summary.add_row(vec![Cell::new("Successful"), Cell::new(stats.successful_requests)]);
    summary.add_row(vec![Cell::new("Failed"), Cell::new(stats.failed_requests)]);
    summary.add_row(vec![Cell::new("Served from cache"), Cell::new(stats.cached_requests)]);
    summary.add_row(vec![
        Cell::new("Error rate"),
        Cell::new(format!("{:.1}%", stats.error_rate * 100.0)),
    ]);
    summary.add_row(vec![
        Cell::new("Avg response time"),
        Cell::new(format!("{:.0}ms", stats.average_response_time_ms)),
    ]);
    summary.add_row(vec![
        Cell::new("Requests/min"),
        Cell::new(stats.requests_per_minute),
    ]);

    if stats.top_endpoints.is_empty() {
        return summary.to_string();
    }

    let mut endpoints = table(vec!["Endpoint", "Requests", "Avg", "Errors"]);
    for endpoint in &stats.top_endpoints {
        endpoints.add_row(vec![
            Cell::new(&endpoint.endpoint),
            Cell::new(endpoint.count),
            Cell::new(format!("{:.0}ms", endpoint.average_duration_ms)),
            Cell::new(format!("{:.1}%", endpoint.error_rate * 100.0)),
        ]);
    }
    format!("{}\n{}", summary, endpoints)
}

/// Format the state (and optionally request statistics) as JSON
pub fn format_state_json(
    state: &AppState,
    stats: Option<&RequestStats>,
) -> Result<String, serde_json::Error> {
    let mut value = json!({ "state": state });
    if let Some(stats) = stats {
        value["stats"] = serde_json::to_value(stats)?;
    }
    serde_json::to_string_pretty(&value)
}
