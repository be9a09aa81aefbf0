//! Plain-text and JSON output for the CLI.

use std::collections::BTreeSet;
use std::io::{self, Write};

use bizmap_core::BusinessRecord;
use bizmap_view::{ColumnKey, IndustryFacet, MapView, ViewOrchestrator};

const MAX_CELL_WIDTH: usize = 40;
const MISSING: &str = "\u{2014}";

/// Display text for one table cell.
pub(crate) fn cell(record: &BusinessRecord, column: ColumnKey) -> String {
    let address = record.address.as_ref();
    let text = match column {
        ColumnKey::Name => Some(record.name.clone()),
        ColumnKey::BusinessId => Some(record.id.clone()),
        ColumnKey::Industry => match (&record.industry_code, &record.industry_description) {
            (Some(code), Some(desc)) => Some(format!("{code} {desc}")),
            (Some(code), None) => Some(code.clone()),
            (None, _) => None,
        },
        ColumnKey::RegisteredAt => record
            .registered_at
            .map(|d| d.format("%Y-%m-%d").to_string()),
        ColumnKey::Status => Some(if record.active { "active" } else { "inactive" }.to_owned()),
        ColumnKey::Street => address.and_then(|a| match (&a.street, &a.building_number) {
            (Some(street), Some(number)) => Some(format!("{street} {number}")),
            (Some(street), None) => Some(street.clone()),
            (None, _) => None,
        }),
        ColumnKey::PostalCode => address.and_then(|a| a.postal_code.clone()),
        ColumnKey::City => record.city().map(str::to_owned),
        ColumnKey::Latitude => record.coordinates().map(|c| format!("{:.5}", c.latitude)),
        ColumnKey::Longitude => record.coordinates().map(|c| format!("{:.5}", c.longitude)),
    };
    text.unwrap_or_else(|| MISSING.to_owned())
}

fn truncate(text: &str) -> String {
    if text.chars().count() > MAX_CELL_WIDTH {
        let head: String = text.chars().take(MAX_CELL_WIDTH - 3).collect();
        format!("{head}...")
    } else {
        text.to_owned()
    }
}

/// Writes the current page as an aligned table with a selection marker
/// column and a paging footer.
pub(crate) fn write_table(out: &mut impl Write, orchestrator: &ViewOrchestrator) -> io::Result<()> {
    let columns = orchestrator.view().visible_columns();
    let rows = orchestrator.table_rows();
    let snapshot = orchestrator.snapshot();

    if rows.is_empty() {
        writeln!(out, "no matching records")?;
    } else {
        let cells: Vec<Vec<String>> = rows
            .iter()
            .map(|row| columns.iter().map(|c| truncate(&cell(row.record, *c))).collect())
            .collect();
        let widths: Vec<usize> = columns
            .iter()
            .enumerate()
            .map(|(i, c)| {
                cells
                    .iter()
                    .map(|r| r[i].chars().count())
                    .chain(std::iter::once(c.label().chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let header: Vec<String> = columns
            .iter()
            .zip(&widths)
            .map(|(c, &w)| format!("{:<w$}", c.label()))
            .collect();
        writeln!(out, "    {}", header.join("  ").trim_end())?;
        for (row, values) in rows.iter().zip(&cells) {
            let marker = if row.selected { "[x]" } else { "[ ]" };
            let line: Vec<String> = values
                .iter()
                .zip(&widths)
                .map(|(v, &w)| format!("{v:<w$}"))
                .collect();
            writeln!(out, "{marker} {}", line.join("  ").trim_end())?;
        }
    }

    writeln!(
        out,
        "page {}/{}, {} of {} records, {} selected",
        snapshot.page_index,
        snapshot.total_pages,
        snapshot.filtered_count,
        snapshot.record_count,
        snapshot.selected_count
    )
}

/// GeoJSON feature collection for the map. Records without coordinates stay
/// in the filtered set but cannot be placed, so they are only counted.
pub(crate) fn map_geojson(map: &MapView<'_>) -> serde_json::Value {
    let features: Vec<serde_json::Value> = map
        .features
        .iter()
        .filter_map(|record| {
            let coords = record.coordinates()?;
            Some(serde_json::json!({
                "type": "Feature",
                "id": record.id,
                "geometry": {
                    "type": "Point",
                    "coordinates": [coords.longitude, coords.latitude],
                },
                "properties": {
                    "name": record.name,
                    "industryCode": record.industry_code,
                    "selected": map.selected_feature_ids.contains(&record.id.as_str()),
                },
            }))
        })
        .collect();
    let unplaced = map.features.len() - features.len();
    serde_json::json!({
        "type": "FeatureCollection",
        "features": features,
        "unplaced": unplaced,
    })
}

/// Writes whatever the current view mode shows.
pub(crate) fn write_view(out: &mut impl Write, orchestrator: &ViewOrchestrator) -> io::Result<()> {
    let mode = orchestrator.view().current_view();
    if mode.shows_table() {
        write_table(out, orchestrator)?;
    }
    if mode.shows_map() {
        let geojson = map_geojson(&orchestrator.map_view());
        serde_json::to_writer_pretty(&mut *out, &geojson)?;
        writeln!(out)?;
    }
    Ok(())
}

pub(crate) fn write_column_list(out: &mut impl Write, visible: &[ColumnKey]) -> io::Result<()> {
    for column in ColumnKey::ALL {
        let marker = if visible.contains(&column) { "[x]" } else { "[ ]" };
        writeln!(out, "{marker} {:<14}{}", column.sort_field(), column.label())?;
    }
    Ok(())
}

pub(crate) fn write_selection(out: &mut impl Write, orchestrator: &ViewOrchestrator) -> io::Result<()> {
    let selection = orchestrator.selection();
    let ids = orchestrator.selected_ids();
    writeln!(out, "{} selected ({})", ids.len(), selection.mode())?;
    for id in ids {
        writeln!(out, "{id}")?;
    }
    Ok(())
}

pub(crate) fn write_facets(
    out: &mut impl Write,
    facets: &[IndustryFacet],
    active: &BTreeSet<String>,
) -> io::Result<()> {
    if facets.is_empty() {
        return writeln!(out, "no industry codes in the loaded records");
    }
    writeln!(out, "  {:<8}{:>7}  DESCRIPTION", "CODE", "COUNT")?;
    for facet in facets {
        let marker = if active.contains(&facet.code) { "*" } else { " " };
        writeln!(
            out,
            "{marker} {:<8}{:>7}  {}",
            facet.code,
            facet.count,
            facet.description.as_deref().unwrap_or(MISSING)
        )?;
    }
    Ok(())
}
