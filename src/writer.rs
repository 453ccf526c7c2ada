use crate::regions::{self, REGIONS};
use crate::types::{AddressRow, Diagnostic, Report};
use anyhow::{Context, Result};
use std::collections::BTreeSet;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::warn;

pub const AGGREGATE_FILE: &str = "kraje.csv";

/// Sorts rows by region name and writes the aggregate file plus one file per
/// known region that has rows. Returns the paths written, in write order.
pub fn partition_and_write(
    mut rows: Vec<AddressRow>,
    dest_dir: &Path,
) -> Result<Report<Vec<PathBuf>>> {
    let mut report = Report::new(Vec::new());

    println!("Sorting by Kraj...");
    sort_by_region(&mut rows);

    println!("Saving to kraje...");
    let aggregate = dest_dir.join(AGGREGATE_FILE);
    write_csv(&aggregate, rows.iter())?;
    report.value.push(aggregate);

    let unmapped = unmapped_regions(&rows);
    if !unmapped.is_empty() {
        warn!("Kraj values not in region mapping:");
        for name in unmapped {
            warn!("  - {}", name);
            report.push(Diagnostic::UnmappedRegion { name });
        }
    }

    println!("Saving to individual...");
    for (name, code) in REGIONS {
        let mut subset = rows.iter().filter(|row| row.region_name == name).peekable();
        if subset.peek().is_none() {
            continue;
        }

        let path = dest_dir.join(format!("{}.csv", code));
        write_csv(&path, subset)?;
        report.value.push(path);
    }

    Ok(report)
}

/// Stable: rows with equal region names keep their relative order.
pub fn sort_by_region(rows: &mut [AddressRow]) {
    rows.sort_by(|a, b| a.region_name.cmp(&b.region_name));
}

/// Distinct non-blank region names that have no code, sorted.
pub fn unmapped_regions(rows: &[AddressRow]) -> Vec<String> {
    let seen: BTreeSet<&str> = rows
        .iter()
        .map(|row| row.region_name.as_str())
        .filter(|name| !name.trim().is_empty())
        .collect();

    seen.into_iter()
        .filter(|name| !regions::is_known(name))
        .map(str::to_string)
        .collect()
}

fn write_csv<'a>(path: &Path, rows: impl Iterator<Item = &'a AddressRow>) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create output file: {:?}", path))?;
    let mut writer = csv::Writer::from_writer(file);
    let mut count = 0usize;

    for row in rows {
        writer
            .serialize(row)
            .with_context(|| format!("Failed to write row to {:?}", path))?;
        count += 1;
    }
    // an empty table still gets its header line
    if count == 0 {
        writer.write_record(crate::types::COLUMNS)?;
    }

    writer.flush().with_context(|| format!("Failed to flush {:?}", path))?;
    println!("Wrote {} rows to {:?}", count, path);
    Ok(())
}
