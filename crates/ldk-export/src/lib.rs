//! ldk-export
//!
//! Work-order export: unfulfilled rows grouped by product name into a
//! plain-text UTF-8 document, written in a single pass.
//!
//! Rendering is pure ([`render_report`]); [`write_export`] only adds the
//! file name, the tmp-then-rename write and the directory fallback.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use ldk_normalize::{CYL, SPH};
use ldk_schemas::{Catalog, ExportExtra, ExportRow, UNNAMED_PRODUCT};
use serde::Serialize;

/// `MKL_DD.MM.YY.txt` / `MERIDIAN_DD.MM.YY.txt`.
pub fn export_file_name(catalog: Catalog, date: NaiveDate) -> String {
    format!("{}_{}.txt", catalog.as_str(), date.format("%d.%m.%y"))
}

/// Group key of a row: trimmed name, or the placeholder when blank.
pub fn group_name(product_name: &str) -> &str {
    let t = product_name.trim();
    if t.is_empty() {
        UNNAMED_PRODUCT
    } else {
        t
    }
}

/// One product block in output order.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductGroup<'a> {
    pub name: &'a str,
    pub rows: Vec<&'a ExportRow>,
}

/// Group rows by exact (trimmed) name, then order groups by Unicode
/// lowercase name. Equal lowercase names keep first-seen order, and rows
/// inside a group keep selection order.
pub fn group_rows(rows: &[ExportRow]) -> Vec<ProductGroup<'_>> {
    let mut groups: Vec<ProductGroup<'_>> = Vec::new();
    for row in rows {
        let name = group_name(&row.product_name);
        match groups.iter_mut().find(|g| g.name == name) {
            Some(g) => g.rows.push(row),
            None => groups.push(ProductGroup {
                name,
                rows: vec![row],
            }),
        }
    }
    // `sort_by_cached_key` is stable.
    groups.sort_by_cached_key(|g| g.name.to_lowercase());
    groups
}

/// A single row line. Absent optional fields are omitted entirely; the
/// quantity is always last.
pub fn render_row(row: &ExportRow) -> String {
    let mut parts: Vec<String> = Vec::with_capacity(5);
    if let Some(v) = row.sph {
        parts.push(format!("Sph: {}", SPH.format(v)));
    }
    if let Some(v) = row.cyl {
        parts.push(format!("Cyl: {}", CYL.format(v)));
    }
    if let Some(v) = row.ax {
        parts.push(format!("Ax: {v}"));
    }
    match row.extra {
        Some(ExportExtra::BaseCurve(bc)) => parts.push(format!("BC: {:.1}", bc + 0.0)),
        Some(ExportExtra::Diameter(d)) => parts.push(format!("D:{d}мм")),
        None => {}
    }
    parts.push(format!("Количество: {}", row.qty));
    parts.join(" ")
}

/// Full document. Each group is its name, its row lines and one empty
/// line; a non-empty document therefore ends with a single `\n`.
pub fn render_report(rows: &[ExportRow]) -> String {
    let mut lines: Vec<String> = Vec::new();
    for g in group_rows(rows) {
        lines.push(g.name.to_string());
        lines.extend(g.rows.iter().map(|r| render_row(r)));
        lines.push(String::new());
    }
    lines.join("\n")
}

#[derive(Debug, Clone, Serialize)]
pub struct ExportOutcome {
    pub path: PathBuf,
    pub rows: usize,
    pub groups: usize,
    /// True when the configured directory was unusable and the working
    /// directory was used instead.
    pub fell_back: bool,
}

/// Resolve the target directory: the configured one if it is an existing
/// directory, otherwise the process working directory.
pub fn resolve_export_dir(configured: &Path) -> Result<(PathBuf, bool)> {
    if configured.is_dir() {
        return Ok((configured.to_path_buf(), false));
    }
    let cwd = std::env::current_dir().context("current_dir failed")?;
    tracing::warn!(
        configured = %configured.display(),
        fallback = %cwd.display(),
        "export directory unusable; writing to working directory"
    );
    Ok((cwd, true))
}

/// Render and write the export for `catalog` dated `date`.
pub fn write_export(
    configured_dir: &Path,
    catalog: Catalog,
    date: NaiveDate,
    rows: &[ExportRow],
) -> Result<ExportOutcome> {
    let (dir, fell_back) = resolve_export_dir(configured_dir)?;
    let path = dir.join(export_file_name(catalog, date));
    let body = render_report(rows);

    write_atomic(&path, &body)?;

    let groups = group_rows(rows).len();
    tracing::info!(
        catalog = catalog.as_str(),
        path = %path.display(),
        rows = rows.len(),
        groups,
        "export written"
    );

    Ok(ExportOutcome {
        path,
        rows: rows.len(),
        groups,
        fell_back,
    })
}

fn write_atomic(path: &Path, body: &str) -> Result<()> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    fs::write(&tmp, body).with_context(|| format!("write export failed: {}", tmp.display()))?;
    fs::rename(&tmp, path)
        .with_context(|| format!("rename export failed: {} -> {}", tmp.display(), path.display()))?;
    Ok(())
}
