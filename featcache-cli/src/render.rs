//! Plain-text output for listings and frames

use featcache::{DataFrame, ListedArtifact};

/// Rows printed before a frame table is truncated
pub const MAX_ROWS: usize = 20;

pub fn listing(rows: &[ListedArtifact]) -> String {
    let name_width = rows
        .iter()
        .map(|r| r.name.len())
        .max()
        .unwrap_or(0)
        .max("NAME".len());

    let mut out = format!(
        "{:<name_width$}  {:<6}  {:>10}  {}\n",
        "NAME", "KIND", "SIZE", "MODIFIED"
    );
    for row in rows {
        out.push_str(&format!(
            "{:<name_width$}  {:<6}  {:>10}  {}\n",
            row.name,
            row.kind.to_string(),
            row.size_bytes,
            row.modified_at.format("%Y-%m-%d %H:%M:%S")
        ));
    }
    out
}

/// Render up to `max_rows` rows of `df` with aligned columns
pub fn frame(df: &DataFrame, max_rows: usize) -> String {
    let shown = df.num_rows().min(max_rows);
    let columns = df.columns();

    let cells: Vec<Vec<String>> = columns
        .iter()
        .map(|c| (0..shown).filter_map(|row| c.data.cell(row)).collect())
        .collect();
    let widths: Vec<usize> = columns
        .iter()
        .zip(&cells)
        .map(|(c, values)| {
            values
                .iter()
                .map(String::len)
                .chain([c.name.len(), c.data.type_name().len()])
                .max()
                .unwrap_or(0)
        })
        .collect();

    let line = |values: Vec<&str>| {
        values
            .iter()
            .zip(&widths)
            .map(|(v, w)| format!("{:<w$}", v, w = *w))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut out = String::new();
    out.push_str(&line(columns.iter().map(|c| c.name.as_str()).collect()));
    out.push('\n');
    out.push_str(&line(columns.iter().map(|c| c.data.type_name()).collect()));
    out.push('\n');
    for row in 0..shown {
        out.push_str(&line(cells.iter().map(|c| c[row].as_str()).collect()));
        out.push('\n');
    }
    if shown < df.num_rows() {
        out.push_str(&format!("... {} more rows\n", df.num_rows() - shown));
    }
    out
}
