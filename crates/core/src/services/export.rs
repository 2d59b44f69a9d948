use crate::models::analysis::AnalysisResult;
use crate::models::table::AlignedTable;

/// Render an aligned table as CSV: a `date` column followed by one column
/// per series. Empty cells stay empty.
#[must_use]
pub fn table_to_csv(table: &AlignedTable) -> String {
    let mut csv = String::from("date");
    for name in table.column_names() {
        csv.push(',');
        csv.push_str(&escape(name));
    }
    csv.push('\n');

    for (date, cells) in table.rows() {
        csv.push_str(&date.to_string());
        for cell in cells {
            csv.push(',');
            if let Some(value) = cell {
                csv.push_str(&value.to_string());
            }
        }
        csv.push('\n');
    }
    csv
}

/// Render per-column scalars (cumulative return, volatility) as a
/// two-column CSV. A missing value leaves the cell empty.
#[must_use]
pub fn scalars_to_csv(header: &str, entries: &[(String, Option<f64>)]) -> String {
    let mut csv = format!("column,{header}\n");
    for (name, value) in entries {
        csv.push_str(&escape(name));
        csv.push(',');
        if let Some(v) = value {
            csv.push_str(&v.to_string());
        }
        csv.push('\n');
    }
    csv
}

/// Render every table of an analysis run, keyed by the table's name.
#[must_use]
pub fn analysis_to_csv(result: &AnalysisResult) -> Vec<(String, String)> {
    let cumulative: Vec<(String, Option<f64>)> = result
        .cumulative_return
        .entries
        .iter()
        .map(|(name, v)| (name.clone(), Some(*v)))
        .collect();

    vec![
        ("prices".into(), table_to_csv(&result.prices)),
        ("simple_return".into(), table_to_csv(&result.simple_return)),
        ("log_return".into(), table_to_csv(&result.log_return)),
        (
            "cumulative_return".into(),
            scalars_to_csv("cumulative_return_pct", &cumulative),
        ),
        (
            "normalized_performance".into(),
            table_to_csv(&result.normalized_performance),
        ),
        (
            "volatility".into(),
            scalars_to_csv("volatility_pct", &result.volatility.entries),
        ),
    ]
}

/// Quote a field containing commas, quotes, or newlines.
fn escape(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
