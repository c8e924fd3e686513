use anyhow::Result;
use polars::prelude::*;

use super::aggregate::{COUNT_COLUMNS, CROWN_AREA};
use crate::store::GeomTable;
use crate::types::{DISTRICT_ID, GEOMETRY, REPORT_COLUMNS};

/// Derived percentage columns: (numerator, denominator, percentage, label).
const PERCENTAGES: [(&str, &str, &str, &str); 3] = [
    ("n_res_bldg_near_gs", "n_res_bldg", "perc_near_gs", "labels_near_gs"),
    ("n_bldg_near_trees", "n_res_bldg", "perc_near_trees", "labels_near_trees"),
    (CROWN_AREA, "a_clipped", "perc_crown", "labels_crown"),
];

/// Coverage bucket of a percentage value.
///
/// Null percentages are coalesced to zero before bucketing, so a district
/// with no residential buildings lands in `0-25%` rather than `no data`;
/// `no data` is reserved for out-of-range values.
pub fn bucket_label(perc: f64) -> &'static str {
    if perc.is_nan() {
        "no data"
    } else if perc > -0.01 && perc <= 25.0 {
        "0-25%"
    } else if perc <= 50.0 {
        "25-50%"
    } else if perc <= 75.0 {
        "50-75%"
    } else if perc <= 100.0 {
        "75-100%"
    } else {
        "no data"
    }
}

/// Normalize a district table in place: coalesce raw aggregates to zero,
/// derive percentage and label columns, round, sort and reorder to the
/// report schema.
pub fn normalize(table: &mut GeomTable) -> Result<()> {
    fill_null_counts(table.df_mut())?;
    derive_percentages(table.df_mut())?;
    round_to_cents(table.df_mut())?;
    sort_and_reorder(table)
}

fn fill_null_counts(df: &mut DataFrame) -> Result<()> {
    for name in COUNT_COLUMNS {
        if df.column(name).is_err() {
            continue;
        }
        let values: Vec<Option<i64>> = df
            .column(name)?
            .i64()?
            .into_iter()
            .map(|opt| Some(opt.unwrap_or(0)))
            .collect();
        let ca: Int64Chunked = values.into_iter().collect();
        df.with_column(ca.with_name(name.into()).into_series())?;
    }
    if let Some(values) = numeric_values(df, CROWN_AREA)? {
        let coalesced: Vec<Option<f64>> =
            values.into_iter().map(|opt| Some(opt.unwrap_or(0.0))).collect();
        set_f64_column(df, CROWN_AREA, coalesced)?;
    }
    Ok(())
}

fn derive_percentages(df: &mut DataFrame) -> Result<()> {
    for (num_name, den_name, perc_name, label_name) in PERCENTAGES {
        let Some(num) = numeric_values(df, num_name)? else {
            continue;
        };
        let den = numeric_values(df, den_name)?.unwrap_or_else(|| vec![None; num.len()]);

        // Zero denominators produce null, then coalesce to zero.
        let percs: Vec<Option<f64>> = num
            .iter()
            .zip(&den)
            .map(|(n, d)| match (n, d) {
                (Some(n), Some(d)) if *d != 0.0 => Some(n / d * 100.0),
                _ => None,
            })
            .map(|opt| Some(opt.unwrap_or(0.0)))
            .collect();

        let labels: Vec<&'static str> = percs
            .iter()
            .map(|opt| bucket_label(opt.unwrap_or(f64::NAN)))
            .collect();
        set_f64_column(df, perc_name, percs)?;
        df.with_column(Column::new(label_name.into(), labels))?;
    }
    Ok(())
}

/// Round derived floating-point columns to two decimals.
fn round_to_cents(df: &mut DataFrame) -> Result<()> {
    let names = ["perc_near_gs", "perc_near_trees", "perc_crown", CROWN_AREA];
    for name in names {
        let Some(values) = numeric_values(df, name)? else {
            continue;
        };
        let rounded = values
            .into_iter()
            .map(|opt| opt.map(|v| (v * 100.0).round() / 100.0))
            .collect();
        set_f64_column(df, name, rounded)?;
    }
    Ok(())
}

fn sort_and_reorder(table: &mut GeomTable) -> Result<()> {
    let mut df = table.df().clone();
    if df.column(DISTRICT_ID).is_ok() {
        df = df.sort([DISTRICT_ID], SortMultipleOptions::default())?;
    }

    let present: Vec<String> = df
        .get_column_names()
        .into_iter()
        .map(|s| s.to_string())
        .collect();
    let mut order: Vec<&str> = REPORT_COLUMNS
        .iter()
        .copied()
        .filter(|name| present.iter().any(|p| p == name))
        .collect();
    for name in &present {
        if name != GEOMETRY && !order.contains(&name.as_str()) {
            order.push(name);
        }
    }
    if present.iter().any(|p| p == GEOMETRY) {
        order.push(GEOMETRY);
    }
    *table.df_mut() = df.select(order)?;
    Ok(())
}

/// Read a column as f64, accepting integer columns too (re-read CSV reports
/// lose the original dtypes). Returns `None` when the column is absent or
/// non-numeric.
fn numeric_values(df: &DataFrame, name: &str) -> Result<Option<Vec<Option<f64>>>> {
    let Ok(col) = df.column(name) else {
        return Ok(None);
    };
    let values = match col.dtype() {
        DataType::Float64 => col.f64()?.into_iter().collect(),
        dtype if dtype.is_integer() => {
            let casted = col.cast(&DataType::Int64)?;
            casted
                .i64()?
                .into_iter()
                .map(|opt| opt.map(|v| v as f64))
                .collect()
        }
        _ => return Ok(None),
    };
    Ok(Some(values))
}

fn set_f64_column(df: &mut DataFrame, name: &str, values: Vec<Option<f64>>) -> Result<()> {
    let ca: Float64Chunked = values.into_iter().collect();
    df.with_column(ca.with_name(name.into()).into_series())?;
    Ok(())
}
