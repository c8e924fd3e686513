use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use polars::prelude::*;

use crate::types::GEOMETRY;

/// Read a CSV file into a DataFrame.
pub fn read_csv(path: &Path) -> Result<DataFrame> {
    let file = File::open(path)
        .with_context(|| format!("failed to open CSV file: {}", path.display()))?;
    let df = CsvReader::new(file)
        .finish()
        .with_context(|| format!("failed to read CSV file: {}", path.display()))?;
    Ok(df)
}

/// Write a DataFrame to a CSV file. A binary geometry column is re-encoded
/// as hex text, since CSV has no binary representation.
pub fn write_csv(df: &DataFrame, path: &Path) -> Result<()> {
    let mut out = df.clone();
    if let Ok(col) = out.column(GEOMETRY) {
        if col.dtype() == &DataType::Binary {
            let ca: StringChunked = col
                .binary()?
                .into_iter()
                .map(|opt| opt.map(hex::encode))
                .collect();
            out.with_column(ca.with_name(GEOMETRY.into()).into_series())?;
        }
    }

    let mut file = File::create(path)
        .with_context(|| format!("failed to create CSV file: {}", path.display()))?;
    CsvWriter::new(&mut file)
        .finish(&mut out)
        .with_context(|| format!("failed to write CSV file: {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn geometry_is_hex_encoded_in_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("table.csv");

        let geom_ca: BinaryChunked = [Some(vec![0x01u8, 0xab])].into_iter().collect();
        let df = DataFrame::new(vec![
            Column::new("district_id".into(), [30101i64]),
            geom_ca.with_name(GEOMETRY.into()).into_series().into_column(),
        ])
        .unwrap();

        write_csv(&df, &path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("01ab"), "geometry not hex encoded: {text}");

        let back = read_csv(&path).unwrap();
        assert_eq!(back.height(), 1);
        assert_eq!(
            back.column("district_id").unwrap().i64().unwrap().get(0),
            Some(30101)
        );
    }
}
