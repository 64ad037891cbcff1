use crate::catalog::error::CatalogError;
use crate::types::city::CityRecord;
use log::info;
use polars::prelude::*;
use std::fs::File;
use std::path::Path;
use tempfile::NamedTempFile;

/// Reads a headed CSV file into a DataFrame, keeping I/O failures apart from
/// parse failures.
pub(crate) fn read_csv(path: &Path) -> Result<DataFrame, CatalogError> {
    let file = File::open(path).map_err(|e| CatalogError::Read(path.to_path_buf(), e))?;
    CsvReadOptions::default()
        .with_has_header(true)
        .into_reader_with_file_handle(file)
        .finish()
        .map_err(|e| CatalogError::CsvRead(path.to_path_buf(), e))
}

/// Fails with [`CatalogError::MissingColumn`] for the first absent column.
pub(crate) fn require_columns(df: &DataFrame, columns: &[&str]) -> Result<(), CatalogError> {
    for &name in columns {
        if df.column(name).is_err() {
            return Err(CatalogError::MissingColumn(name.to_string()));
        }
    }
    Ok(())
}

pub(crate) fn string_column(
    df: &DataFrame,
    name: &str,
) -> Result<Vec<Option<String>>, CatalogError> {
    let column = df
        .column(name)
        .map_err(|_| CatalogError::MissingColumn(name.to_string()))?;
    let as_string = column
        .cast(&DataType::String)
        .map_err(|e| column_type_error(name, "text", e))?;
    let values = as_string
        .str()
        .map_err(|e| column_type_error(name, "text", e))?;
    Ok(values.into_iter().map(|v| v.map(str::to_string)).collect())
}

/// Reads a numeric column. Values that are present but not numbers fail the
/// whole column rather than turning into nulls.
pub(crate) fn float_column(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>, CatalogError> {
    let column = df
        .column(name)
        .map_err(|_| CatalogError::MissingColumn(name.to_string()))?;
    let as_float = column
        .as_materialized_series()
        .strict_cast(&DataType::Float64)
        .map_err(|e| column_type_error(name, "a number", e))?;
    let values = as_float
        .f64()
        .map_err(|e| column_type_error(name, "a number", e))?;
    Ok(values.into_iter().collect())
}

fn column_type_error(column: &str, expected: &'static str, source: PolarsError) -> CatalogError {
    CatalogError::ColumnType {
        column: column.to_string(),
        expected,
        source,
    }
}

/// Converts catalog records into a `city_state, lat, lng` DataFrame.
pub(crate) fn records_to_frame(records: &[CityRecord]) -> PolarsResult<DataFrame> {
    let names: Vec<&str> = records.iter().map(|r| r.city_state.as_str()).collect();
    let lats: Vec<f64> = records.iter().map(|r| r.lat).collect();
    let lngs: Vec<f64> = records.iter().map(|r| r.lng).collect();
    df!(
        "city_state" => names,
        "lat" => lats,
        "lng" => lngs,
    )
}

/// Writes records as a headed CSV file.
///
/// The file is written next to its destination and moved into place once
/// complete, so a failed write never leaves a truncated catalog behind.
pub(crate) fn write_catalog_csv(records: &[CityRecord], path: &Path) -> Result<(), CatalogError> {
    let mut df = records_to_frame(records)?;

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => Path::new(".").to_path_buf(),
    };
    std::fs::create_dir_all(&dir).map_err(|e| CatalogError::Write(dir.clone(), e))?;

    let mut temp_file =
        NamedTempFile::new_in(&dir).map_err(|e| CatalogError::Write(path.to_path_buf(), e))?;
    CsvWriter::new(temp_file.as_file_mut())
        .include_header(true)
        .finish(&mut df)
        .map_err(|e| CatalogError::CsvWrite(path.to_path_buf(), e))?;
    temp_file
        .persist(path)
        .map_err(|e| CatalogError::Write(path.to_path_buf(), e.error))?;

    info!("Wrote {} catalog rows to {:?}", records.len(), path);
    Ok(())
}
