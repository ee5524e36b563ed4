//! Semicolon-separated sample tables and the class mapping sidecar

use crate::classes::{ClassId, ClassMapping};
use crate::error::{Error, Result};
use crate::io::atomic::write_atomically;
use crate::table::{SampleTable, CLASS_COLUMN};
use ndarray::Array2;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

const DELIMITER: u8 = b';';

/// Write a sample table as `;`-delimited CSV.
///
/// Header is the table's column names followed by `class`. Values use the
/// shortest notation that parses back to the same `f32`, `NaN` for missing.
/// The destination is replaced atomically.
pub fn write_samples_csv<P: AsRef<Path>>(table: &SampleTable, path: P) -> Result<()> {
    write_atomically(path, |w| {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(DELIMITER)
            .from_writer(w);

        let mut header: Vec<&str> = table.columns().iter().map(String::as_str).collect();
        header.push(CLASS_COLUMN);
        writer.write_record(&header)?;

        let mut record: Vec<String> = Vec::with_capacity(header.len());
        for (row, id) in table.features().rows().into_iter().zip(table.classes()) {
            record.clear();
            record.extend(row.iter().map(f32::to_string));
            record.push(id.to_string());
            writer.write_record(&record)?;
        }

        writer.flush()?;
        Ok(())
    })
}

/// Read a table written by [`write_samples_csv`].
///
/// The last header column must be `class`; every other column is a band.
pub fn read_samples_csv<P: AsRef<Path>>(path: P) -> Result<SampleTable> {
    let file = File::open(path.as_ref())?;
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(DELIMITER)
        .flexible(true)
        .from_reader(BufReader::new(file));

    let headers = reader.headers()?.clone();
    let names: Vec<&str> = headers.iter().map(str::trim).collect();
    let Some((&last, bands)) = names.split_last() else {
        return Err(Error::Schema("sample table has no header".into()));
    };
    if last != CLASS_COLUMN {
        return Err(Error::Schema(format!(
            "last column must be '{}', found '{}'",
            CLASS_COLUMN, last
        )));
    }
    let columns: Vec<String> = bands.iter().map(|s| s.to_string()).collect();
    let width = columns.len();

    let mut values = Vec::new();
    let mut classes: Vec<ClassId> = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record?;
        let number = index + 1;
        if record.len() != width + 1 {
            return Err(Error::Schema(format!(
                "record {} has {} fields, expected {}",
                number,
                record.len(),
                width + 1
            )));
        }

        for (field, column) in record.iter().zip(&columns) {
            let value = field.trim().parse::<f32>().map_err(|_| {
                Error::Schema(format!(
                    "record {}: '{}' in column {} is not a number",
                    number, field, column
                ))
            })?;
            values.push(value);
        }

        let label = &record[width];
        let id = label.trim().parse::<ClassId>().map_err(|_| {
            Error::Schema(format!("record {}: '{}' is not a class id", number, label))
        })?;
        classes.push(id);
    }

    let values = Array2::from_shape_vec((classes.len(), width), values).map_err(|_| {
        Error::InvalidDimensions {
            width,
            height: classes.len(),
        }
    })?;
    SampleTable::new(columns, values, classes)
}

/// Write the class mapping as a JSON list of `{name, id}` in id order
pub fn write_class_mapping<P: AsRef<Path>>(mapping: &ClassMapping, path: P) -> Result<()> {
    write_atomically(path, |w| {
        serde_json::to_writer_pretty(&mut *w, mapping)?;
        w.write_all(b"\n")?;
        Ok(())
    })
}

/// Read a mapping written by [`write_class_mapping`]
pub fn read_class_mapping<P: AsRef<Path>>(path: P) -> Result<ClassMapping> {
    let file = File::open(path.as_ref())?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}
