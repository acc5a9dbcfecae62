use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use csv::{ReaderBuilder, StringRecord, Trim, WriterBuilder};
use log::{debug, warn};
use crate::drivers::DaqError;
use crate::types::default_columns;
/// One named numeric column.
#[derive(Clone, Debug, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<f64>,
}
/// Outcome of loading a dataset file.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub rows_kept: usize,
    pub rows_dropped: usize,
    /// The file had no header line; the default column names were used.
    pub headerless: bool,
}
/// Column-major table of captured rows plus derived columns.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Dataset {
    columns: Vec<Column>,
}
impl Dataset {
    pub fn with_columns<S: Into<String>>(names: impl IntoIterator<Item = S>) -> Self {
        Self {
            columns: names
                .into_iter()
                .map(|name| Column {
                    name: name.into(),
                    values: Vec::new(),
                })
                .collect(),
        }
    }
    pub fn row_count(&self) -> usize {
        self.columns.first().map(|c| c.values.len()).unwrap_or(0)
    }
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }
    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.values.as_slice())
    }
    #[cfg(test)]
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }
    pub fn row(&self, index: usize) -> Option<Vec<f64>> {
        if index >= self.row_count() {
            return None;
        }
        Some(self.columns.iter().map(|c| c.values[index]).collect())
    }
    pub fn push_row(&mut self, values: &[f64]) -> Result<(), DaqError> {
        if values.len() != self.columns.len() {
            return Err(DaqError::ColumnLength {
                name: "<row>".into(),
                expected: self.columns.len(),
                actual: values.len(),
            });
        }
        for (column, &v) in self.columns.iter_mut().zip(values) {
            column.values.push(v);
        }
        Ok(())
    }
    /// Appends a derived column, or replaces the values of an existing one with the same name.
    pub fn add_column(&mut self, name: impl Into<String>, values: Vec<f64>) -> Result<(), DaqError> {
        let name = name.into();
        let expected = self.row_count();
        if !self.columns.is_empty() && values.len() != expected {
            return Err(DaqError::ColumnLength {
                name,
                expected,
                actual: values.len(),
            });
        }
        match self.columns.iter_mut().find(|c| c.name == name) {
            Some(existing) => existing.values = values,
            None => self.columns.push(Column { name, values }),
        }
        Ok(())
    }
    /// Parses CSV text. Every field must be numeric; rows with a missing or
    /// non-numeric value are dropped rather than defaulted.
    pub fn from_reader<R: Read>(reader: R) -> Result<(Self, LoadReport), DaqError> {
        let mut csv = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(reader);
        let mut records = csv.records();
        let mut report = LoadReport::default();
        let Some(first) = records.next().transpose()? else {
            return Ok((Self::default(), report));
        };
        let mut dataset = match parse_record(&first) {
            Some(values) => {
                report.headerless = true;
                let defaults = default_columns();
                let names = if values.len() == defaults.len() {
                    defaults
                } else {
                    (0..values.len()).map(|i| format!("Column{i}")).collect()
                };
                let mut ds = Self::with_columns(names);
                ds.push_row(&values)?;
                report.rows_kept += 1;
                ds
            }
            None => Self::with_columns(first.iter()),
        };
        let width = dataset.column_count();
        for (line, record) in records.enumerate() {
            let record = record?;
            match parse_record(&record).filter(|v| v.len() == width) {
                Some(values) => {
                    dataset.push_row(&values)?;
                    report.rows_kept += 1;
                }
                None => {
                    debug!("dropping record {}: {:?}", line + 2, record);
                    report.rows_dropped += 1;
                }
            }
        }
        if report.rows_dropped > 0 {
            warn!(
                "dropped {} row(s) with missing or non-numeric values",
                report.rows_dropped
            );
        }
        Ok((dataset, report))
    }
    pub fn load(path: &Path) -> Result<(Self, LoadReport), DaqError> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }
    pub fn write_to<W: Write>(&self, writer: W) -> Result<(), DaqError> {
        let mut csv = WriterBuilder::new().from_writer(writer);
        csv.write_record(self.column_names())?;
        for row in (0..self.row_count()).filter_map(|i| self.row(i)) {
            csv.write_record(row.iter().map(|v| v.to_string()))?;
        }
        csv.flush()?;
        Ok(())
    }
    pub fn save(&self, path: &Path) -> Result<(), DaqError> {
        let file = File::create(path)?;
        self.write_to(BufWriter::new(file))
    }
}
fn parse_record(record: &StringRecord) -> Option<Vec<f64>> {
    record
        .iter()
        .map(|field| field.parse::<f64>().ok().filter(|v| !v.is_nan()))
        .collect()
}
