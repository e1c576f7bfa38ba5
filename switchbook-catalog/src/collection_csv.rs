//! CSV import and export of a personal collection.
//!
//! One row per collection entry. Columns use the same names as the JSON API;
//! `personal_tags` is a `;`-separated list. Only `name` is required on import,
//! every other column may be absent or empty.

use std::io;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{
    CollectionDetails, Switch, SwitchInput, SwitchSpecs, SwitchTechnology, SwitchType,
};
use crate::validation::validate_switch_input;

#[derive(Debug, Error)]
pub enum CsvError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("CSV has no 'name' column")]
    MissingNameColumn,
}

/// A row that could not be imported.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowError {
    /// 1-based line number in the file, counting the header.
    pub line: u64,
    pub message: String,
}

/// Result of parsing an uploaded collection file.
#[derive(Debug, Default)]
pub struct ParsedCollection {
    pub rows: Vec<(u64, SwitchInput)>,
    pub errors: Vec<RowError>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct CsvRow {
    name: String,
    chinese_name: Option<String>,
    manufacturer: Option<String>,
    #[serde(rename = "type")]
    switch_type: Option<String>,
    technology: Option<String>,
    actuation_force: Option<f64>,
    bottom_out_force: Option<f64>,
    pre_travel: Option<f64>,
    bottom_out: Option<f64>,
    spring_weight: Option<String>,
    spring_length: Option<String>,
    top_housing: Option<String>,
    bottom_housing: Option<String>,
    stem: Option<String>,
    magnet_orientation: Option<String>,
    magnet_position: Option<String>,
    magnet_polarity: Option<String>,
    initial_force: Option<f64>,
    initial_magnetic_flux: Option<f64>,
    bottom_out_magnetic_flux: Option<f64>,
    pcb_thickness: Option<String>,
    compatibility: Option<String>,
    notes: Option<String>,
    image_url: Option<String>,
    quantity: Option<i64>,
    date_obtained: Option<String>,
    personal_notes: Option<String>,
    personal_tags: Option<String>,
    is_lubed: Option<String>,
    is_filmed: Option<String>,
    is_modified: Option<String>,
    franken_top: Option<String>,
    franken_bottom: Option<String>,
    franken_stem: Option<String>,
}

fn bool_str(b: bool) -> Option<String> {
    Some(if b { "true" } else { "false" }.to_string())
}

fn parse_bool(field: &str, value: Option<&str>) -> Result<bool, String> {
    match value.map(|v| v.trim().to_lowercase()).as_deref() {
        None | Some("") => Ok(false),
        Some("true" | "yes" | "y" | "1" | "x") => Ok(true),
        Some("false" | "no" | "n" | "0") => Ok(false),
        Some(other) => Err(format!("{field}: expected yes/no, got '{other}'")),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl CsvRow {
    fn from_switch(s: &Switch) -> Self {
        let specs = &s.specs;
        let details = &s.details;
        Self {
            name: specs.name.clone(),
            chinese_name: specs.chinese_name.clone(),
            manufacturer: specs.manufacturer.clone(),
            switch_type: specs.switch_type.map(|t| t.as_str().to_string()),
            technology: specs.technology.map(|t| t.as_str().to_string()),
            actuation_force: specs.actuation_force,
            bottom_out_force: specs.bottom_out_force,
            pre_travel: specs.pre_travel,
            bottom_out: specs.bottom_out,
            spring_weight: specs.spring_weight.clone(),
            spring_length: specs.spring_length.clone(),
            top_housing: specs.top_housing.clone(),
            bottom_housing: specs.bottom_housing.clone(),
            stem: specs.stem.clone(),
            magnet_orientation: specs.magnet_orientation.clone(),
            magnet_position: specs.magnet_position.clone(),
            magnet_polarity: specs.magnet_polarity.clone(),
            initial_force: specs.initial_force,
            initial_magnetic_flux: specs.initial_magnetic_flux,
            bottom_out_magnetic_flux: specs.bottom_out_magnetic_flux,
            pcb_thickness: specs.pcb_thickness.clone(),
            compatibility: specs.compatibility.clone(),
            notes: specs.notes.clone(),
            image_url: specs.image_url.clone(),
            quantity: Some(details.quantity),
            date_obtained: details.date_obtained.clone(),
            personal_notes: details.personal_notes.clone(),
            personal_tags: Some(details.personal_tags.join(";")).filter(|t| !t.is_empty()),
            is_lubed: bool_str(details.is_lubed),
            is_filmed: bool_str(details.is_filmed),
            is_modified: bool_str(details.is_modified),
            franken_top: details.franken_top.clone(),
            franken_bottom: details.franken_bottom.clone(),
            franken_stem: details.franken_stem.clone(),
        }
    }

    fn into_input(self) -> Result<SwitchInput, String> {
        let switch_type = non_empty(self.switch_type)
            .map(|t| t.parse::<SwitchType>())
            .transpose()
            .map_err(|e| format!("{e}"))?;
        let technology = non_empty(self.technology)
            .map(|t| t.parse::<SwitchTechnology>())
            .transpose()
            .map_err(|e| format!("{e}"))?;

        let specs = SwitchSpecs {
            name: self.name.trim().to_string(),
            chinese_name: non_empty(self.chinese_name),
            manufacturer: non_empty(self.manufacturer),
            switch_type,
            technology,
            actuation_force: self.actuation_force,
            bottom_out_force: self.bottom_out_force,
            pre_travel: self.pre_travel,
            bottom_out: self.bottom_out,
            spring_weight: non_empty(self.spring_weight),
            spring_length: non_empty(self.spring_length),
            top_housing: non_empty(self.top_housing),
            bottom_housing: non_empty(self.bottom_housing),
            stem: non_empty(self.stem),
            magnet_orientation: non_empty(self.magnet_orientation),
            magnet_position: non_empty(self.magnet_position),
            magnet_polarity: non_empty(self.magnet_polarity),
            initial_force: self.initial_force,
            initial_magnetic_flux: self.initial_magnetic_flux,
            bottom_out_magnetic_flux: self.bottom_out_magnetic_flux,
            pcb_thickness: non_empty(self.pcb_thickness),
            compatibility: non_empty(self.compatibility),
            notes: non_empty(self.notes),
            image_url: non_empty(self.image_url),
        };

        let details = CollectionDetails {
            quantity: self.quantity.unwrap_or(1),
            date_obtained: non_empty(self.date_obtained),
            personal_notes: non_empty(self.personal_notes),
            personal_tags: self
                .personal_tags
                .unwrap_or_default()
                .split(';')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(String::from)
                .collect(),
            is_lubed: parse_bool("is_lubed", self.is_lubed.as_deref())?,
            is_filmed: parse_bool("is_filmed", self.is_filmed.as_deref())?,
            is_modified: parse_bool("is_modified", self.is_modified.as_deref())?,
            franken_top: non_empty(self.franken_top),
            franken_bottom: non_empty(self.franken_bottom),
            franken_stem: non_empty(self.franken_stem),
        };

        let input = SwitchInput { specs, details };
        validate_switch_input(&input).map_err(|e| e.to_string())?;
        Ok(input)
    }
}

/// Write a collection as CSV with a header row.
pub fn write_collection<W: io::Write>(writer: W, switches: &[Switch]) -> Result<(), CsvError> {
    let mut wtr = csv::Writer::from_writer(writer);
    for s in switches {
        wtr.serialize(CsvRow::from_switch(s))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Parse an uploaded collection file.
///
/// Malformed or invalid rows are collected in `errors`; the rest are returned
/// ready to insert. Fails outright only if the file is unreadable or lacks a
/// `name` column.
pub fn read_collection<R: io::Read>(reader: R) -> Result<ParsedCollection, CsvError> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let has_name = rdr.headers()?.iter().any(|h| h == "name");
    if !has_name {
        return Err(CsvError::MissingNameColumn);
    }

    let mut parsed = ParsedCollection::default();
    for (index, record) in rdr.deserialize::<CsvRow>().enumerate() {
        let line = index as u64 + 2;
        match record.map_err(|e| e.to_string()).and_then(CsvRow::into_input) {
            Ok(input) => parsed.rows.push((line, input)),
            Err(message) => parsed.errors.push(RowError { line, message }),
        }
    }

    Ok(parsed)
}
