//! Switch catalog data model, manufacturer normalization, and edit diffs.
//!
//! This crate defines the persistent data model for Switchbook without any
//! database dependencies. Consumers can use these types directly for
//! serialization or pass them to `switchbook-db` for persistence.

pub mod collection_csv;
pub mod diff;
pub mod manufacturer;
pub mod share;
pub mod types;
pub mod validation;
pub mod yaml;

pub use collection_csv::{CsvError, ParsedCollection, RowError, read_collection, write_collection};
pub use diff::{DiffError, EDITABLE_FIELDS, SpecDiff, apply_diff, compute_diff, fields_overlap};
pub use manufacturer::{KnownManufacturer, Resolution, normalize_key, resolve, similar};
pub use share::{generate_shareable_id, is_valid_shareable_id};
pub use types::*;
pub use validation::ValidationError;
pub use yaml::{ManufacturerSeed, YamlError, load_manufacturers};
