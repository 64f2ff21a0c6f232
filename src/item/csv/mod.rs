//! CSV import into typed records.
//!
//! This module reads delimited text line by line and fills one record per
//! line, following a declarative mapping between column positions and
//! record fields.
//!
//! # Module Architecture
//!
//! The import pipeline is made of small, independent parts:
//!
//! 1. **tokenizer**: splits a line into raw fields. Text delimiters protect
//!    embedded delimiters and are kept in the output.
//! 2. **transform**: ordered string rewrites applied to each raw field. The
//!    first step always strips the wrapping text delimiters.
//! 3. **convert**: parses cleaned text into a typed value, or null.
//! 4. **mapping**: joins declared or header-derived links to the fields of
//!    the target record.
//! 5. **csv_import**: opens the source, handles the header line and yields
//!    records lazily through the `ItemReader` trait or as an `Iterator`.
//!
//! Settings ([`settings::ImportSettings`]) can be built in code through the
//! reader builder or loaded from JSON.
//!
//! # Leniency
//!
//! Nothing in a line can fail an import. Values equal to the null token,
//! empty values (when configured) and values the converter cannot parse all
//! become null. Short lines leave the missing fields at their default.
//! Bytes that are not valid UTF-8 are replaced with U+FFFD.
//! Only a missing source, unusable settings and I/O failures are errors.
//!
//! # Examples
//!
//! ```
//! use csv_link::csv_record;
//! use csv_link::item::csv::{
//!     csv_import::CsvImportReaderBuilder, settings::ImportSettings,
//! };
//!
//! #[derive(Debug, Default, PartialEq)]
//! struct Product {
//!     id: String,
//!     price: f64,
//!     description: Option<String>,
//!     available: bool,
//! }
//!
//! csv_record!(Product {
//!     id: String,
//!     price: f64,
//!     description: Option<String>,
//!     available: bool,
//! });
//!
//! let data = "\
//! id,price,description,available
//! P001,79.99,\"Noise-cancelling, wireless\",true
//! P002,12.99,,false
//! P003,NULL,NULL,true
//! ";
//!
//! let settings = ImportSettings::from_json_str(r#"{ "header": true }"#).unwrap();
//!
//! let products = CsvImportReaderBuilder::<Product>::new()
//!     .settings(settings)
//!     .from_reader(data.as_bytes())
//!     .unwrap()
//!     .read_all()
//!     .unwrap();
//!
//! assert_eq!(products.len(), 3);
//! assert_eq!(products[0].description.as_deref(), Some("Noise-cancelling, wireless"));
//! assert_eq!(products[1].description, None);
//! assert_eq!(products[2].price, 0.0);
//! ```

/// Column to field links and their resolution against a record.
pub mod mapping;

/// Parsers from cleaned text to typed values.
pub mod convert;

/// The CSV import reader and its builder.
pub mod csv_import;

/// Import settings.
pub mod settings;

/// Line splitting.
pub mod tokenizer;

/// String rewrites applied to raw fields.
pub mod transform;
