/// This module provides the CSV importer: tokenizer, transformations, converters, mapping and reader.
pub mod csv;
