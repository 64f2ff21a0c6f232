/// Item reading abstraction shared by every importer.
pub mod item;

/// Field-descriptor table and settable-field capability of target records.
pub mod record;
