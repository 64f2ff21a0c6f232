use crate::error::ImportError;

/// Result of a single [`ItemReader::read`] call.
///
/// - `Ok(Some(item))`: an item was produced
/// - `Ok(None)`: the source is exhausted
/// - `Err(error)`: the source failed and is released
pub type ItemReaderResult<R> = Result<Option<R>, ImportError>;

/// Pull-based source of items, one at a time.
pub trait ItemReader<R> {
    fn read(&self) -> ItemReaderResult<R>;
}
