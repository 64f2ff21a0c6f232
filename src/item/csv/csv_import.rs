use std::{
    cell::{Cell, RefCell},
    fs::File,
    io::{self, BufRead, BufReader, ErrorKind, Read},
    marker::PhantomData,
    path::Path,
};

use log::{debug, trace};

use crate::{
    core::{
        item::{ItemReader, ItemReaderResult},
        record::CsvRecord,
    },
    error::ImportError,
    item::csv::{
        mapping::{links_from_header, Link, ResolvedMapping},
        settings::ImportSettings,
        tokenizer::split_line,
    },
};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// A CSV importer producing one record of type `T` per line.
///
/// Records are built lazily, one per [`ItemReader::read`] call (or per
/// iteration step), so the source is never loaded whole. The reader owns
/// its source and releases it once the source is exhausted, once a read
/// fails, or when the reader is dropped.
///
/// # Examples
///
/// ```
/// use csv_link::core::item::ItemReader;
/// use csv_link::csv_record;
/// use csv_link::item::csv::csv_import::CsvImportReaderBuilder;
///
/// #[derive(Debug, Default)]
/// struct City {
///     city: String,
///     pop: u32,
/// }
///
/// csv_record!(City { city: String, pop: u32 });
///
/// let data = "city,pop\nBoston,4628910\nConcord,42695\n";
///
/// let reader = CsvImportReaderBuilder::<City>::new()
///     .has_headers(true)
///     .from_reader(data.as_bytes())
///     .unwrap();
///
/// let boston = reader.read().unwrap().unwrap();
/// assert_eq!(boston.city, "Boston");
/// assert_eq!(boston.pop, 4628910);
///
/// let concord = reader.read().unwrap().unwrap();
/// assert_eq!(concord.city, "Concord");
///
/// assert!(reader.read().unwrap().is_none());
/// ```
pub struct CsvImportReader<R, T> {
    /// `None` once the source is exhausted or failed.
    source: RefCell<Option<R>>,
    bytes: RefCell<Vec<u8>>,
    line: RefCell<String>,
    line_number: Cell<usize>,
    mapping: ResolvedMapping,
    delimiter: String,
    text_delimiter: char,
    _record: PhantomData<fn() -> T>,
}

impl<R: BufRead, T: CsvRecord> CsvImportReader<R, T> {
    fn new(
        source: Option<R>,
        mapping: ResolvedMapping,
        settings: &ImportSettings,
        line_number: usize,
    ) -> Self {
        Self {
            source: RefCell::new(source),
            bytes: RefCell::new(Vec::new()),
            line: RefCell::new(String::new()),
            line_number: Cell::new(line_number),
            mapping,
            delimiter: settings.delimiter.clone(),
            text_delimiter: settings.text_delimiter,
            _record: PhantomData,
        }
    }

    /// The mapping resolved for this import.
    pub fn mapping(&self) -> &ResolvedMapping {
        &self.mapping
    }

    /// The links in use, including links derived from the header line.
    pub fn links(&self) -> &[Link] {
        self.mapping.links()
    }

    /// Number of lines consumed so far, header included.
    pub fn line_number(&self) -> usize {
        self.line_number.get()
    }

    /// Reads every remaining record.
    pub fn read_all(self) -> Result<Vec<T>, ImportError> {
        self.collect()
    }
}

impl<R: BufRead, T: CsvRecord> ItemReader<T> for CsvImportReader<R, T> {
    /// Reads the next line and turns it into a record.
    ///
    /// # Returns
    /// - `Ok(Some(record))` for each remaining line
    /// - `Ok(None)` once the source is exhausted
    /// - `Err(ImportError::Io)` if reading the line failed; the source is
    ///   released and later calls return `Ok(None)`
    fn read(&self) -> ItemReaderResult<T> {
        let mut source = self.source.borrow_mut();
        let Some(reader) = source.as_mut() else {
            return Ok(None);
        };

        let line_number = self.line_number.get() + 1;
        let mut bytes = self.bytes.borrow_mut();
        let mut line = self.line.borrow_mut();

        match next_line(reader, &mut bytes, &mut line) {
            Ok(true) => {
                self.line_number.set(line_number);
                trace!("line {}: {:?}", line_number, line.as_str());

                let fields = split_line(&line, &self.delimiter, self.text_delimiter);
                Ok(Some(self.mapping.populate(&fields)))
            }
            Ok(false) => {
                debug!("source exhausted after {} lines", self.line_number.get());
                *source = None;
                Ok(None)
            }
            Err(error) => {
                *source = None;
                Err(ImportError::Io {
                    line: line_number,
                    source: error,
                })
            }
        }
    }
}

impl<R: BufRead, T: CsvRecord> Iterator for CsvImportReader<R, T> {
    type Item = Result<T, ImportError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read().transpose()
    }
}

/// Reads one line into `line` without its terminator.
///
/// `\n`, `\r\n` and a bare `\r` all end a line. Bytes that are not valid
/// UTF-8 are replaced with U+FFFD, so an odd encoding only damages the
/// fields it appears in. `bytes` is scratch space reused between lines.
///
/// Returns `false` at the end of the source.
fn next_line<R: BufRead>(
    reader: &mut R,
    bytes: &mut Vec<u8>,
    line: &mut String,
) -> io::Result<bool> {
    bytes.clear();
    line.clear();
    if read_line_bytes(reader, bytes)? == 0 {
        return Ok(false);
    }

    match std::str::from_utf8(bytes) {
        Ok(text) => line.push_str(text),
        Err(error) => {
            debug!("invalid UTF-8 at byte {}, replaced", error.valid_up_to());
            line.push_str(&String::from_utf8_lossy(bytes));
        }
    }

    Ok(true)
}

/// Appends the next line, terminator excluded, to `bytes`.
///
/// Returns the number of bytes consumed, terminator included.
fn read_line_bytes<R: BufRead>(reader: &mut R, bytes: &mut Vec<u8>) -> io::Result<usize> {
    let mut consumed = 0;

    loop {
        let available = match reader.fill_buf() {
            Ok(available) => available,
            Err(error) if error.kind() == ErrorKind::Interrupted => continue,
            Err(error) => return Err(error),
        };
        if available.is_empty() {
            return Ok(consumed);
        }

        let Some(end) = available.iter().position(|b| *b == b'\n' || *b == b'\r') else {
            let length = available.len();
            bytes.extend_from_slice(available);
            reader.consume(length);
            consumed += length;
            continue;
        };

        let terminator = available[end];
        bytes.extend_from_slice(&available[..end]);
        reader.consume(end + 1);
        consumed += end + 1;

        if terminator == b'\r' && reader.fill_buf()?.first() == Some(&b'\n') {
            reader.consume(1);
            consumed += 1;
        }

        return Ok(consumed);
    }
}

/// A builder for configuring a CSV import.
///
/// # Default Configuration
///
/// See [`ImportSettings`]: comma delimiter, `"` text delimiter, `NULL` null
/// token, empty values as null, no header and no links.
///
/// # Examples
///
/// ```
/// use csv_link::csv_record;
/// use csv_link::item::csv::{
///     convert::Converter, csv_import::CsvImportReaderBuilder, mapping::Link,
///     transform::Transformation,
/// };
///
/// #[derive(Debug, Default)]
/// struct Employee {
///     useremail: String,
///     registered: Option<chrono::NaiveDateTime>,
///     random_val: i32,
/// }
///
/// csv_record!(Employee {
///     useremail: String,
///     registered: Option<chrono::NaiveDateTime>,
///     random_val: i32,
/// });
///
/// let data = "registered;email\n12/31/2022;\"jo@example.com\"\n";
///
/// let employees = CsvImportReaderBuilder::<Employee>::new()
///     .has_headers(true)
///     .delimiter(";")
///     .link(Link::new(1, "UserEmail"))
///     .link(Link::new(0, "Registered").converter(Converter::DateMdy))
///     .link(Link::new(0, "random_val").transform(Transformation::matching(r"^\d{0,2}").unwrap()))
///     .from_reader(data.as_bytes())
///     .unwrap()
///     .read_all()
///     .unwrap();
///
/// assert_eq!(employees.len(), 1);
/// assert_eq!(employees[0].useremail, "jo@example.com");
/// assert!(employees[0].registered.is_some());
/// assert_eq!(employees[0].random_val, 12);
/// ```
pub struct CsvImportReaderBuilder<T> {
    settings: ImportSettings,
    _record: PhantomData<fn() -> T>,
}

impl<T: CsvRecord> Default for CsvImportReaderBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: CsvRecord> CsvImportReaderBuilder<T> {
    pub fn new() -> Self {
        Self {
            settings: ImportSettings::default(),
            _record: PhantomData,
        }
    }

    /// Replaces every setting at once, e.g. with settings loaded from JSON.
    pub fn settings(mut self, settings: ImportSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Sets whether the first line holds column names.
    ///
    /// Without declared links the header line names the fields to fill;
    /// with declared links it is skipped.
    pub fn has_headers(mut self, yes: bool) -> Self {
        self.settings.header = yes;
        self
    }

    /// Sets the column delimiter, one or more characters.
    pub fn delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.settings.delimiter = delimiter.into();
        self
    }

    pub fn text_delimiter(mut self, text_delimiter: char) -> Self {
        self.settings.text_delimiter = text_delimiter;
        self
    }

    pub fn null_token(mut self, null_token: impl Into<String>) -> Self {
        self.settings.null_token = null_token.into();
        self
    }

    pub fn empty_value_as_null(mut self, yes: bool) -> Self {
        self.settings.empty_value_as_null = yes;
        self
    }

    /// Declares one more column to field link.
    pub fn link(mut self, link: Link) -> Self {
        self.settings.links.push(link);
        self
    }

    pub fn links(mut self, links: impl IntoIterator<Item = Link>) -> Self {
        self.settings.links.extend(links);
        self
    }

    /// Opens the file at `path` and prepares the import.
    ///
    /// # Errors
    ///
    /// - [`ImportError::NotFound`] if `path` is not an existing file
    /// - [`ImportError::Configuration`] if the settings cannot drive an import
    /// - [`ImportError::Io`] if opening the file or reading its header fails
    pub fn from_path<P: AsRef<Path>>(
        self,
        path: P,
    ) -> Result<CsvImportReader<BufReader<File>, T>, ImportError> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(ImportError::NotFound {
                path: path.to_path_buf(),
            });
        }

        self.settings.validate()?;

        let file = File::open(path).map_err(|error| ImportError::Io {
            line: 0,
            source: error,
        })?;

        debug!("importing {}", path.display());
        self.open(BufReader::new(file))
    }

    /// Prepares the import of CSV data from any `Read` source.
    ///
    /// # Errors
    ///
    /// - [`ImportError::Configuration`] if the settings cannot drive an import
    /// - [`ImportError::Io`] if reading the header fails
    pub fn from_reader<R: Read>(self, rdr: R) -> Result<CsvImportReader<BufReader<R>, T>, ImportError> {
        self.settings.validate()?;
        self.open(BufReader::new(rdr))
    }

    /// Handles the header line and resolves the mapping.
    fn open<R: BufRead>(self, mut source: R) -> Result<CsvImportReader<R, T>, ImportError> {
        let settings = self.settings;

        let header_error = |error: io::Error| ImportError::Io {
            line: 1,
            source: error,
        };

        if source.fill_buf().map_err(header_error)?.starts_with(UTF8_BOM) {
            source.consume(UTF8_BOM.len());
        }

        let is_empty = source.fill_buf().map_err(header_error)?.is_empty();

        if is_empty {
            debug!("empty source, nothing to import");
            return Ok(CsvImportReader::new(
                None,
                ResolvedMapping::default(),
                &settings,
                0,
            ));
        }

        let mut first = String::new();
        let links = if settings.links.is_empty() {
            read_header(&mut source, &mut first)?;
            let links = links_from_header(&first, &settings.delimiter, settings.text_delimiter);
            debug!("{} links derived from header line", links.len());
            links
        } else {
            if settings.header {
                read_header(&mut source, &mut first)?;
                debug!("header line skipped, using declared links");
            }
            settings.links.clone()
        };

        let line_number = usize::from(settings.header);
        let mapping = ResolvedMapping::resolve::<T>(&settings, links);

        Ok(CsvImportReader::new(
            Some(source),
            mapping,
            &settings,
            line_number,
        ))
    }
}

fn read_header<R: BufRead>(source: &mut R, line: &mut String) -> Result<(), ImportError> {
    next_line(source, &mut Vec::new(), line).map_err(|error| ImportError::Io {
        line: 1,
        source: error,
    })?;

    Ok(())
}
