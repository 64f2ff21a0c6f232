use std::{
    env::temp_dir,
    io::{self, Read, Write},
};

use csv_link::{
    core::item::ItemReader,
    csv_record,
    item::csv::{
        csv_import::CsvImportReaderBuilder,
        mapping::Link,
        settings::ImportSettings,
        transform::Transformation,
    },
    ImportError,
};
use tempfile::NamedTempFile;

#[derive(Debug, Default, PartialEq)]
struct Order {
    id: u32,
    customer: String,
    amount: Option<f64>,
}

csv_record!(Order {
    id: u32,
    customer: String,
    amount: Option<f64>,
});

#[test]
fn missing_file_is_not_found() {
    let path = temp_dir().join("csv-link-no-such-file.csv");

    let result = CsvImportReaderBuilder::<Order>::new()
        .has_headers(true)
        .from_path(&path);

    match result {
        Err(ImportError::NotFound { path: missing }) => assert_eq!(missing, path),
        other => panic!("expected NotFound, got {:?}", other.err()),
    }
}

#[test]
fn directory_is_not_a_file() {
    let result = CsvImportReaderBuilder::<Order>::new()
        .has_headers(true)
        .from_path(temp_dir());

    assert!(matches!(result, Err(ImportError::NotFound { .. })));
}

#[test]
fn no_links_without_header_fails_before_reading() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "1,alice,10.5").unwrap();

    let result = CsvImportReaderBuilder::<Order>::new().from_path(file.path());

    assert!(matches!(result, Err(ImportError::Configuration(_))));
}

#[test]
fn configuration_is_checked_even_for_empty_files() {
    let file = NamedTempFile::new().unwrap();

    let result = CsvImportReaderBuilder::<Order>::new()
        .delimiter("")
        .link(Link::new(0, "id"))
        .from_path(file.path());

    assert!(matches!(result, Err(ImportError::Configuration(_))));
}

#[test]
fn empty_file_yields_no_records() {
    let file = NamedTempFile::new().unwrap();

    let reader = CsvImportReaderBuilder::<Order>::new()
        .has_headers(true)
        .from_path(file.path())
        .unwrap();

    assert!(reader.links().is_empty());
    assert!(reader.read().unwrap().is_none());
    assert!(reader.read().unwrap().is_none());
}

#[test]
fn header_only_file_yields_no_records() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "id,customer,amount").unwrap();

    let orders = CsvImportReaderBuilder::<Order>::new()
        .has_headers(true)
        .from_path(file.path())
        .unwrap()
        .read_all()
        .unwrap();

    assert!(orders.is_empty());
}

#[test]
fn invalid_pattern_fails_before_import() {
    assert!(matches!(
        Transformation::matching("[0-9"),
        Err(ImportError::Transformation(_))
    ));

    let result = ImportSettings::from_json_str(
        r#"{
            "links": [
                { "position": 0, "field": "id", "transformations": [{ "type": "match", "pattern": "(" }] }
            ]
        }"#,
    );
    assert!(matches!(result, Err(ImportError::Settings(_))));
}

#[test]
fn unknown_converter_name_is_a_settings_error() {
    let result = ImportSettings::from_json_str(
        r#"{ "links": [{ "position": 0, "field": "id", "converter": "roman_numeral" }] }"#,
    );

    assert!(matches!(result, Err(ImportError::Settings(_))));
}

#[test]
fn bad_values_never_fail_the_import() {
    let data = "id,customer,amount\n\
                x12,bob,ten\n\
                -1,NULL,1e400\n\
                7,\"carol\",12.5\n";

    let orders = CsvImportReaderBuilder::<Order>::new()
        .has_headers(true)
        .from_reader(data.as_bytes())
        .unwrap()
        .read_all()
        .unwrap();

    assert_eq!(
        orders,
        vec![
            Order {
                id: 0,
                customer: "bob".to_string(),
                amount: None,
            },
            Order {
                id: 0,
                customer: String::new(),
                amount: Some(f64::INFINITY),
            },
            Order {
                id: 7,
                customer: "carol".to_string(),
                amount: Some(12.5),
            },
        ]
    );
}

/// Serves `good` bytes, then fails.
struct BrokenPipe {
    good: io::Cursor<Vec<u8>>,
}

impl Read for BrokenPipe {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.good.read(buf)? {
            0 => Err(io::Error::new(io::ErrorKind::BrokenPipe, "connection lost")),
            n => Ok(n),
        }
    }
}

#[test]
fn read_failure_is_reported_with_its_line() {
    let source = BrokenPipe {
        good: io::Cursor::new(b"id,customer\n1,alice\n2,bob\n".to_vec()),
    };

    let results: Vec<Result<Order, ImportError>> = CsvImportReaderBuilder::<Order>::new()
        .has_headers(true)
        .from_reader(source)
        .unwrap()
        .collect();

    assert_eq!(results.len(), 3);
    assert_eq!(results[0].as_ref().unwrap().customer, "alice");
    assert_eq!(results[1].as_ref().unwrap().customer, "bob");
    match &results[2] {
        Err(ImportError::Io { line, source }) => {
            assert_eq!(*line, 4);
            assert_eq!(source.kind(), io::ErrorKind::BrokenPipe);
        }
        other => panic!("expected an I/O error, got {other:?}"),
    }
}

#[test]
fn read_all_stops_at_first_failure() {
    let source = BrokenPipe {
        good: io::Cursor::new(b"id\n1\n".to_vec()),
    };

    let result = CsvImportReaderBuilder::<Order>::new()
        .has_headers(true)
        .from_reader(source)
        .unwrap()
        .read_all();

    assert!(matches!(result, Err(ImportError::Io { line: 3, .. })));
}
