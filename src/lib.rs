#![cfg_attr(docsrs, feature(doc_cfg))]
//#![warn(missing_docs)]

/*!
 # csv-link-rs

 Configurable import of delimited text files into typed Rust records.

 Instead of writing a parser per file layout, you declare **links** between
 column positions and record fields. Each link can carry its own
 preprocessing (transformations) and its own parser (converter). When no
 links are declared, they are derived from the file's header line.

 ## Core Concepts

- **Link:** associates a column position with a record field name, with an optional converter and transformations.
- **Transformation:** a pure string rewrite applied to a raw field before conversion (strip characters, keep digits, regex extraction, ...). Every field first loses its wrapping text delimiters.
- **Converter:** parses cleaned text into a typed value (text, bool, integers, floats, decimal, dates with month-first, day-first or year-first formats), or null when it cannot.
- **Resolved Mapping:** the links joined to the fields of the target record, built once per import.
- **ItemReader:** the lazy, pull-based reader producing one record per line.

 ## Leniency

 An import never fails because of a value. Unparsable text, the configured
 null token, and (optionally) empty values all become null: `None` for
 `Option<T>` fields, the default value otherwise. Lines too short for a link
 leave the field untouched.

 ## Getting Started

```rust
# use csv_link::{
#     csv_record,
#     item::csv::{
#         convert::Converter, csv_import::CsvImportReaderBuilder, mapping::Link,
#         transform::Transformation,
#     },
#     ImportError,
# };
#[derive(Debug, Default)]
struct Employee {
    email: String,
    registered: Option<chrono::NaiveDateTime>,
    phone: Option<u64>,
}

csv_record!(Employee {
    email: String,
    registered: Option<chrono::NaiveDateTime>,
    phone: Option<u64>,
});

fn main() -> Result<(), ImportError> {
    let csv = "registered|email|phone
02/28/2023|\"jo@example.com\"|(01) 234-567
NULL|\"al|ex@example.com\"|n/a";

    let reader = CsvImportReaderBuilder::<Employee>::new()
        .has_headers(true)
        .delimiter("|")
        .link(Link::new(0, "registered").converter(Converter::DateMdy))
        .link(Link::new(1, "email"))
        .link(Link::new(2, "phone").transform(Transformation::NumericsOnly))
        .from_reader(csv.as_bytes())?;

    let employees = reader.read_all()?;

    assert_eq!(employees.len(), 2);
    assert!(employees[0].registered.is_some());
    assert_eq!(employees[0].phone, Some(1234567));
    assert_eq!(employees[1].email, "al|ex@example.com");
    assert_eq!(employees[1].registered, None);
    assert_eq!(employees[1].phone, None);

    Ok(())
}
```

 ## License
 Licensed under either of

 -   Apache License, Version 2.0
     ([LICENSE-APACHE](LICENSE-APACHE) or <http://www.apache.org/licenses/LICENSE-2.0>)
 -   MIT license
     ([LICENSE-MIT](LICENSE-MIT) or <http://opensource.org/licenses/MIT>)

 at your option.

 ## Contribution
 Unless you explicitly state otherwise, any contribution intentionally submitted
 for inclusion in the work by you, as defined in the Apache-2.0 license, shall be
 dual licensed as above, without any additional terms or conditions

 */

/// Core module: item reading and the record capability
pub mod core;

/// Error types for imports
pub mod error;

#[doc(inline)]
pub use error::*;

/// Set of importers (for now: csv)
pub mod item;
