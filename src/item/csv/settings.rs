use std::{fs, io, path::Path};

use serde::{Deserialize, Deserializer, Serialize};

use crate::{error::ImportError, item::csv::mapping::Link};

/// Configuration of a CSV import.
///
/// Settings are read-only for an import: links derived from a header line are
/// returned with the resolved mapping and never written back here, so one
/// instance can be shared by any number of imports.
///
/// # Defaults
///
/// - `header`: `false`
/// - `delimiter`: `","`
/// - `text_delimiter`: `'"'`
/// - `null_token`: `"NULL"` (matched case-insensitively)
/// - `empty_value_as_null`: `true`
/// - `links`: none, which requires `header`
///
/// # Examples
///
/// ```
/// use csv_link::item::csv::settings::ImportSettings;
///
/// let settings = ImportSettings::from_json_str(
///     r#"{
///         "header": true,
///         "delimiter": ";",
///         "links": [
///             { "position": 1, "field": "email" },
///             { "position": 0, "field": "registered", "converter": "date_mdy" },
///             { "position": 2, "field": "phone", "transformations": [{ "type": "numerics_only" }] }
///         ]
///     }"#,
/// )
/// .unwrap();
///
/// assert_eq!(settings.delimiter, ";");
/// assert_eq!(settings.text_delimiter, '"');
/// assert_eq!(settings.links.len(), 3);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportSettings {
    /// Whether the first line holds column names.
    pub header: bool,
    /// Column delimiter, one or more characters.
    pub delimiter: String,
    /// Character wrapping fields that contain the delimiter.
    ///
    /// Read from JSON as a string whose first character is used.
    #[serde(deserialize_with = "first_char")]
    pub text_delimiter: char,
    /// Raw field text treated as null whatever the target type.
    #[serde(rename = "null")]
    pub null_token: String,
    /// Whether a field that is empty after transformation is null.
    pub empty_value_as_null: bool,
    /// Column to field links; derived from the header line when empty.
    pub links: Vec<Link>,
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            header: false,
            delimiter: ",".to_string(),
            text_delimiter: '"',
            null_token: "NULL".to_string(),
            empty_value_as_null: true,
            links: Vec::new(),
        }
    }
}

fn first_char<'de, D: Deserializer<'de>>(deserializer: D) -> Result<char, D::Error> {
    let text = String::deserialize(deserializer)?;
    text.chars()
        .next()
        .ok_or_else(|| serde::de::Error::custom("text_delimiter must not be empty"))
}

impl ImportSettings {
    pub fn from_json_str(json: &str) -> Result<Self, ImportError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_path<P: AsRef<Path>>(path: P) -> Result<Self, ImportError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|error| match error.kind() {
            io::ErrorKind::NotFound => ImportError::NotFound {
                path: path.to_path_buf(),
            },
            _ => ImportError::Io {
                line: 0,
                source: error,
            },
        })?;
        Self::from_json_str(&json)
    }

    /// Checks the settings that make an import impossible.
    pub(crate) fn validate(&self) -> Result<(), ImportError> {
        if self.delimiter.is_empty() {
            return Err(ImportError::Configuration(
                "the delimiter must contain at least one character".to_string(),
            ));
        }

        if self.links.is_empty() && !self.header {
            return Err(ImportError::Configuration(
                "no links are declared and there is no header line to derive them from"
                    .to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::ImportSettings;
    use crate::{error::ImportError, item::csv::mapping::Link};

    #[test]
    fn missing_keys_take_defaults() {
        let settings = ImportSettings::from_json_str(r#"{ "header": true }"#).unwrap();

        assert!(settings.header);
        assert_eq!(settings.delimiter, ",");
        assert_eq!(settings.text_delimiter, '"');
        assert_eq!(settings.null_token, "NULL");
        assert!(settings.empty_value_as_null);
        assert!(settings.links.is_empty());
    }

    #[test]
    fn null_token_is_read_from_null_key() {
        let settings =
            ImportSettings::from_json_str(r#"{ "header": true, "null": "n/a" }"#).unwrap();
        assert_eq!(settings.null_token, "n/a");
    }

    #[test]
    fn text_delimiter_takes_first_character() {
        let settings =
            ImportSettings::from_json_str(r#"{ "header": true, "text_delimiter": "''" }"#).unwrap();
        assert_eq!(settings.text_delimiter, '\'');

        let settings =
            ImportSettings::from_json_str(r#"{ "header": true, "text_delimiter": "|" }"#).unwrap();
        assert_eq!(settings.text_delimiter, '|');

        let result = ImportSettings::from_json_str(r#"{ "header": true, "text_delimiter": "" }"#);
        assert!(matches!(result, Err(ImportError::Settings(_))));
    }

    #[test]
    fn malformed_json_is_a_settings_error() {
        let result = ImportSettings::from_json_str(r#"{ "header": "yes" }"#);
        assert!(matches!(result, Err(ImportError::Settings(_))));
    }

    #[test]
    fn settings_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "delimiter": "||", "links": [{{ "position": 0, "field": "id" }}] }}"#)
            .unwrap();

        let settings = ImportSettings::from_json_path(file.path()).unwrap();

        assert_eq!(settings.delimiter, "||");
        assert_eq!(settings.links[0].field, "id");
    }

    #[test]
    fn missing_settings_file_is_not_found() {
        let result = ImportSettings::from_json_path("/definitely/not/here.json");
        assert!(matches!(result, Err(ImportError::NotFound { .. })));
    }

    #[test]
    fn validation_requires_links_or_header() {
        let settings = ImportSettings::default();
        assert!(matches!(
            settings.validate(),
            Err(ImportError::Configuration(_))
        ));

        let settings = ImportSettings {
            links: vec![Link::new(0, "id")],
            ..Default::default()
        };
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn validation_rejects_empty_delimiter() {
        let settings = ImportSettings {
            header: true,
            delimiter: String::new(),
            ..Default::default()
        };
        assert!(matches!(
            settings.validate(),
            Err(ImportError::Configuration(_))
        ));
    }
}
