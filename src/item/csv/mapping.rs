use std::collections::HashMap;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    core::record::{CsvRecord, FieldDescriptor, Value},
    item::csv::{
        convert::Converter,
        settings::ImportSettings,
        tokenizer::split_line,
        transform::{Transformation, Transformations},
    },
};

/// Declares that the column at `position` fills the record field `field`.
///
/// Field names match case-insensitively. Without a `converter` the field's
/// own kind picks one; `transformations` run in order after the implicit
/// quote stripping.
///
/// # Examples
///
/// ```
/// use csv_link::item::csv::{convert::Converter, mapping::Link, transform::Transformation};
///
/// let link = Link::new(0, "Registered")
///     .converter(Converter::DateMdy)
///     .transform(Transformation::StripSpaces);
///
/// assert_eq!(link.position, 0);
/// assert_eq!(link.transformations.len(), 1);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Link {
    /// 0-based column index in a line.
    pub position: usize,
    /// Name of the target record field.
    pub field: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub converter: Option<Converter>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub transformations: Vec<Transformation>,
}

impl Link {
    pub fn new(position: usize, field: impl Into<String>) -> Self {
        Self {
            position,
            field: field.into(),
            converter: None,
            transformations: Vec::new(),
        }
    }

    /// Overrides the converter chosen from the field kind.
    pub fn converter(mut self, converter: Converter) -> Self {
        self.converter = Some(converter);
        self
    }

    /// Appends a transformation to run before conversion.
    pub fn transform(mut self, transformation: Transformation) -> Self {
        self.transformations.push(transformation);
        self
    }
}

/// Builds one link per header cell, named after the raw cell text.
pub fn links_from_header(line: &str, delimiter: &str, text_delimiter: char) -> Vec<Link> {
    if line.is_empty() {
        return Vec::new();
    }

    split_line(line, delimiter, text_delimiter)
        .into_iter()
        .enumerate()
        .map(|(position, name)| Link::new(position, name))
        .collect()
}

/// A link joined to a record field, ready to process raw values.
#[derive(Debug, Clone)]
pub struct ResolvedLink {
    pub position: usize,
    pub field: &'static FieldDescriptor,
    pub converter: Converter,
    pub transformations: Transformations,
}

impl ResolvedLink {
    /// Turns a raw field into the value assigned to the record.
    ///
    /// 1. the null token gives null, before anything else
    /// 2. the transformation chain cleans the text
    /// 3. empty text gives null when `empty_value_as_null` is set
    /// 4. the converter parses what is left
    pub fn value(&self, raw: &str, null_token: &str, empty_value_as_null: bool) -> Option<Value> {
        if eq_ignore_case(raw, null_token) {
            return None;
        }

        let cleaned = self.transformations.process(raw);

        if empty_value_as_null && cleaned.is_empty() {
            return None;
        }

        let value = self.converter.parse(&cleaned);
        if value.is_none() && !cleaned.is_empty() {
            debug!(
                "{:?} is not a valid {} value for field {}, set to null",
                cleaned,
                self.converter.name(),
                self.field.name
            );
        }
        value
    }
}

fn eq_ignore_case(left: &str, right: &str) -> bool {
    left.chars()
        .flat_map(char::to_lowercase)
        .eq(right.chars().flat_map(char::to_lowercase))
}

/// The column to field mapping of one import.
///
/// Built once per import from the settings and the target record's field
/// table. The links it was resolved from (declared or derived from the header
/// line) are kept and exposed through [`ResolvedMapping::links`].
#[derive(Debug, Clone, Default)]
pub struct ResolvedMapping {
    links: Vec<Link>,
    resolved: Vec<ResolvedLink>,
    null_token: String,
    empty_value_as_null: bool,
}

impl ResolvedMapping {
    /// Joins `links` to the fields of `T`.
    ///
    /// Links naming no field of `T` are dropped; fields named by no link keep
    /// their default value.
    pub fn resolve<T: CsvRecord>(settings: &ImportSettings, links: Vec<Link>) -> Self {
        let fields: HashMap<String, &'static FieldDescriptor> = T::fields()
            .iter()
            .map(|field| (field.name.to_lowercase(), field))
            .collect();

        let mut resolved = Vec::with_capacity(links.len());
        for link in &links {
            let Some(field) = fields.get(&link.field.to_lowercase()).copied() else {
                debug!(
                    "link to {:?} at position {} matches no field, dropped",
                    link.field, link.position
                );
                continue;
            };

            let mut transformations = Transformations::for_field(settings.text_delimiter);
            transformations.extend(link.transformations.iter().cloned());

            let converter = link
                .converter
                .clone()
                .unwrap_or_else(|| Converter::for_kind(field.kind));

            debug!(
                "column {} -> field {} ({})",
                link.position,
                field.name,
                converter.name()
            );

            resolved.push(ResolvedLink {
                position: link.position,
                field,
                converter,
                transformations,
            });
        }

        Self {
            links,
            resolved,
            null_token: settings.null_token.clone(),
            empty_value_as_null: settings.empty_value_as_null,
        }
    }

    /// The links this mapping was resolved from.
    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn resolved(&self) -> &[ResolvedLink] {
        &self.resolved
    }

    /// Builds a record from the fields of one line.
    ///
    /// Links pointing past the end of a short line leave their field at its
    /// default value.
    pub fn populate<T: CsvRecord>(&self, fields: &[String]) -> T {
        let mut record = T::default();

        for link in &self.resolved {
            if let Some(raw) = fields.get(link.position) {
                let value = link.value(raw, &self.null_token, self.empty_value_as_null);
                record.set_field(link.field.name, value);
            }
        }

        record
    }
}
