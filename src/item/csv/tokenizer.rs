/// Splits one raw line into its fields.
///
/// The text delimiter toggles a quoted section in which delimiters are kept
/// as content. Text delimiters are kept in the output; they are removed later
/// by the quote-stripping transformation. A doubled text delimiter is not an
/// escape, only two toggles.
///
/// The last field is always emitted, so an empty line yields one empty field
/// and a trailing delimiter yields a trailing empty field.
///
/// An empty `delimiter` never matches and the whole line is one field.
///
/// # Examples
///
/// ```
/// use csv_link::item::csv::tokenizer::split_line;
///
/// let fields = split_line(r#"a,"b,c",d"#, ",", '"');
/// assert_eq!(fields, vec!["a", "\"b,c\"", "d"]);
///
/// let fields = split_line("a::b:c", "::", '"');
/// assert_eq!(fields, vec!["a", "b:c"]);
/// ```
pub fn split_line(line: &str, delimiter: &str, text_delimiter: char) -> Vec<String> {
    let mut chars = delimiter.chars();
    match (chars.next(), chars.next()) {
        (Some(single), None) => split_on_char(line, single, text_delimiter),
        (Some(_), Some(_)) => split_on_str(line, delimiter, text_delimiter),
        (None, _) => vec![line.to_string()],
    }
}

fn split_on_char(line: &str, delimiter: char, text_delimiter: char) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_text = false;

    for c in line.chars() {
        if c == text_delimiter {
            in_text = !in_text;
            current.push(c);
        } else if !in_text && c == delimiter {
            fields.push(std::mem::take(&mut current));
        } else {
            current.push(c);
        }
    }

    fields.push(current);
    fields
}

fn split_on_str(line: &str, delimiter: &str, text_delimiter: char) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_text = false;
    let mut rest = line;

    while let Some(c) = rest.chars().next() {
        if c == text_delimiter {
            in_text = !in_text;
        } else if !in_text && rest.starts_with(delimiter) {
            fields.push(std::mem::take(&mut current));
            rest = &rest[delimiter.len()..];
            continue;
        }

        current.push(c);
        rest = &rest[c.len_utf8()..];
    }

    fields.push(current);
    fields
}
