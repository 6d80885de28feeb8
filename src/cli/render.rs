//! Result rendering: flat JSON object or wrapped `key: value` lines

use itertools::Itertools;

use crate::cli::{CliError, CliResult};
use crate::config::OutputFormat;
use crate::domain::{CommandResult, FieldValue};

/// Render a result. A unit result renders to nothing in either format.
pub fn render(
    result: &CommandResult,
    format: OutputFormat,
    wrap_width: usize,
) -> CliResult<Option<String>> {
    let Some(fields) = result.fields() else {
        return Ok(None);
    };
    let rendered = match format {
        OutputFormat::Json => serde_json::to_string(fields)
            .map_err(|e| CliError::Usage(format!("cannot encode result as JSON: {e}")))?,
        OutputFormat::Text => render_text(fields.iter(), wrap_width),
    };
    Ok(Some(rendered))
}

fn field_text(value: &FieldValue) -> String {
    match value {
        FieldValue::Text(s) => s.clone(),
        FieldValue::List(items) => items.iter().join(", "),
    }
}

/// One `key: value` row per field; keys are aligned and values wrap at
/// `wrap_width` columns with continuation lines indented under the value.
fn render_text<'a>(
    fields: impl Iterator<Item = (&'a String, &'a FieldValue)> + Clone,
    wrap_width: usize,
) -> String {
    let key_width = fields.clone().map(|(k, _)| k.chars().count() + 1).max().unwrap_or(0);
    let indent = " ".repeat(key_width + 1);

    fields
        .map(|(key, value)| {
            let label = format!("{key}:");
            let lines = wrap(&field_text(value), wrap_width);
            let mut row = format!("{label:<key_width$} {}", lines[0]);
            for line in &lines[1..] {
                row.push('\n');
                row.push_str(&indent);
                row.push_str(line);
            }
            row.trim_end().to_string()
        })
        .join("\n")
}

/// Greedy word wrap; words longer than `width` are split. Always returns
/// at least one line.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            let mut word: Vec<char> = word.chars().collect();
            while word.len() > width {
                if !current.is_empty() {
                    lines.push(std::mem::take(&mut current));
                }
                lines.push(word.drain(..width).collect());
            }
            let word: String = word.into_iter().collect();
            if word.is_empty() {
                continue;
            }
            let needed = if current.is_empty() {
                word.chars().count()
            } else {
                current.chars().count() + 1 + word.chars().count()
            };
            if needed > width && !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(&word);
        }
        lines.push(current);
    }
    lines
}
