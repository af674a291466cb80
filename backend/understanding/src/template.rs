//! Named-placeholder prompt templates.
//!
//! `{name}` is replaced by the value mapped to `name`; `{{` and `}}` produce
//! literal braces. Substitution is strict: every placeholder must have a value.

use std::collections::HashMap;

use vidlens_core::TemplateError;

/// Render `template` against `values`.
pub fn render(template: &str, values: &HashMap<String, String>) -> Result<String, TemplateError> {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        match c {
            '{' => {
                if let Some((_, '{')) = chars.peek() {
                    chars.next();
                    out.push('{');
                    continue;
                }
                let start = i + 1;
                let mut end = None;
                for (j, c) in chars.by_ref() {
                    match c {
                        '}' => {
                            end = Some(j);
                            break;
                        }
                        '{' => return Err(TemplateError::UnmatchedBrace(i)),
                        _ => {}
                    }
                }
                let end = end.ok_or(TemplateError::UnmatchedBrace(i))?;
                let name = &template[start..end];
                if name.is_empty() {
                    return Err(TemplateError::EmptyPlaceholder(i));
                }
                let value = values
                    .get(name)
                    .ok_or_else(|| TemplateError::MissingValue(name.to_string()))?;
                out.push_str(value);
            }
            '}' => {
                if let Some((_, '}')) = chars.peek() {
                    chars.next();
                    out.push('}');
                } else {
                    return Err(TemplateError::UnmatchedBrace(i));
                }
            }
            c => out.push(c),
        }
    }

    Ok(out)
}
