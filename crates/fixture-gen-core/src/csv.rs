use std::borrow::Cow;

pub(crate) fn escape_field(value: &str) -> Cow<'_, str> {
    if value.contains(',') || value.contains('"') || value.contains('\n') || value.contains('\r') {
        Cow::Owned(format!("\"{}\"", value.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(value)
    }
}

pub(crate) fn join_row<S: AsRef<str>>(fields: &[S]) -> String {
    fields
        .iter()
        .map(|field| escape_field(field.as_ref()))
        .collect::<Vec<_>>()
        .join(",")
}

/// Splits one CSV line into fields, undoing `""` escapes inside quoted fields.
///
/// Returns `None` when a quoted field is never closed.
#[must_use]
pub fn split_row(line: &str) -> Option<Vec<String>> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        if in_quotes {
            match ch {
                '"' if chars.peek() == Some(&'"') => {
                    current.push('"');
                    chars.next();
                }
                '"' => in_quotes = false,
                other => current.push(other),
            }
            continue;
        }

        match ch {
            '"' if current.is_empty() => in_quotes = true,
            ',' => fields.push(std::mem::take(&mut current)),
            other => current.push(other),
        }
    }

    if in_quotes {
        return None;
    }
    fields.push(current);
    Some(fields)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_fields_are_not_quoted() {
        assert_eq!(join_row(&["todo-000001", "Todo 1", ""]), "todo-000001,Todo 1,");
    }

    #[test]
    fn commas_and_quotes_are_escaped_and_recovered() {
        let row = join_row(&["a,b", "say \"hi\"", "plain"]);
        assert_eq!(row, "\"a,b\",\"say \"\"hi\"\"\",plain");
        assert_eq!(
            split_row(&row),
            Some(vec!["a,b".to_string(), "say \"hi\"".to_string(), "plain".to_string()])
        );
    }

    #[test]
    fn trailing_empty_field_is_kept() {
        assert_eq!(split_row("a,,"), Some(vec!["a".to_string(), String::new(), String::new()]));
    }

    #[test]
    fn unterminated_quote_is_rejected() {
        assert_eq!(split_row("a,\"open"), None);
    }
}
