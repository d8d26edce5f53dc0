use std::borrow::Cow;

mod parsers;
mod scanner;

use parsers::{
    is_block_comment_end, is_block_comment_start, is_escape_string_start, is_identifier_byte,
    is_line_comment_start, matches_tag, try_start_dollar_quote,
};
use scanner::{State, scan_digits, scan_name};

use crate::types::Value;

/// Parameters for a pre-built SQL string.
///
/// Positional values fill `?` (in order) and `$N` (1-based) placeholders; named values fill
/// `:name` placeholders.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum Parameters<'a> {
    #[default]
    None,
    Positional(&'a [Value]),
    Named(&'a [(&'a str, Value)]),
}

impl<'a> Parameters<'a> {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Parameters::None => true,
            Parameters::Positional(values) => values.is_empty(),
            Parameters::Named(values) => values.is_empty(),
        }
    }

    fn positional(&self, index: usize) -> Option<&'a Value> {
        match self {
            Parameters::Positional(values) => values.get(index),
            _ => None,
        }
    }

    fn named(&self, name: &str) -> Option<&'a Value> {
        match self {
            Parameters::Named(values) => values
                .iter()
                .find(|(candidate, _)| *candidate == name)
                .map(|(_, value)| value),
            _ => None,
        }
    }
}

impl<'a> From<&'a [Value]> for Parameters<'a> {
    fn from(values: &'a [Value]) -> Self {
        Parameters::Positional(values)
    }
}

impl<'a> From<&'a [(&'a str, Value)]> for Parameters<'a> {
    fn from(values: &'a [(&'a str, Value)]) -> Self {
        Parameters::Named(values)
    }
}

/// Substitute placeholders in `sql` with literals produced by `escape`.
///
/// Placeholders inside quoted strings, quoted identifiers, comments and dollar-quoted blocks
/// are skipped, as are `::` casts. A placeholder without a matching parameter is left as-is so
/// the server reports it. Returns a borrowed `Cow` when nothing was substituted.
pub fn interpolate_parameters<'s, F>(sql: &'s str, params: &Parameters<'_>, escape: F) -> Cow<'s, str>
where
    F: Fn(&Value) -> String,
{
    if params.is_empty() {
        return Cow::Borrowed(sql);
    }

    let mut out: Option<String> = None;
    let mut copied = 0;
    let mut next_positional = 0;
    let mut state = State::Normal;
    let mut idx = 0;
    let bytes = sql.as_bytes();

    while idx < bytes.len() {
        let b = bytes[idx];
        match state {
            State::Normal => match b {
                b'\'' if is_escape_string_start(bytes, idx) => state = State::EscapeQuoted,
                b'\'' => state = State::SingleQuoted,
                b'"' => state = State::DoubleQuoted,
                _ if is_line_comment_start(bytes, idx) => {
                    state = State::LineComment;
                    idx += 1;
                }
                _ if is_block_comment_start(bytes, idx) => {
                    state = State::BlockComment(1);
                    idx += 1;
                }
                b':' if bytes.get(idx + 1) == Some(&b':') => idx += 1,
                b':' => {
                    if let Some((end, name)) = scan_name(bytes, idx + 1) {
                        if let Some(value) = params.named(name) {
                            splice(&mut out, &mut copied, sql, idx..end, &escape(value));
                        }
                        idx = end - 1;
                    }
                }
                b'?' => {
                    if let Some(value) = params.positional(next_positional) {
                        splice(&mut out, &mut copied, sql, idx..idx + 1, &escape(value));
                    }
                    next_positional += 1;
                }
                b'$' if idx == 0 || !is_identifier_byte(bytes[idx - 1]) => {
                    if let Some((tag, close)) = try_start_dollar_quote(bytes, idx) {
                        state = State::DollarQuoted(tag);
                        idx = close;
                    } else if let Some((end, digits)) = scan_digits(bytes, idx + 1) {
                        let value = digits
                            .parse::<usize>()
                            .ok()
                            .and_then(|n| n.checked_sub(1))
                            .and_then(|position| params.positional(position));
                        if let Some(value) = value {
                            splice(&mut out, &mut copied, sql, idx..end, &escape(value));
                        }
                        idx = end - 1;
                    }
                }
                _ => {}
            },
            State::SingleQuoted => {
                if b == b'\'' {
                    if bytes.get(idx + 1) == Some(&b'\'') {
                        idx += 1; // skip escaped quote
                    } else {
                        state = State::Normal;
                    }
                }
            }
            State::EscapeQuoted => {
                if b == b'\\' {
                    idx += 1;
                } else if b == b'\'' {
                    if bytes.get(idx + 1) == Some(&b'\'') {
                        idx += 1;
                    } else {
                        state = State::Normal;
                    }
                }
            }
            State::DoubleQuoted => {
                if b == b'"' {
                    if bytes.get(idx + 1) == Some(&b'"') {
                        idx += 1; // skip escaped quote
                    } else {
                        state = State::Normal;
                    }
                }
            }
            State::LineComment => {
                if b == b'\n' {
                    state = State::Normal;
                }
            }
            State::BlockComment(depth) => {
                if is_block_comment_start(bytes, idx) {
                    state = State::BlockComment(depth + 1);
                    idx += 1;
                } else if is_block_comment_end(bytes, idx) {
                    state = if depth == 1 {
                        State::Normal
                    } else {
                        State::BlockComment(depth - 1)
                    };
                    idx += 1;
                }
            }
            State::DollarQuoted(ref tag) => {
                if b == b'$' && matches_tag(bytes, idx, tag) {
                    let tag_len = tag.len();
                    state = State::Normal;
                    idx += tag_len + 1;
                }
            }
        }

        idx += 1;
    }

    match out {
        Some(mut buf) => {
            buf.push_str(&sql[copied..]);
            Cow::Owned(buf)
        }
        None => Cow::Borrowed(sql),
    }
}

fn splice(
    out: &mut Option<String>,
    copied: &mut usize,
    sql: &str,
    range: std::ops::Range<usize>,
    replacement: &str,
) {
    let buf = out.get_or_insert_with(|| String::with_capacity(sql.len() + replacement.len()));
    buf.push_str(&sql[*copied..range.start]);
    buf.push_str(replacement);
    *copied = range.end;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(value: &Value) -> String {
        match value {
            Value::Int(i) => i.to_string(),
            Value::Text(s) => format!("'{}'", s.replace('\'', "''")),
            _ => "NULL".to_string(),
        }
    }

    #[test]
    fn substitutes_question_marks_in_order() {
        let params = [Value::Int(1), Value::Text("bob".into())];
        let res = interpolate_parameters(
            "select * from t where a = ? and b = ?",
            &Parameters::Positional(&params),
            render,
        );
        assert_eq!(res, "select * from t where a = 1 and b = 'bob'");
    }

    #[test]
    fn substitutes_numbered_placeholders() {
        let params = [Value::Int(7), Value::Int(8)];
        let res = interpolate_parameters(
            "insert into t values($2, $1, $2)",
            &Parameters::Positional(&params),
            render,
        );
        assert_eq!(res, "insert into t values(8, 7, 8)");
    }

    #[test]
    fn substitutes_named_placeholders_and_keeps_casts() {
        let params = [("id", Value::Int(3)), ("name", Value::Text("x".into()))];
        let res = interpolate_parameters(
            "select :name::text where id = :id",
            &Parameters::Named(&params),
            render,
        );
        assert_eq!(res, "select 'x'::text where id = 3");
    }

    #[test]
    fn skips_inside_literals_and_comments() {
        let params = [Value::Int(1)];
        let sql = "select '?', \"?\" -- ?\n/* ? /* ? */ ? */ from t where a = ?";
        let res = interpolate_parameters(sql, &Parameters::Positional(&params), render);
        assert_eq!(
            res,
            "select '?', \"?\" -- ?\n/* ? /* ? */ ? */ from t where a = 1"
        );
    }

    #[test]
    fn skips_escape_strings_with_backslashed_quotes() {
        let params = [Value::Int(5)];
        let sql = r"select E'it\'s ?' || $1";
        let res = interpolate_parameters(sql, &Parameters::Positional(&params), render);
        assert_eq!(res, r"select E'it\'s ?' || 5");
    }

    #[test]
    fn skips_dollar_quoted_blocks() {
        let params = [Value::Int(9)];
        let sql = "$foo$ select $1 from t $foo$ where a = $1";
        let res = interpolate_parameters(sql, &Parameters::Positional(&params), render);
        assert_eq!(res, "$foo$ select $1 from t $foo$ where a = 9");
    }

    #[test]
    fn leaves_unmatched_placeholders_verbatim() {
        let params = [Value::Int(1)];
        let res = interpolate_parameters(
            "select ?, ?, $4, :missing",
            &Parameters::Positional(&params),
            render,
        );
        assert_eq!(res, "select 1, ?, $4, :missing");
    }

    #[test]
    fn preserves_multibyte_text() {
        let params = [Value::Text("ö".into())];
        let res = interpolate_parameters(
            "select 'größe', ?",
            &Parameters::Positional(&params),
            render,
        );
        assert_eq!(res, "select 'größe', 'ö'");
    }

    #[test]
    fn empty_parameters_borrow_input() {
        let sql = "select * from t where a = ?";
        let res = interpolate_parameters(sql, &Parameters::None, render);
        assert!(matches!(res, Cow::Borrowed(_)));
        assert_eq!(res, sql);
    }
}
