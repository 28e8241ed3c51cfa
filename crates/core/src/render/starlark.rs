//! Starlark literals

use crate::label::Label;

pub(crate) const INDENT: &str = "    ";

/// A value with a single-line Starlark literal form
pub trait StarlarkValue {
    fn to_starlark(&self) -> String;
}

impl StarlarkValue for bool {
    fn to_starlark(&self) -> String {
        let literal = if *self { "True" } else { "False" };
        literal.to_string()
    }
}

impl StarlarkValue for i64 {
    fn to_starlark(&self) -> String {
        self.to_string()
    }
}

impl StarlarkValue for String {
    fn to_starlark(&self) -> String {
        quote(self)
    }
}

impl StarlarkValue for Label {
    fn to_starlark(&self) -> String {
        quote(self.as_str())
    }
}

pub const NONE: &str = "None";

/// Double-quoted string with `\`, `"`, newline and tab escaped
pub fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

pub(crate) fn indent(level: usize) -> String {
    INDENT.repeat(level)
}

/// List literal whose first line continues the current line at `level`.
///
/// Empty and single-element lists stay on one line; longer lists put one
/// element per line with a trailing comma.
pub fn list_literal<T: StarlarkValue>(items: &[T], level: usize) -> String {
    match items {
        [] => "[]".to_string(),
        [item] => format!("[{}]", item.to_starlark()),
        _ => {
            let mut out = String::from("[\n");
            let inner = indent(level + 1);
            for item in items {
                out.push_str(&inner);
                out.push_str(&item.to_starlark());
                out.push_str(",\n");
            }
            out.push_str(&indent(level));
            out.push(']');
            out
        }
    }
}
