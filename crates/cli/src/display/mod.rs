pub mod formatter;

pub use formatter::{format_explanation, format_summary, print_explanation, print_summary};
