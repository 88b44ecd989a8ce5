//! Output formatting for CLI
//!
//! Every format is rendered to a `String` first; the `print_*` helpers only
//! decide the stream.

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;

/// Output format
#[derive(Debug, Clone, Copy, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable table format
    #[default]
    Table,
    /// JSON format
    Json,
    /// YAML format
    Yaml,
    /// Plain text format
    Plain,
}

/// Trait for items that can be displayed in a table
pub trait TableDisplay {
    fn headers() -> Vec<&'static str>;
    fn row(&self) -> Vec<String>;
}

fn render_table<T: TableDisplay>(items: &[T]) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(T::headers());
    for item in items {
        table.add_row(item.row());
    }
    table.to_string()
}

fn render_plain<T: TableDisplay>(items: &[T]) -> String {
    items
        .iter()
        .map(|item| {
            T::headers()
                .iter()
                .zip(item.row())
                .map(|(header, value)| format!("{}: {}", header, value))
                .collect::<Vec<_>>()
                .join("\n")
        })
        .collect::<Vec<_>>()
        .join("\n---\n")
}

fn render_serialized<T: Serialize + ?Sized>(value: &T, format: OutputFormat) -> String {
    match format {
        OutputFormat::Yaml => serde_yaml::to_string(value)
            .unwrap_or_default()
            .trim_end()
            .to_string(),
        _ => serde_json::to_string_pretty(value).unwrap_or_default(),
    }
}

/// Render records in the requested format, without a trailing newline
pub fn render_list<T: Serialize + TableDisplay>(items: &[T], format: OutputFormat) -> String {
    match format {
        OutputFormat::Json if items.is_empty() => "[]".to_string(),
        _ if items.is_empty() => "No items found.".to_string(),
        OutputFormat::Table => render_table(items),
        OutputFormat::Plain => render_plain(items),
        OutputFormat::Json | OutputFormat::Yaml => render_serialized(items, format),
    }
}

/// Render one record; JSON and YAML show it bare rather than as a list
pub fn render_item<T: Serialize + TableDisplay>(item: &T, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json | OutputFormat::Yaml => render_serialized(item, format),
        _ => render_list(std::slice::from_ref(item), format),
    }
}

pub fn render_message(message: &str, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => serde_json::json!({ "message": message }).to_string(),
        _ => message.to_string(),
    }
}

/// Print a single item
pub fn print_item<T: Serialize + TableDisplay>(item: &T, format: OutputFormat) {
    println!("{}", render_item(item, format));
}

/// Print a list of items
pub fn print_list<T: Serialize + TableDisplay>(items: &[T], format: OutputFormat) {
    println!("{}", render_list(items, format));
}

/// Print a serializable document as-is; tables have no layout for it
pub fn print_document<T: Serialize + ?Sized>(doc: &T, format: OutputFormat) {
    println!("{}", render_serialized(doc, format));
}

/// Print a simple message
pub fn print_message(message: &str, format: OutputFormat) {
    println!("{}", render_message(message, format));
}

/// Print success message
pub fn print_success(message: &str) {
    println!("✅ {}", message);
}

/// Print error message
pub fn print_error(message: &str) {
    eprintln!("❌ {}", message);
}

/// Print warning message
pub fn print_warning(message: &str) {
    println!("⚠️  {}", message);
}

/// Print info message
pub fn print_info(message: &str) {
    println!("ℹ️  {}", message);
}
