//! Output formatters for load results.

use clap::ValueEnum;
use comfy_table::{Cell, Table};
use relmap_core::{ClassDefinition, LoadReport, MemoryRegistry};
use serde::Serialize;

/// Output format for results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// ASCII table format
    Table,
    /// JSON format
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Trait for formatting output.
pub trait Formatter {
    /// Format the classes registered by a load.
    fn format_load(&self, report: &LoadReport, registry: &MemoryRegistry) -> String;
}

/// Create a formatter for the given output format.
pub fn create_formatter(format: OutputFormat) -> Box<dyn Formatter> {
    match format {
        OutputFormat::Table => Box::new(TableFormatter),
        OutputFormat::Json => Box::new(JsonFormatter),
    }
}

/// Table formatter using comfy-table.
pub struct TableFormatter;

impl Formatter for TableFormatter {
    fn format_load(&self, report: &LoadReport, registry: &MemoryRegistry) -> String {
        if registry.is_empty() {
            return with_warnings("No classes".to_string(), report);
        }

        let mut output = format_classes(registry.classes());

        let relationships = format_relationships(registry.classes());
        if let Some(relationships) = relationships {
            output.push_str("\n\n");
            output.push_str(&relationships);
        }

        with_warnings(output, report)
    }
}

/// JSON formatter.
pub struct JsonFormatter;

#[derive(Serialize)]
struct JsonOutput<'a> {
    classes: Vec<&'a ClassDefinition>,
    report: &'a LoadReport,
}

impl Formatter for JsonFormatter {
    fn format_load(&self, report: &LoadReport, registry: &MemoryRegistry) -> String {
        let output = JsonOutput {
            classes: registry.classes().collect(),
            report,
        };
        serde_json::to_string_pretty(&output).unwrap_or_else(|_| "{}".to_string())
    }
}

fn format_classes<'a>(classes: impl Iterator<Item = &'a ClassDefinition>) -> String {
    let mut table = Table::new();
    table.set_header(vec!["Class", "Table", "Columns", "Primary key", "Mixins"]);

    for class in classes {
        let columns: Vec<&str> = class.columns.iter().map(|c| c.name.as_str()).collect();
        table.add_row(vec![
            Cell::new(&class.moniker),
            Cell::new(&class.table),
            Cell::new(columns.join(", ")),
            Cell::new(class.primary_key.join(", ")),
            Cell::new(class.mixins.join(", ")),
        ]);
    }

    table.to_string()
}

fn format_relationships<'a>(
    classes: impl Iterator<Item = &'a ClassDefinition>,
) -> Option<String> {
    let mut table = Table::new();
    table.set_header(vec!["Class", "Accessor", "Kind", "Target", "Condition"]);

    let mut rows = 0;
    for class in classes {
        for relationship in &class.relationships {
            table.add_row(vec![
                Cell::new(&class.moniker),
                Cell::new(&relationship.accessor),
                Cell::new(relationship.kind),
                Cell::new(&relationship.target),
                Cell::new(&relationship.condition),
            ]);
            rows += 1;
        }
    }

    (rows > 0).then(|| table.to_string())
}

fn with_warnings(mut output: String, report: &LoadReport) -> String {
    for warning in &report.warnings {
        output.push_str(&format!("\nwarning: {}", warning));
    }
    output
}
