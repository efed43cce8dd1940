use std::io::IsTerminal;

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

/// Command result that can be rendered in every [`OutputFormat`].
pub trait Report: Serialize {
    fn columns(&self) -> Vec<&'static str>;
    fn rows(&self) -> Vec<Vec<String>>;
}

pub fn render<R: Report>(report: &R, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => {
            serde_json::to_string(report).unwrap_or_else(|_| "{}".to_string())
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(report.columns());
            for row in report.rows() {
                table.add_row(row);
            }
            table.to_string()
        }
        OutputFormat::Pretty => {
            let columns = report.columns();
            report
                .rows()
                .iter()
                .map(|row| {
                    columns
                        .iter()
                        .zip(row)
                        .map(|(column, value)| format!("{}={value}", column.to_lowercase()))
                        .collect::<Vec<_>>()
                        .join(" ")
                })
                .collect::<Vec<_>>()
                .join("\n")
        }
    }
}

pub fn print_report<R: Report>(report: &R, format: OutputFormat) {
    println!("{}", render(report, format));
}

pub fn payload_preview(payload: &[u8]) -> String {
    match std::str::from_utf8(payload) {
        Ok(text) => text.to_string(),
        Err(_) => format!("<binary {} bytes>", payload.len()),
    }
}
