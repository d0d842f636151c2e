use std::io::{IsTerminal, Write};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
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

/// Print `rows` in the chosen format. `Raw` prints the first column only.
pub fn print_rows<T: Serialize>(
    rows: &[T],
    header: &[&str],
    cells: impl Fn(&T) -> Vec<String>,
    format: OutputFormat,
) {
    match format {
        OutputFormat::Json => println!("{}", to_json(&rows)),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(header.to_vec());
            for row in rows {
                table.add_row(cells(row));
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for row in rows {
                let line = header
                    .iter()
                    .zip(cells(row))
                    .map(|(name, value)| format!("{}={value}", name.to_lowercase()))
                    .collect::<Vec<_>>()
                    .join(" ");
                println!("{line}");
            }
        }
        OutputFormat::Raw => {
            for row in rows {
                if let Some(first) = cells(row).into_iter().next() {
                    println!("{first}");
                }
            }
        }
    }
}

pub fn to_json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

/// Lowercase hex with no separators.
pub fn hex(data: &[u8]) -> String {
    data.iter().map(|b| format!("{b:02x}")).collect()
}

/// Parse hex digits, ignoring whitespace and an optional `0x` prefix.
pub fn parse_hex(input: &str) -> Option<Vec<u8>> {
    let digits: String = input
        .trim()
        .trim_start_matches("0x")
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    if digits.len() % 2 != 0 {
        return None;
    }
    (0..digits.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&digits[i..i + 2], 16).ok())
        .collect()
}
