//! Batch-import parsing for text pasted from spreadsheets.
//!
//! One record per non-empty line; columns split on the first delimiter found
//! (tab preferred, then semicolon, then comma). Numbers accept the Brazilian
//! convention (thousands dots, decimal comma, optional `R$` prefix) and dates
//! accept `dd/mm/yyyy`, `dd/mm/yy`, ISO, and the Portuguese long form
//! ("12 de março de 2024"). Parsing is all-or-nothing: failures are
//! collected per line and the whole batch is rejected.

use chrono::NaiveDate;
use thiserror::Error;

use crate::quote::QuoteType;

/// One parsed item line: `item_number?; specification; unit; quantity`.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemRow {
    /// Explicit number from a leading integer column, if present.
    pub item_number: Option<u32>,
    pub specification: String,
    pub unit: String,
    pub quantity: f64,
}

/// One parsed quote line: `source; quote_date; unit_price; quote_type?`.
#[derive(Debug, Clone, PartialEq)]
pub struct QuoteRow {
    pub source: String,
    pub quote_date: NaiveDate,
    pub unit_price: f64,
    pub quote_type: QuoteType,
}

/// A single line that failed to parse (1-based line index).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowError {
    pub line: usize,
    pub reason: String,
}

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("empty import: no data rows found")]
    Empty,

    #[error("{} row(s) failed to parse: {}", .0.len(), summarize(.0))]
    Rows(Vec<RowError>),
}

fn summarize(rows: &[RowError]) -> String {
    rows.iter()
        .map(|r| format!("line {}: {}", r.line, r.reason))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Parse pasted item rows.
pub fn parse_items(text: &str) -> Result<Vec<ItemRow>, ImportError> {
    parse_rows(text, parse_item_line)
}

/// Parse pasted quote rows.
pub fn parse_quotes(text: &str) -> Result<Vec<QuoteRow>, ImportError> {
    parse_rows(text, parse_quote_line)
}

fn parse_rows<T>(
    text: &str,
    parse_line: impl Fn(&str) -> Result<T, String>,
) -> Result<Vec<T>, ImportError> {
    let mut rows = Vec::new();
    let mut errors = Vec::new();

    for (idx, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match parse_line(line) {
            Ok(row) => rows.push(row),
            Err(reason) => errors.push(RowError { line: idx + 1, reason }),
        }
    }

    if !errors.is_empty() {
        return Err(ImportError::Rows(errors));
    }
    if rows.is_empty() {
        return Err(ImportError::Empty);
    }
    Ok(rows)
}

fn parse_item_line(line: &str) -> Result<ItemRow, String> {
    let mut cols = split_columns(line);

    // A leading integer column is the explicit item number.
    let item_number = match cols.first().and_then(|c| c.parse::<u32>().ok()) {
        Some(n) => {
            cols.remove(0);
            Some(n)
        }
        None => None,
    };

    if cols.len() < 3 {
        return Err("expected columns: [item_number;] specification; unit; quantity".to_string());
    }

    let quantity = parse_number(&cols[2])
        .ok_or_else(|| format!("invalid quantity '{}'", cols[2]))?;

    Ok(ItemRow {
        item_number,
        specification: cols[0].clone(),
        unit: cols[1].clone(),
        quantity,
    })
}

fn parse_quote_line(line: &str) -> Result<QuoteRow, String> {
    let cols = split_columns(line);
    if cols.len() < 3 {
        return Err("expected columns: source; quote_date; unit_price[; quote_type]".to_string());
    }

    let quote_date = parse_date(&cols[1])
        .ok_or_else(|| format!("invalid date '{}'", cols[1]))?;
    let unit_price = parse_price(&cols[2])
        .ok_or_else(|| format!("invalid price '{}'", cols[2]))?;
    let quote_type = match cols.get(3) {
        Some(label) => QuoteType::parse(label).map_err(|e| e.to_string())?,
        None => QuoteType::Private,
    };

    Ok(QuoteRow {
        source: cols[0].clone(),
        quote_date,
        unit_price,
        quote_type,
    })
}

/// Split a line on its delimiter: tab if present, else semicolon, else comma.
fn split_columns(line: &str) -> Vec<String> {
    let delim = if line.contains('\t') {
        '\t'
    } else if line.contains(';') {
        ';'
    } else {
        ','
    };
    line.split(delim).map(|c| c.trim().to_string()).collect()
}

/// Parse a number in either `1.234,56` (pt-BR) or `1234.56` convention.
pub fn parse_number(raw: &str) -> Option<f64> {
    let s = raw.trim().replace(' ', "");
    if s.is_empty() {
        return None;
    }
    let normalized = if s.contains(',') {
        // Dots are thousands separators when a decimal comma is present.
        s.replace('.', "").replace(',', ".")
    } else {
        s
    };
    normalized.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse a monetary value, tolerating an `R$` prefix.
pub fn parse_price(raw: &str) -> Option<f64> {
    let s = raw.trim();
    let s = s
        .strip_prefix("R$")
        .or_else(|| s.strip_prefix("r$"))
        .unwrap_or(s);
    parse_number(s)
}

/// Parse a date in `dd/mm/yyyy`, `dd/mm/yy`, ISO, or Portuguese long form.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    for fmt in ["%d/%m/%Y", "%d/%m/%y", "%Y-%m-%d"] {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }
    parse_date_pt(s)
}

/// "12 de março de 2024" / "12 mar 2024", accent- and case-tolerant.
fn parse_date_pt(s: &str) -> Option<NaiveDate> {
    let folded = fold_accents(&s.to_lowercase());
    let tokens: Vec<&str> = folded
        .split_whitespace()
        .filter(|t| *t != "de")
        .collect();
    if tokens.len() != 3 {
        return None;
    }

    let day: u32 = tokens[0].parse().ok()?;
    let month = month_from_name(tokens[1])?;
    let year: i32 = tokens[2].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

fn month_from_name(name: &str) -> Option<u32> {
    // Full names and 3-letter abbreviations share a prefix after folding.
    let key: String = name.chars().take(3).collect();
    let month = match key.as_str() {
        "jan" => 1,
        "fev" => 2,
        "mar" => 3,
        "abr" => 4,
        "mai" => 5,
        "jun" => 6,
        "jul" => 7,
        "ago" => 8,
        "set" => 9,
        "out" => 10,
        "nov" => 11,
        "dez" => 12,
        _ => return None,
    };
    Some(month)
}

fn fold_accents(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            'á' | 'à' | 'â' | 'ã' => 'a',
            'é' | 'ê' => 'e',
            'í' => 'i',
            'ó' | 'ô' | 'õ' => 'o',
            'ú' | 'ü' => 'u',
            'ç' => 'c',
            other => other,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn item_rows_split_on_tabs() {
        let text = "1\tCaneta esferográfica azul\tun\t500\n2\tPapel A4 75g\tcx\t30";
        let rows = parse_items(text).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].item_number, Some(1));
        assert_eq!(rows[0].specification, "Caneta esferográfica azul");
        assert_eq!(rows[0].unit, "un");
        assert_eq!(rows[0].quantity, 500.0);
    }

    #[test]
    fn item_rows_without_leading_number() {
        let rows = parse_items("Grampeador de mesa;un;12,5").unwrap();
        assert_eq!(rows[0].item_number, None);
        assert_eq!(rows[0].quantity, 12.5);
    }

    #[test]
    fn blank_lines_are_skipped() {
        let rows = parse_items("1;Caneta;un;10\n\n  \n2;Lápis;un;20\n").unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn quote_rows_with_brl_prices_and_pt_dates() {
        let text = "Fornecedor A;12 de março de 2024;R$ 1.234,56;privado\n\
                    Painel de Preços;2024-01-05;789,00;publico";
        let rows = parse_quotes(text).unwrap();
        assert_eq!(rows[0].source, "Fornecedor A");
        assert_eq!(rows[0].quote_date, date(2024, 3, 12));
        assert_eq!(rows[0].unit_price, 1234.56);
        assert_eq!(rows[0].quote_type, QuoteType::Private);
        assert_eq!(rows[1].quote_date, date(2024, 1, 5));
        assert_eq!(rows[1].unit_price, 789.0);
        assert_eq!(rows[1].quote_type, QuoteType::Public);
    }

    #[test]
    fn quote_type_defaults_to_private_when_column_missing() {
        let rows = parse_quotes("Fornecedor B\t05/02/2024\t10,00").unwrap();
        assert_eq!(rows[0].quote_type, QuoteType::Private);
    }

    #[test]
    fn failures_are_reported_per_line() {
        let text = "Fornecedor A;12/03/2024;R$ 10,00\n\
                    Fornecedor B;not-a-date;R$ 5,00\n\
                    Fornecedor C;01/04/2024;free";
        let err = parse_quotes(text).unwrap_err();
        match err {
            ImportError::Rows(rows) => {
                assert_eq!(rows.len(), 2);
                assert_eq!(rows[0].line, 2);
                assert!(rows[0].reason.contains("not-a-date"));
                assert_eq!(rows[1].line, 3);
                assert!(rows[1].reason.contains("free"));
            }
            _ => panic!("expected ImportError::Rows"),
        }
    }

    #[test]
    fn empty_paste_is_rejected() {
        assert!(matches!(parse_items("\n \n"), Err(ImportError::Empty)));
    }

    #[test]
    fn date_formats() {
        assert_eq!(parse_date("12/03/2024"), Some(date(2024, 3, 12)));
        assert_eq!(parse_date("12/03/24"), Some(date(2024, 3, 12)));
        assert_eq!(parse_date("2024-03-12"), Some(date(2024, 3, 12)));
        assert_eq!(parse_date("12 de março de 2024"), Some(date(2024, 3, 12)));
        assert_eq!(parse_date("12 de marco de 2024"), Some(date(2024, 3, 12)));
        assert_eq!(parse_date("1 DE JANEIRO DE 2025"), Some(date(2025, 1, 1)));
        assert_eq!(parse_date("3 dez 2023"), Some(date(2023, 12, 3)));
        assert_eq!(parse_date("31 de fevereiro de 2024"), None);
        assert_eq!(parse_date("soon"), None);
    }

    #[test]
    fn price_formats() {
        assert_eq!(parse_price("R$ 1.234,56"), Some(1234.56));
        assert_eq!(parse_price("r$ 0,99"), Some(0.99));
        assert_eq!(parse_price("15,5"), Some(15.5));
        assert_eq!(parse_price("15.5"), Some(15.5));
        assert_eq!(parse_price("1234"), Some(1234.0));
        assert_eq!(parse_price("R$"), None);
        assert_eq!(parse_price("ten"), None);
    }
}
