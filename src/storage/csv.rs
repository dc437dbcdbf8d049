// CSV interchange in the `timestamp,url,price` layout of the legacy prices.csv
use crate::model::Observation;
use crate::utils::parse_datetime;
use std::io::{self, Write};
use std::mem::take;

pub const HEADER: [&str; 3] = ["timestamp", "url", "price"];

/// Result of reading a CSV log: the usable rows plus how many were dropped.
#[derive(Debug, Default)]
pub struct CsvImport {
    pub observations: Vec<Observation>,
    pub skipped: usize,
}

/// Parses a CSV log. The header row is optional; rows with an unparseable
/// timestamp or price are counted in `skipped`, never coerced.
pub fn parse_observations(text: &str) -> CsvImport {
    let mut import = CsvImport::default();
    for (i, row) in parse_rows(text).into_iter().enumerate() {
        if i == 0 && row.first().is_some_and(|c| c.trim().eq_ignore_ascii_case(HEADER[0])) {
            continue;
        }
        match row_to_observation(&row) {
            Some(o) => import.observations.push(o),
            None => import.skipped += 1,
        }
    }
    import
}

fn row_to_observation(row: &[String]) -> Option<Observation> {
    let [timestamp, url, price] = row else {
        return None;
    };
    let timestamp = parse_datetime(timestamp)?;
    let price: f64 = price.trim().parse().ok()?;
    if !price.is_finite() || price < 0.0 || url.trim().is_empty() {
        return None;
    }
    Some(Observation {
        timestamp,
        url: url.trim().to_string(),
        price,
    })
}

/// Minimal CSV parser (quotes + CRLF tolerant).
fn parse_rows(text: &str) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    let mut field = String::new();
    let mut row = Vec::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' => {
                if in_quotes && matches!(chars.peek(), Some('"')) {
                    chars.next(); // escaped quote
                    field.push('"');
                } else {
                    in_quotes = !in_quotes;
                }
            }
            ',' if !in_quotes => row.push(take(&mut field)),
            '\n' | '\r' if !in_quotes => {
                if ch == '\r' && matches!(chars.peek(), Some('\n')) {
                    chars.next();
                }
                row.push(take(&mut field));
                if !(row.len() == 1 && row[0].is_empty()) {
                    rows.push(take(&mut row));
                } else {
                    row.clear();
                }
            }
            _ => field.push(ch),
        }
    }

    if !field.is_empty() || !row.is_empty() {
        row.push(field);
        rows.push(row);
    }
    rows
}

fn write_field<W: Write>(w: &mut W, field: &str) -> io::Result<()> {
    if field.contains([',', '"', '\n', '\r']) {
        write!(w, "\"{}\"", field.replace('"', "\"\""))
    } else {
        write!(w, "{}", field)
    }
}

/// Writes the header and one row per observation.
pub fn write_observations<W: Write>(mut w: W, observations: &[Observation]) -> io::Result<()> {
    writeln!(w, "{}", HEADER.join(","))?;
    for o in observations {
        write_field(&mut w, &o.timestamp.to_rfc3339())?;
        write!(w, ",")?;
        write_field(&mut w, &o.url)?;
        writeln!(w, ",{}", o.price)?;
    }
    w.flush()
}
