// src/ingest/records.rs

use tracing::{debug, trace};

use super::line::parse_line;
use crate::error::IngestError;
use crate::model::PopulationRecord;

/// Header names the population CSV must carry, compared case-insensitively.
pub const REQUIRED_COLUMNS: [&str; 4] = ["country name", "country code", "year", "value"];

/// Result of extracting a CSV document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extraction {
    pub records: Vec<PopulationRecord>,
    /// Data lines dropped because they were blank or carried a bad year/value.
    pub skipped: usize,
}

/// Positions of the required columns within a header row.
#[derive(Debug, Clone, Copy)]
struct ColumnIndex {
    name: usize,
    code: usize,
    year: usize,
    value: usize,
}

impl ColumnIndex {
    fn resolve(headers: &[String]) -> Result<Self, IngestError> {
        let normalized: Vec<String> = headers
            .iter()
            .map(|h| h.trim().trim_start_matches('\u{feff}').trim().to_lowercase())
            .collect();
        let find = |wanted: &str| normalized.iter().position(|h| h == wanted);

        let positions: Vec<Option<usize>> = REQUIRED_COLUMNS.iter().map(|&c| find(c)).collect();
        let missing: Vec<&'static str> = REQUIRED_COLUMNS
            .iter()
            .zip(&positions)
            .filter(|(_, pos)| pos.is_none())
            .map(|(name, _)| *name)
            .collect();

        match positions.as_slice() {
            [Some(name), Some(code), Some(year), Some(value)] => Ok(Self {
                name: *name,
                code: *code,
                year: *year,
                value: *value,
            }),
            _ => Err(IngestError::MissingColumns {
                missing,
                headers: headers.to_vec(),
            }),
        }
    }
}

/// Parse a full population CSV document.
///
/// Fails only when the header row lacks a required column. Rows with a
/// non-numeric or non-finite year/value are skipped and counted.
pub fn extract(text: &str) -> Result<Extraction, IngestError> {
    let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
    let mut lines = normalized.lines().filter(|l| !l.is_empty());

    let Some(header_line) = lines.next() else {
        return Err(IngestError::MissingColumns {
            missing: REQUIRED_COLUMNS.to_vec(),
            headers: Vec::new(),
        });
    };
    let headers = parse_line(header_line);
    let idx = ColumnIndex::resolve(&headers)?;

    let mut out = Extraction::default();
    for (line_no, line) in lines.enumerate() {
        match parse_row(line, idx) {
            Some(record) => out.records.push(record),
            None => {
                trace!(line = line_no + 2, "skipping row");
                out.skipped += 1;
            }
        }
    }

    debug!(
        rows = out.records.len(),
        skipped = out.skipped,
        "extracted population records"
    );
    Ok(out)
}

/// Convenience wrapper around [`extract`] that drops the skip count.
pub fn extract_records(text: &str) -> Result<Vec<PopulationRecord>, IngestError> {
    extract(text).map(|e| e.records)
}

fn parse_row(line: &str, idx: ColumnIndex) -> Option<PopulationRecord> {
    if line.trim().is_empty() {
        return None;
    }
    let fields = parse_line(line);
    let year = parse_year(fields.get(idx.year)?)?;
    let value = parse_value(fields.get(idx.value)?)?;
    let name = fields.get(idx.name).map(|s| s.trim()).unwrap_or_default();
    let code = fields.get(idx.code).map(|s| s.trim()).unwrap_or_default();
    Some(PopulationRecord::new(name, code, year, value))
}

fn parse_value(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Accepts `2020` and `2020.0`; anything fractional or out of range is rejected.
fn parse_year(raw: &str) -> Option<i32> {
    let raw = raw.trim();
    if let Ok(year) = raw.parse::<i32>() {
        return Some(year);
    }
    let v = parse_value(raw)?;
    if v.fract() == 0.0 && v >= f64::from(i32::MIN) && v <= f64::from(i32::MAX) {
        Some(v as i32)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    const SAMPLE: &str = "Country Name,Country Code,Year,Value\n\
        Aruba,ABW,1960,54608\n\
        \"Korea, Rep.\",KOR,2020,51780000\n\
        India,IND,2020,1380004385\n";

    #[test]
    fn test_extract_sample() -> Result<()> {
        let records = extract_records(SAMPLE)?;
        assert_eq!(records.len(), 3);
        assert_eq!(records[1].country_name, "Korea, Rep.");
        assert_eq!(records[1].country_code, "KOR");
        assert_eq!(records[1].year, 2020);
        assert_eq!(records[1].value, 51_780_000.0);
        Ok(())
    }

    #[test]
    fn test_column_order_and_case_do_not_matter() -> Result<()> {
        let doc = "value,YEAR, Country Code ,country NAME\r\n42.5,1999,FRA,France\r\n";
        let records = extract_records(doc)?;
        assert_eq!(records, vec![PopulationRecord::new("France", "FRA", 1999, 42.5)]);
        Ok(())
    }

    #[test]
    fn test_carriage_return_only_line_endings() -> Result<()> {
        let doc = "Country Name,Country Code,Year,Value\rChad,TCD,2000,8\rMali,MLI,2000,11\r";
        assert_eq!(extract_records(doc)?.len(), 2);
        Ok(())
    }

    #[test]
    fn test_invalid_rows_are_skipped() -> Result<()> {
        let doc = "Country Name,Country Code,Year,Value\n\
            A,AAA,1960,1\n\
            B,BBB,n/a,2\n\
            C,CCC,1961,\n\
            D,DDD,1962,NaN\n\
            E,EEE,1963,inf\n\
            \x20\x20\n\
            F,FFF,1964.5,3\n\
            G,GGG\n\
            H,HHH,1965.0,4\n";
        let out = extract(doc)?;
        let codes: Vec<&str> = out.records.iter().map(|r| r.country_code.as_str()).collect();
        assert_eq!(codes, vec!["AAA", "HHH"]);
        assert_eq!(out.records[1].year, 1965);
        assert_eq!(out.skipped, 7);
        for r in &out.records {
            assert!(r.value.is_finite());
        }
        Ok(())
    }

    #[test]
    fn test_output_never_exceeds_data_lines() -> Result<()> {
        let out = extract(SAMPLE)?;
        let data_lines = SAMPLE.lines().filter(|l| !l.is_empty()).count() - 1;
        assert!(out.records.len() <= data_lines);
        assert_eq!(out.records.len() + out.skipped, data_lines);
        Ok(())
    }

    #[test]
    fn test_header_only_is_empty_not_error() -> Result<()> {
        let records = extract_records("Country Name,Country Code,Year,Value\n")?;
        assert!(records.is_empty());
        Ok(())
    }

    #[test]
    fn test_missing_columns_carries_headers() {
        let err = extract_records("Country Name,Code,Year,Value\nX,Y,1,2\n").unwrap_err();
        match err {
            IngestError::MissingColumns { missing, headers } => {
                assert_eq!(missing, vec!["country code"]);
                assert_eq!(headers, vec!["Country Name", "Code", "Year", "Value"]);
            }
        }
    }

    #[test]
    fn test_empty_document_reports_all_columns_missing() {
        let IngestError::MissingColumns { missing, headers } = extract_records("").unwrap_err();
        assert_eq!(missing.len(), 4);
        assert!(headers.is_empty());
    }

    #[test]
    fn test_byte_order_mark_on_first_header() -> Result<()> {
        let doc = "\u{feff}Country Name,Country Code,Year,Value\nPeru,PER,2001,26\n";
        assert_eq!(extract_records(doc)?.len(), 1);
        Ok(())
    }
}
