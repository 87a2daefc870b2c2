//! Record parsing for framed telemetry lines.
//!
//! Wire format, one record per line:
//!
//! ```text
//! <leadI:float>,<leadII:float>[,<bpm:int>[,<irregularity:float>]]
//! ```
//!
//! The firmware also prints calibration progress as free text on the same
//! stream. Parsing never fails: anything that is neither a status line nor a
//! usable data line is dropped.

use serde::{Deserialize, Serialize};

/// Keywords that mark a line as calibration status text.
pub const STATUS_KEYWORDS: [&str; 4] = ["Calibration", "Starting", "Baseline", "Gain"];

/// Keyword in a status line that ends calibration early.
pub const COMPLETION_KEYWORD: &str = "Complete";

/// One parsed data record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub lead_i: f64,
    pub lead_ii: f64,
    /// Device heart-rate estimate, present on beat records
    pub device_bpm: Option<u32>,
    /// Device irregularity measure, present on some beat records
    pub device_irregularity: Option<f64>,
}

/// A calibration status line from the firmware.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    pub text: String,
    pub completes_calibration: bool,
}

/// Classification of one line.
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    Data(Reading),
    Status(StatusLine),
}

/// Classify and parse a single line.
///
/// Returns `None` for malformed lines.
pub fn parse_line(line: &str) -> Option<Record> {
    if STATUS_KEYWORDS.iter().any(|k| line.contains(k)) {
        return Some(Record::Status(StatusLine {
            text: line.trim().to_string(),
            completes_calibration: line.contains(COMPLETION_KEYWORD),
        }));
    }

    parse_reading(line).map(Record::Data)
}

/// Parse a data line into a `Reading`.
pub fn parse_reading(line: &str) -> Option<Reading> {
    let mut fields = line.split(',').map(str::trim);

    let lead_i = parse_finite(fields.next()?)?;
    let lead_ii = parse_finite(fields.next()?)?;

    // Optional fields degrade to absent rather than rejecting the sample.
    // BPM is an integer on the wire; "72.0" counts as unparsable.
    let device_bpm = fields
        .next()
        .and_then(|f| f.parse::<u32>().ok())
        .filter(|&bpm| bpm > 0);
    let device_irregularity = fields
        .next()
        .and_then(parse_finite)
        .filter(|&v| v >= 0.0);

    Some(Reading {
        lead_i,
        lead_ii,
        device_bpm,
        device_irregularity,
    })
}

fn parse_finite(field: &str) -> Option<f64> {
    field.parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(line: &str) -> Reading {
        match parse_line(line) {
            Some(Record::Data(r)) => r,
            other => panic!("expected data for {line:?}, got {other:?}"),
        }
    }

    #[test]
    fn test_full_record() {
        let r = reading("0.1,0.2,72,0.05");
        assert_eq!(r.lead_i, 0.1);
        assert_eq!(r.lead_ii, 0.2);
        assert_eq!(r.device_bpm, Some(72));
        assert_eq!(r.device_irregularity, Some(0.05));
    }

    #[test]
    fn test_leads_only() {
        let r = reading("-1.25,3.5");
        assert_eq!(r.lead_i, -1.25);
        assert_eq!(r.lead_ii, 3.5);
        assert_eq!(r.device_bpm, None);
        assert_eq!(r.device_irregularity, None);
    }

    #[test]
    fn test_carriage_return_line_endings() {
        let r = reading("0.5,0.6,80\r");
        assert_eq!(r.device_bpm, Some(80));
    }

    #[test]
    fn test_invalid_optional_fields_become_absent() {
        assert_eq!(reading("0.1,0.2,0").device_bpm, None);
        assert_eq!(reading("0.1,0.2,-60").device_bpm, None);
        assert_eq!(reading("0.1,0.2,abc,0.3").device_bpm, None);
        assert_eq!(reading("0.1,0.2,abc,0.3").device_irregularity, Some(0.3));
        assert_eq!(reading("0.1,0.2,70,-0.1").device_irregularity, None);
        assert_eq!(reading("0.1,0.2,70,nan").device_irregularity, None);
        assert_eq!(reading("0.1,0.2,,").device_bpm, None);
    }

    #[test]
    fn test_fractional_bpm_is_absent() {
        let r = reading("0.1,0.2,72.0,0.05");
        assert_eq!(r.device_bpm, None);
        assert_eq!(r.device_irregularity, Some(0.05));
        assert_eq!(r.lead_ii, 0.2);
    }

    #[test]
    fn test_malformed_lines_are_dropped() {
        assert_eq!(parse_line(""), None);
        assert_eq!(parse_line("0.1"), None);
        assert_eq!(parse_line("abc,0.2"), None);
        assert_eq!(parse_line("0.1,xyz,70"), None);
        assert_eq!(parse_line("inf,0.2"), None);
    }

    #[test]
    fn test_status_lines() {
        match parse_line("Calibration Starting...") {
            Some(Record::Status(s)) => {
                assert_eq!(s.text, "Calibration Starting...");
                assert!(!s.completes_calibration);
            }
            other => panic!("unexpected {other:?}"),
        }

        match parse_line("Calibration Complete") {
            Some(Record::Status(s)) => assert!(s.completes_calibration),
            other => panic!("unexpected {other:?}"),
        }

        // Status keywords win even when the line also has commas
        assert!(matches!(
            parse_line("Baseline,0.12"),
            Some(Record::Status(_))
        ));
    }

    #[test]
    fn test_status_keywords_are_case_sensitive() {
        assert_eq!(parse_line("calibration starting"), None);
        assert_eq!(parse_line("Complete"), None);
    }
}
