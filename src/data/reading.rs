//! Parsed sensor records and the metrics they carry.
//!
//! The sensor bridge emits one record per line, four comma-separated fields
//! in fixed order. Firmware debug output, partial records, and garbled lines
//! are all normal on this hardware, so parsing is tolerant: a field may be
//! empty (the sensor had no sample this cycle) and a line that cannot be
//! parsed is dropped without affecting the stream.

use std::fmt;

/// One of the four measurements tracked by the monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    Pm25,
    Co2,
    Temperature,
    Humidity,
}

impl Metric {
    /// Number of tracked metrics.
    pub const COUNT: usize = 4;

    /// All metrics in wire-field order.
    pub const ALL: [Metric; Metric::COUNT] = [
        Metric::Pm25,
        Metric::Co2,
        Metric::Temperature,
        Metric::Humidity,
    ];

    /// Stable index matching the wire-field order.
    pub fn index(self) -> usize {
        match self {
            Metric::Pm25 => 0,
            Metric::Co2 => 1,
            Metric::Temperature => 2,
            Metric::Humidity => 3,
        }
    }

    /// Display label.
    pub fn label(self) -> &'static str {
        match self {
            Metric::Pm25 => "PM 2.5",
            Metric::Co2 => "CO₂",
            Metric::Temperature => "Temperature",
            Metric::Humidity => "Humidity",
        }
    }

    /// Unit of measurement.
    pub fn unit(self) -> &'static str {
        match self {
            Metric::Pm25 => "µg/m³",
            Metric::Co2 => "ppm",
            Metric::Temperature => "°C",
            Metric::Humidity => "%",
        }
    }

    /// Machine-readable key used in exported JSON.
    pub fn key(self) -> &'static str {
        match self {
            Metric::Pm25 => "pm25",
            Metric::Co2 => "co2",
            Metric::Temperature => "temperature",
            Metric::Humidity => "humidity",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.label(), self.unit())
    }
}

/// One parsed record from a single input line.
///
/// Each field is present only if its source text was non-empty and parsed
/// as a valid number. An absent field is not an error and not zero; it
/// simply contributes nothing to its window.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Reading {
    pub pm25: Option<f64>,
    pub co2: Option<f64>,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
}

impl Reading {
    /// Value for one metric, if present.
    pub fn get(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::Pm25 => self.pm25,
            Metric::Co2 => self.co2,
            Metric::Temperature => self.temperature,
            Metric::Humidity => self.humidity,
        }
    }

    /// Iterate over the present fields in wire order.
    pub fn present(&self) -> impl Iterator<Item = (Metric, f64)> + '_ {
        Metric::ALL
            .into_iter()
            .filter_map(|m| self.get(m).map(|v| (m, v)))
    }

    /// Number of present fields.
    pub fn present_count(&self) -> usize {
        self.present().count()
    }
}

/// Outcome of parsing one framed line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParseOutcome {
    /// A record with at least one present field.
    Reading(Reading),
    /// Structurally valid, but every field was empty. Legal input that
    /// contributes nothing.
    Blank,
    /// Wrong field count, or a non-empty field that is not a number.
    /// The whole line is dropped with no side effect.
    Skip,
}

/// Parse one trimmed, non-empty, non-comment line.
///
/// The line must split on `,` into exactly four fields. An empty field is
/// absent; a non-empty field that fails numeric parse rejects the entire
/// line. Partial application happens only at the field-presence level,
/// never at the parse-failure level.
pub fn parse_line(line: &str) -> ParseOutcome {
    let mut values = [None; Metric::COUNT];
    let mut count = 0;

    for (i, field) in line.split(',').enumerate() {
        if i >= Metric::COUNT {
            return ParseOutcome::Skip;
        }
        count = i + 1;

        // Absence is decided on the raw field text; the device occasionally
        // pads populated fields with spaces, which the numeric parse accepts
        // after trimming, but a whitespace-only field is not a number.
        if field.is_empty() {
            continue;
        }
        match field.trim().parse::<f64>() {
            Ok(value) => values[i] = Some(value),
            Err(_) => return ParseOutcome::Skip,
        }
    }

    if count != Metric::COUNT {
        return ParseOutcome::Skip;
    }

    let reading = Reading {
        pm25: values[0],
        co2: values[1],
        temperature: values[2],
        humidity: values[3],
    };

    if reading.present_count() == 0 {
        ParseOutcome::Blank
    } else {
        ParseOutcome::Reading(reading)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(line: &str) -> Reading {
        match parse_line(line) {
            ParseOutcome::Reading(r) => r,
            other => panic!("expected a reading for {line:?}, got {other:?}"),
        }
    }

    #[test]
    fn test_full_record() {
        let r = reading("12.3,410,21.5,45.0");
        assert_eq!(r.pm25, Some(12.3));
        assert_eq!(r.co2, Some(410.0));
        assert_eq!(r.temperature, Some(21.5));
        assert_eq!(r.humidity, Some(45.0));
    }

    #[test]
    fn test_partial_field_acceptance() {
        let r = reading(",415,,");
        assert_eq!(r.pm25, None);
        assert_eq!(r.co2, Some(415.0));
        assert_eq!(r.temperature, None);
        assert_eq!(r.humidity, None);
        assert_eq!(r.present_count(), 1);
    }

    #[test]
    fn test_wrong_field_count_rejected() {
        assert_eq!(parse_line("12.5,415,22.1"), ParseOutcome::Skip);
        assert_eq!(parse_line("1,2,3,4,5"), ParseOutcome::Skip);
        assert_eq!(parse_line("12.5"), ParseOutcome::Skip);
    }

    #[test]
    fn test_unparseable_field_rejects_whole_line() {
        assert_eq!(parse_line("a,b,c,d"), ParseOutcome::Skip);
        // One bad field poisons the line even when the rest are valid.
        assert_eq!(parse_line("12.3,x,21.5,45.0"), ParseOutcome::Skip);
    }

    #[test]
    fn test_all_empty_is_blank_not_skip() {
        assert_eq!(parse_line(",,,"), ParseOutcome::Blank);
    }

    #[test]
    fn test_whitespace_padded_field_parses() {
        let r = reading("12.3, 410,21.5,45.0");
        assert_eq!(r.co2, Some(410.0));
    }

    #[test]
    fn test_whitespace_only_field_rejects_line() {
        // Non-empty text that is not a number, same as the device's own
        // float semantics.
        assert_eq!(parse_line(" ,410,21.5,45.0"), ParseOutcome::Skip);
    }

    #[test]
    fn test_non_finite_literals_stored_as_is() {
        let r = reading("inf,NaN,21.5,45.0");
        assert_eq!(r.pm25, Some(f64::INFINITY));
        assert!(r.co2.unwrap().is_nan());
    }

    #[test]
    fn test_negative_and_scientific_notation() {
        let r = reading("-1.5,4.1e2,21.5,45.0");
        assert_eq!(r.pm25, Some(-1.5));
        assert_eq!(r.co2, Some(410.0));
    }

    #[test]
    fn test_present_iterates_in_wire_order() {
        let r = reading("12.3,,22.0,");
        let present: Vec<_> = r.present().collect();
        assert_eq!(
            present,
            vec![(Metric::Pm25, 12.3), (Metric::Temperature, 22.0)]
        );
    }
}
