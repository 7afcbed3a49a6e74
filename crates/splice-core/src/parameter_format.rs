//! Parameter value formatting and parsing.
//!
//! [`Formatter`] converts plain parameter values to display text and back.
//! Formatting writes into any [`fmt::Write`] sink, so the host-facing
//! `normalized_to_string` path can format into a fixed stack buffer without
//! allocating.
//!
//! # Example
//!
//! ```ignore
//! use splice_core::parameter_format::Formatter;
//!
//! let db = Formatter::Decibel { precision: 1 };
//! assert_eq!(db.format(1.0), "+0.0 dB");
//! assert_eq!(db.format(0.5), "-6.0 dB");
//!
//! assert_eq!(Formatter::Frequency.format(1500.0), "1.50 kHz");
//! ```

use std::fmt;

/// Parameter value formatter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Formatter {
    /// Generic float with configurable precision (e.g., "1.23").
    Float {
        /// Number of decimal places.
        precision: usize,
    },

    /// Decibel formatter for gain/level parameters.
    ///
    /// Input is linear amplitude (0.0 = silence, 1.0 = unity).
    /// Display: "-12.0 dB", "-inf dB"
    Decibel {
        /// Number of decimal places.
        precision: usize,
    },

    /// Decibel formatter where the plain value is already in dB.
    ///
    /// Display: "+12.0 dB", "-inf dB" below `min_db`.
    DecibelDirect {
        /// Number of decimal places.
        precision: usize,
        /// Values below this show "-inf dB".
        min_db: f64,
    },

    /// Frequency formatter with automatic Hz/kHz scaling.
    ///
    /// Display: "440 Hz", "1.50 kHz"
    Frequency,

    /// Display: "10.0 ms"
    Milliseconds { precision: usize },

    /// Display: "1.50 s"
    Seconds { precision: usize },

    /// Input is 0.0-1.0, display is 0%-100%.
    Percent { precision: usize },

    /// Stereo position, input -1.0 (left) to +1.0 (right).
    ///
    /// Display: "L50", "C", "R50"
    Pan,

    /// Display: "+12 st", "-7 st", "0 st"
    Semitones,

    /// Display: "On", "Off"
    Boolean,

    /// Whole numbers, display: "3"
    Integer,

    /// One label per integer value, starting at 0.
    ///
    /// Out-of-range indices are clamped to the first/last label.
    Labels(&'static [&'static str]),
}

impl Formatter {
    /// Write a plain value as display text into `out`.
    ///
    /// The interpretation of `value` depends on the variant:
    /// - `Decibel`: linear amplitude (1.0 = 0 dB)
    /// - `Frequency`: Hz
    /// - `Percent`: 0.0-1.0
    /// - `Pan`: -1.0 to +1.0
    /// - `Boolean`: >0.5 = On
    /// - `Labels`/`Integer`/`Semitones`: rounded to the nearest integer
    pub fn write(&self, value: f64, out: &mut dyn fmt::Write) -> fmt::Result {
        match self {
            Formatter::Float { precision } => write!(out, "{:.prec$}", value, prec = *precision),

            Formatter::Decibel { precision } => {
                if value < 1e-10 {
                    out.write_str("-inf dB")
                } else {
                    let db = 20.0 * value.log10();
                    if db >= 0.0 {
                        write!(out, "+{:.prec$} dB", db, prec = *precision)
                    } else {
                        write!(out, "{:.prec$} dB", db, prec = *precision)
                    }
                }
            }

            Formatter::DecibelDirect { precision, min_db } => {
                if value < *min_db {
                    out.write_str("-inf dB")
                } else if value >= 0.0 {
                    write!(out, "+{:.prec$} dB", value, prec = *precision)
                } else {
                    write!(out, "{:.prec$} dB", value, prec = *precision)
                }
            }

            Formatter::Frequency => {
                if value >= 1000.0 {
                    write!(out, "{:.2} kHz", value / 1000.0)
                } else if value >= 100.0 {
                    write!(out, "{:.0} Hz", value)
                } else {
                    write!(out, "{:.1} Hz", value)
                }
            }

            Formatter::Milliseconds { precision } => {
                write!(out, "{:.prec$} ms", value, prec = *precision)
            }

            Formatter::Seconds { precision } => {
                write!(out, "{:.prec$} s", value, prec = *precision)
            }

            Formatter::Percent { precision } => {
                write!(out, "{:.prec$}%", value * 100.0, prec = *precision)
            }

            Formatter::Pan => {
                if value.abs() < 0.005 {
                    out.write_str("C")
                } else if value < 0.0 {
                    write!(out, "L{:.0}", value.abs() * 100.0)
                } else {
                    write!(out, "R{:.0}", value * 100.0)
                }
            }

            Formatter::Semitones => {
                let st = value.round() as i64;
                if st > 0 {
                    write!(out, "+{} st", st)
                } else {
                    write!(out, "{} st", st)
                }
            }

            Formatter::Boolean => out.write_str(if value > 0.5 { "On" } else { "Off" }),

            Formatter::Integer => write!(out, "{}", value.round() as i64),

            Formatter::Labels(labels) => match labels.len() {
                0 => Ok(()),
                len => {
                    let index = (value.round().max(0.0) as usize).min(len - 1);
                    out.write_str(labels[index])
                }
            },
        }
    }

    /// Format a plain value into an owned string.
    ///
    /// Convenience for control paths; the render-adjacent paths use
    /// [`Formatter::write`] with a stack buffer.
    pub fn format(&self, value: f64) -> String {
        let mut text = String::new();
        // Writing into a String cannot fail.
        let _ = self.write(value, &mut text);
        text
    }

    /// Parse display text back to a plain value.
    ///
    /// Returns `None` if the text cannot be parsed. Units are optional.
    pub fn parse(&self, s: &str) -> Option<f64> {
        let s = s.trim();

        match self {
            Formatter::Float { .. } => s.parse().ok(),

            Formatter::Decibel { .. } => {
                let trimmed = s.trim_end_matches("dB").trim();
                if is_negative_infinity(trimmed) {
                    return Some(0.0);
                }
                let db: f64 = trimmed.parse().ok()?;
                Some(10.0_f64.powf(db / 20.0))
            }

            Formatter::DecibelDirect { min_db, .. } => {
                let trimmed = s.trim_end_matches("dB").trim();
                if is_negative_infinity(trimmed) {
                    return Some(*min_db);
                }
                trimmed.parse().ok()
            }

            Formatter::Frequency => {
                let lower = s.to_ascii_lowercase();
                if let Some(khz) = lower.strip_suffix("khz") {
                    return khz.trim().parse::<f64>().ok().map(|v| v * 1000.0);
                }
                lower.trim_end_matches("hz").trim().parse().ok()
            }

            Formatter::Milliseconds { .. } => s.trim_end_matches("ms").trim().parse().ok(),

            Formatter::Seconds { .. } => s.trim_end_matches('s').trim().parse().ok(),

            Formatter::Percent { .. } => s
                .trim_end_matches('%')
                .trim()
                .parse::<f64>()
                .ok()
                .map(|v| v / 100.0),

            Formatter::Pan => {
                let upper = s.to_ascii_uppercase();
                if upper == "C" || upper == "CENTER" {
                    return Some(0.0);
                }
                if let Some(left) = upper.strip_prefix('L') {
                    return left.trim().parse::<f64>().ok().map(|v| -v / 100.0);
                }
                if let Some(right) = upper.strip_prefix('R') {
                    return right.trim().parse::<f64>().ok().map(|v| v / 100.0);
                }
                let v: f64 = s.parse().ok()?;
                // bare numbers are either -1..1 or -100..100
                Some(if v.abs() > 1.0 { v / 100.0 } else { v })
            }

            Formatter::Semitones => s.trim_end_matches("st").trim().parse().ok(),

            Formatter::Boolean => match s.to_ascii_lowercase().as_str() {
                "on" | "true" | "yes" | "1" | "enabled" => Some(1.0),
                "off" | "false" | "no" | "0" | "disabled" => Some(0.0),
                _ => None,
            },

            Formatter::Integer => s.parse::<i64>().ok().map(|v| v as f64),

            Formatter::Labels(labels) => labels
                .iter()
                .position(|label| label.eq_ignore_ascii_case(s))
                .map(|index| index as f64),
        }
    }

    /// Unit label shown next to the value by hosts that display units separately.
    pub fn units(&self) -> &'static str {
        match self {
            Formatter::Decibel { .. } | Formatter::DecibelDirect { .. } => "dB",
            Formatter::Frequency => "Hz",
            Formatter::Milliseconds { .. } => "ms",
            Formatter::Seconds { .. } => "s",
            Formatter::Percent { .. } => "%",
            Formatter::Semitones => "st",
            _ => "",
        }
    }
}

fn is_negative_infinity(s: &str) -> bool {
    s.eq_ignore_ascii_case("-inf") || s == "-∞" || s.eq_ignore_ascii_case("-infinity")
}

impl Default for Formatter {
    fn default() -> Self {
        Formatter::Float { precision: 2 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use splice_utils::StackString;

    #[test]
    fn test_decibel() {
        let f = Formatter::Decibel { precision: 1 };
        assert_eq!(f.format(1.0), "+0.0 dB");
        assert_eq!(f.format(0.5), "-6.0 dB");
        assert_eq!(f.format(0.0), "-inf dB");
        assert!((f.parse("-6.0 dB").unwrap() - 0.501).abs() < 0.001);
        assert_eq!(f.parse("-inf"), Some(0.0));
    }

    #[test]
    fn test_frequency_scaling() {
        let f = Formatter::Frequency;
        assert_eq!(f.format(440.0), "440 Hz");
        assert_eq!(f.format(1500.0), "1.50 kHz");
        assert_eq!(f.format(55.5), "55.5 Hz");
        assert_eq!(f.parse("1.5 kHz"), Some(1500.0));
        assert_eq!(f.parse("440Hz"), Some(440.0));
    }

    #[test]
    fn test_percent_and_pan() {
        assert_eq!(Formatter::Percent { precision: 0 }.format(0.75), "75%");
        assert_eq!(Formatter::Pan.format(0.0), "C");
        assert_eq!(Formatter::Pan.format(-0.5), "L50");
        assert_eq!(Formatter::Pan.parse("R25"), Some(0.25));
    }

    #[test]
    fn test_labels() {
        const MODES: &[&str] = &["Low", "Band", "High"];
        let f = Formatter::Labels(MODES);
        assert_eq!(f.format(1.0), "Band");
        assert_eq!(f.format(7.0), "High");
        assert_eq!(f.format(-1.0), "Low");
        assert_eq!(f.parse("high"), Some(2.0));
        assert_eq!(f.parse("Notch"), None);
    }

    #[test]
    fn test_boolean_and_integer() {
        assert_eq!(Formatter::Boolean.format(1.0), "On");
        assert_eq!(Formatter::Boolean.parse("off"), Some(0.0));
        assert_eq!(Formatter::Integer.format(2.6), "3");
        assert_eq!(Formatter::Semitones.format(-7.0), "-7 st");
    }

    #[test]
    fn test_write_into_stack_buffer() {
        let mut text = StackString::<8>::new();
        Formatter::Milliseconds { precision: 3 }
            .write(12345.678, &mut text)
            .unwrap();
        // "12345.678 ms" truncated to capacity
        assert_eq!(text.as_str(), "12345.67");
    }

    #[test]
    fn test_units() {
        assert_eq!(Formatter::Decibel { precision: 1 }.units(), "dB");
        assert_eq!(Formatter::Labels(&[]).units(), "");
    }
}
