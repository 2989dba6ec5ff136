//! Fixed analysis results displayed next to a finished capture.
//!
//! Nothing here is measured: the values are display constants, like the
//! spectrogram they accompany.

use std::fmt;

const SUMMARY: &str = "The analysis indicates elevated jitter and shimmer values, suggesting \
vocal instability and potential tremor. The Harmonic-to-Noise ratio is slightly below healthy \
thresholds, which may correlate with breathiness in phonation. Spectrogram analysis shows minor \
spectral noise and formant instability. These simulated findings are consistent with markers \
sometimes seen in early-stage neurological voice disorders.";

/// Voice-quality metrics plus a qualitative summary.
#[derive(Debug, Clone, PartialEq)]
pub struct MockAnalysis {
    /// Cycle-to-cycle frequency perturbation, percent.
    pub jitter_local_pct: f32,
    /// Cycle-to-cycle amplitude perturbation, percent.
    pub shimmer_local_pct: f32,
    /// Harmonic-to-noise ratio, dB.
    pub hnr_db: f32,
    pub summary: &'static str,
}

impl MockAnalysis {
    pub fn fixed() -> Self {
        Self {
            jitter_local_pct: 1.15,
            shimmer_local_pct: 4.82,
            hnr_db: 15.3,
            summary: SUMMARY,
        }
    }

    /// `(label, formatted value)` rows in display order.
    pub fn metrics(&self) -> [(&'static str, String); 3] {
        [
            ("Jitter (Local)", format!("{:.2}%", self.jitter_local_pct)),
            ("Shimmer (Local)", format!("{:.2}%", self.shimmer_local_pct)),
            ("Harmonic-to-Noise", format!("{:.1} dB", self.hnr_db)),
        ]
    }
}

impl fmt::Display for MockAnalysis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (label, value) in self.metrics() {
            writeln!(f, "{label:<18} {value}")?;
        }
        write!(f, "\n{}", self.summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metrics_are_formatted_for_display() {
        let rows = MockAnalysis::fixed().metrics();
        assert_eq!(rows[0], ("Jitter (Local)", "1.15%".to_string()));
        assert_eq!(rows[1], ("Shimmer (Local)", "4.82%".to_string()));
        assert_eq!(rows[2], ("Harmonic-to-Noise", "15.3 dB".to_string()));
    }

    #[test]
    fn display_ends_with_summary() {
        let text = MockAnalysis::fixed().to_string();
        assert!(text.starts_with("Jitter (Local)"));
        assert!(text.ends_with("early-stage neurological voice disorders."));
        assert!(!text.contains("  The"));
    }
}
