
const EXPLANATIONS: [&str; 4] = [
    "Minor accident. Low impact.",
    "Moderate accident. Possible injuries.",
    "Severe accident. High injury risk.",
    "Very severe accident. Critical.",
];

const COLORS: [&str; 4] = ["#bfecd0", "#fde68a", "#fdba74", "#fca5a5"];

const UNKNOWN_EXPLANATION: &str = "Unknown severity";
const UNKNOWN_COLOR: &str = "#cbd5e1";

fn slot(severity: i64) -> Option<usize> {
    match severity {
        1..=4 => Some((severity - 1) as usize),
        _ => None,
    }
}

pub fn severity_explanation(severity: i64) -> &'static str {
    slot(severity).map(|i| EXPLANATIONS[i]).unwrap_or(UNKNOWN_EXPLANATION)
}

/// Background color (hex) for the result card.
pub fn severity_color(severity: i64) -> &'static str {
    slot(severity).map(|i| COLORS[i]).unwrap_or(UNKNOWN_COLOR)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeverityReport {
    pub severity: i64,
    pub explanation: &'static str,
    pub color: &'static str,
}

impl SeverityReport {
    pub fn new(severity: i64) -> Self {
        Self {
            severity,
            explanation: severity_explanation(severity),
            color: severity_color(severity),
        }
    }

    /// RGB triple parsed from the hex color, for terminal output.
    pub fn rgb(&self) -> (u8, u8, u8) {
        let hex = self.color.trim_start_matches('#');
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).unwrap_or(0);
        (channel(0), channel(2), channel(4))
    }
}

impl std::fmt::Display for SeverityReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Severity: {}\n{}", self.severity, self.explanation)
    }
}
