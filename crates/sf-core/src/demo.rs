use crate::record::{DisplayRecord, Severity};

const SCRIPT: [(&str, &str, Severity); 9] = [
    (
        "SCOUT-01",
        "Scanning GitHub trending repositories for high-velocity Python projects...",
        Severity::Info,
    ),
    (
        "ANALYST-ALPHA",
        "Detected sentiment shift in DeFi sector. Calculating correlation coefficients.",
        Severity::Info,
    ),
    (
        "SYSTEM",
        "New asset identified: 'HyperLiquid' protocol. Initiating due diligence protocol.",
        Severity::Success,
    ),
    (
        "OVERSIGHT",
        "Goal received. Decoupling task for Stillfrost Intelligence.",
        Severity::Info,
    ),
    (
        "BUILDER-V2",
        "Compiling daily performance report. 47% efficiency gain noted in module X.",
        Severity::Info,
    ),
    (
        "RISK-GUARD",
        "Portfolio exposure within nominal limits. Volatility index: LOW.",
        Severity::Info,
    ),
    (
        "OVERSIGHT",
        "Stillfrost Reach output REJECTED. Reasoning: High-Friction signal insufficient.",
        Severity::Warning,
    ),
    (
        "SCOUT-01",
        "Indexing 15,000 commits from target repository...",
        Severity::Info,
    ),
    (
        "ANALYST-ALPHA",
        "Cross-referencing founder background with YC alumni database.",
        Severity::Info,
    ),
];

/// Endless round-robin over the canned demo records.
///
/// The cursor only moves when a record is taken, so suspending the generator
/// and resuming it later continues the cycle where it stopped.
#[derive(Debug, Clone, Default)]
pub struct DemoGenerator {
    cursor: usize,
}

impl DemoGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn next_record(&mut self) -> DisplayRecord {
        let (source, text, severity) = SCRIPT[self.cursor];
        self.cursor = (self.cursor + 1) % SCRIPT.len();
        DisplayRecord::new(source, text, severity)
    }
}

impl Iterator for DemoGenerator {
    type Item = DisplayRecord;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.next_record())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycles_in_order() {
        let mut demo = DemoGenerator::new();
        let first: Vec<_> = demo.by_ref().take(9).collect();
        let second: Vec<_> = demo.by_ref().take(9).collect();
        assert_eq!(first, second);
        assert_eq!(first[0].source, "SCOUT-01");
        assert_eq!(first[8].source, "ANALYST-ALPHA");
        assert_eq!(demo.cursor(), 0);
    }

    #[test]
    fn test_cursor_is_retained() {
        let mut demo = DemoGenerator::new();
        demo.next_record();
        demo.next_record();
        assert_eq!(demo.cursor(), 2);
        assert_eq!(demo.next_record().source, "SYSTEM");
    }

    #[test]
    fn test_script_severities() {
        let records: Vec<_> = DemoGenerator::new().take(9).collect();
        assert_eq!(records[2].severity, Severity::Success);
        assert_eq!(records[6].severity, Severity::Warning);
        assert_eq!(
            records.iter().filter(|record| record.severity == Severity::Info).count(),
            7
        );
    }
}
