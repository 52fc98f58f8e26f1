//! Shared helpers for the html crate's integration tests.

use std::fmt::Write;

pub mod driver_cases;

const CONTEXT: usize = 2;

/// Human-readable diff of two snapshots: the first differing line with a
/// little context, plus how many lines differ in total.
pub fn diff_lines(expected: &[String], actual: &[String]) -> String {
    let len = expected.len().max(actual.len());
    let line = |lines: &[String], idx: usize| -> String {
        lines
            .get(idx)
            .cloned()
            .unwrap_or_else(|| "<missing>".to_string())
    };
    let differing: Vec<usize> = (0..len)
        .filter(|&idx| expected.get(idx) != actual.get(idx))
        .collect();

    let mut out = String::new();
    if let Some(&first) = differing.first() {
        let start = first.saturating_sub(CONTEXT);
        let end = (first + CONTEXT + 1).min(len);
        let _ = writeln!(
            out,
            "first mismatch at line {} ({} differing lines):",
            first + 1,
            differing.len()
        );
        for idx in start..end {
            let marker = if idx == first { '>' } else { ' ' };
            let _ = writeln!(out, "{marker} {:>4}  expected: {}", idx + 1, line(expected, idx));
            let _ = writeln!(out, "{marker} {:>4}    actual: {}", idx + 1, line(actual, idx));
        }
    }
    let _ = writeln!(
        out,
        "expected {} lines, actual {} lines",
        expected.len(),
        actual.len()
    );
    out
}

#[cfg(test)]
mod tests {
    use super::diff_lines;

    fn lines(text: &str) -> Vec<String> {
        text.lines().map(str::to_string).collect()
    }

    #[test]
    fn diff_points_at_first_mismatch() {
        let diff = diff_lines(&lines("a\nb\nc"), &lines("a\nx\nc\nd"));
        assert!(diff.contains("first mismatch at line 2 (2 differing lines)"), "{diff}");
        assert!(diff.contains(">    2    actual: x"), "{diff}");
        assert!(diff.contains("expected 3 lines, actual 4 lines"), "{diff}");
    }

    #[test]
    fn equal_inputs_only_report_lengths() {
        let diff = diff_lines(&lines("a"), &lines("a"));
        assert_eq!(diff, "expected 1 lines, actual 1 lines\n");
    }
}
