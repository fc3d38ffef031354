//! Utility functions and helpers

pub mod jsonl;

/// Format a nanosecond duration with a unit suited to its size
/// (e.g. `"850 ns"`, `"12.500 us"`, `"3.250 ms"`, `"1.200 s"`)
pub fn format_duration_ns(ns: u64) -> String {
    if ns < 1_000 {
        format!("{} ns", ns)
    } else if ns < 1_000_000 {
        format!("{:.3} us", ns as f64 / 1_000.0)
    } else if ns < 1_000_000_000 {
        format!("{:.3} ms", ns as f64 / 1_000_000.0)
    } else {
        format!("{:.3} s", ns as f64 / 1_000_000_000.0)
    }
}

/// Truncate `s` to at most `width` characters, marking the cut with `~`.
/// A width of 0 means unbounded.
pub fn truncate_chars(s: &str, width: usize) -> String {
    if width == 0 || s.chars().count() <= width {
        return s.to_string();
    }
    let mut out: String = s.chars().take(width.saturating_sub(1)).collect();
    out.push('~');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration_ns() {
        assert_eq!(format_duration_ns(850), "850 ns");
        assert_eq!(format_duration_ns(12_500), "12.500 us");
        assert_eq!(format_duration_ns(3_250_000), "3.250 ms");
        assert_eq!(format_duration_ns(1_200_000_000), "1.200 s");
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("volta_sgemm", 0), "volta_sgemm");
        assert_eq!(truncate_chars("volta_sgemm", 20), "volta_sgemm");
        assert_eq!(truncate_chars("volta_sgemm", 6), "volta~");
        assert_eq!(truncate_chars("abc", 1), "~");
    }
}
