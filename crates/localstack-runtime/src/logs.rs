//! Captured container output.

/// Accumulated output of a container process.
///
/// Every fetch returns everything written so far, so a later snapshot is a
/// superset of an earlier one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogOutput {
    /// Standard output text.
    pub stdout: String,
    /// Standard error text.
    pub stderr: String,
}

impl LogOutput {
    /// Creates a snapshot from raw process output, replacing invalid UTF-8.
    #[must_use]
    pub fn from_bytes(stdout: &[u8], stderr: &[u8]) -> Self {
        Self {
            stdout: String::from_utf8_lossy(stdout).into_owned(),
            stderr: String::from_utf8_lossy(stderr).into_owned(),
        }
    }

    /// Returns whether neither stream produced any output.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stdout.is_empty() && self.stderr.is_empty()
    }

    /// Returns the last `lines` lines of standard output.
    #[must_use]
    pub fn tail(&self, lines: usize) -> Vec<&str> {
        let all: Vec<&str> = self.stdout.lines().collect();
        let skip = all.len().saturating_sub(lines);
        all[skip..].to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_bytes_replaces_invalid_utf8() {
        let logs = LogOutput::from_bytes(b"ok\xff\n", b"");
        assert!(logs.stdout.starts_with("ok"));
        assert!(logs.stdout.ends_with('\n'));
    }

    #[test]
    fn empty_snapshot_reports_empty() {
        assert!(LogOutput::default().is_empty());
        assert!(!LogOutput::from_bytes(b"", b"warn").is_empty());
    }

    #[test]
    fn tail_returns_last_lines() {
        let logs = LogOutput::from_bytes(b"one\ntwo\nthree\n", b"");
        assert_eq!(logs.tail(2), vec!["two", "three"]);
        assert_eq!(logs.tail(10), vec!["one", "two", "three"]);
        assert!(logs.tail(0).is_empty());
    }
}
