//! SPEC scan-file parsing.
//!
//! This module is responsible for turning a plain-text SPEC data file into
//! in-memory scans with named, equal-length data columns. It is the only
//! place in the crate that knows the file format; everything downstream
//! works with [`SpecFile`] and [`SpecScan`].
//!
//! Design goals:
//! - **Strict format** (malformed rows and labels are errors with line
//!   numbers and exit code 2, never silently dropped)
//! - **Parse once** (a `SpecFile` holds the parsed scans; lookups are
//!   in-memory)
//! - **Deterministic behavior** (no hidden normalization beyond what the
//!   format defines)
//! - **Separation of concerns**: no channel mapping or fitting logic here
//!
//! The supported subset of the format: `#F`/`#E`/`#D`/`#O`/`#C` file
//! headers, `#S <number> <command>` scan starts, per-scan `#D`/`#N`/`#L`
//! plus ignored metadata lines, whitespace-separated numeric data rows, and
//! `@`-prefixed MCA blocks (skipped, including their `\` continuations).

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use chrono::NaiveDateTime;

use crate::error::ScanError;

/// A parsed SPEC data file: header metadata plus scans in file order.
#[derive(Debug, Clone)]
pub struct SpecFile {
    name: String,
    date: Option<NaiveDateTime>,
    scans: Vec<SpecScan>,
}

/// One acquisition run (`#S` block) inside a SPEC file.
#[derive(Debug, Clone)]
pub struct SpecScan {
    number: u32,
    command: String,
    date: Option<NaiveDateTime>,
    labels: Vec<String>,
    rows: Vec<Vec<f64>>,
}

impl SpecFile {
    /// Read and parse a SPEC file from disk.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ScanError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| ScanError::io(path, e))?;
        Self::parse_str(path.display().to_string(), &text)
    }

    /// Parse SPEC-format text held in memory. `name` is used in error
    /// messages and lookups in place of a path.
    pub fn parse_str(name: impl Into<String>, text: &str) -> Result<Self, ScanError> {
        let name = name.into();
        let mut file_date = None;
        let mut scans: Vec<SpecScan> = Vec::new();
        let mut current: Option<PendingScan> = None;
        let mut in_mca_block = false;

        for (idx, raw) in text.lines().enumerate() {
            let line_no = idx + 1;
            let line = raw.trim_end();

            // MCA continuation lines end with a backslash; the block ends at
            // the first line without one.
            if in_mca_block {
                in_mca_block = line.ends_with('\\');
                continue;
            }

            if line.trim().is_empty() {
                continue;
            }

            if line.starts_with('@') {
                in_mca_block = line.ends_with('\\');
                continue;
            }

            if let Some(rest) = directive(line, "#S") {
                if let Some(done) = current.take() {
                    scans.push(done.finish());
                }
                current = Some(PendingScan::start(&name, line_no, rest)?);
                continue;
            }

            if let Some(rest) = directive(line, "#D") {
                let parsed = parse_spec_date(rest);
                match current.as_mut() {
                    Some(scan) if scan.date.is_none() => scan.date = parsed,
                    Some(_) => {}
                    None if file_date.is_none() => file_date = parsed,
                    None => {}
                }
                continue;
            }

            if let Some(rest) = directive(line, "#N") {
                if let Some(scan) = current.as_mut() {
                    let n: usize = rest.split_whitespace().next().unwrap_or("").parse().map_err(
                        |_| ScanError::format(&name, line_no, format!("invalid #N count '{rest}'")),
                    )?;
                    scan.declared_columns = Some(n);
                }
                continue;
            }

            if let Some(rest) = directive(line, "#L") {
                let Some(scan) = current.as_mut() else {
                    return Err(ScanError::format(&name, line_no, "#L labels outside a scan"));
                };
                scan.set_labels(&name, line_no, rest)?;
                continue;
            }

            if line.starts_with('#') {
                // #F, #E, #T, #M, #G, #P, #Q, #O, #U, #C and friends carry
                // metadata this crate does not interpret.
                continue;
            }

            let Some(scan) = current.as_mut() else {
                return Err(ScanError::format(&name, line_no, "data row outside any scan"));
            };
            scan.push_row(&name, line_no, line)?;
        }

        if let Some(done) = current.take() {
            scans.push(done.finish());
        }

        Ok(Self {
            name,
            date: file_date,
            scans,
        })
    }

    /// Display name of the file (its path, or the label given to
    /// [`SpecFile::parse_str`]).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// File-header `#D` timestamp, when present and parseable.
    pub fn date(&self) -> Option<NaiveDateTime> {
        self.date
    }

    pub fn scans(&self) -> &[SpecScan] {
        &self.scans
    }

    /// First scan whose `#S` number matches. Repeated scan numbers keep
    /// their first occurrence.
    pub fn scan_by_number(&self, number: u32) -> Result<&SpecScan, ScanError> {
        self.scans
            .iter()
            .find(|s| s.number == number)
            .ok_or_else(|| ScanError::ScanNotFound {
                scan: number,
                file: self.name.clone(),
            })
    }
}

impl SpecScan {
    pub fn number(&self) -> u32 {
        self.number
    }

    /// The command line that produced the scan (everything after the scan
    /// number on the `#S` line).
    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn date(&self) -> Option<NaiveDateTime> {
        self.date
    }

    /// Column labels from the `#L` line, in column order.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Number of acquisition points (data rows).
    pub fn points(&self) -> usize {
        self.rows.len()
    }

    /// Data matrix, points x channels. Every row has `labels().len()`
    /// values.
    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    /// One data column as an owned vector, or `None` for an out-of-range
    /// index.
    pub fn column(&self, index: usize) -> Option<Vec<f64>> {
        if index >= self.labels.len() {
            return None;
        }
        Some(self.rows.iter().map(|row| row[index]).collect())
    }
}

/// Scan under construction while its block is being read.
struct PendingScan {
    number: u32,
    command: String,
    date: Option<NaiveDateTime>,
    declared_columns: Option<usize>,
    labels: Option<Vec<String>>,
    rows: Vec<Vec<f64>>,
}

impl PendingScan {
    fn start(file: &str, line_no: usize, rest: &str) -> Result<Self, ScanError> {
        let mut parts = rest.splitn(2, char::is_whitespace);
        let number_tok = parts.next().unwrap_or("");
        let number: u32 = number_tok.parse().map_err(|_| {
            ScanError::format(
                file,
                line_no,
                format!("invalid scan number '{number_tok}' on #S line"),
            )
        })?;
        let command = parts.next().unwrap_or("").trim().to_string();
        Ok(Self {
            number,
            command,
            date: None,
            declared_columns: None,
            labels: None,
            rows: Vec::new(),
        })
    }

    fn set_labels(&mut self, file: &str, line_no: usize, rest: &str) -> Result<(), ScanError> {
        if self.labels.is_some() {
            return Err(ScanError::format(
                file,
                line_no,
                format!("second #L line in scan {}", self.number),
            ));
        }

        let labels = split_labels(rest, self.declared_columns);
        if labels.is_empty() {
            return Err(ScanError::format(file, line_no, "#L line carries no labels"));
        }

        let mut seen = HashSet::new();
        for label in &labels {
            if !seen.insert(label.as_str()) {
                return Err(ScanError::format(
                    file,
                    line_no,
                    format!("duplicate channel label '{label}' in scan {}", self.number),
                ));
            }
        }

        self.labels = Some(labels);
        Ok(())
    }

    fn push_row(&mut self, file: &str, line_no: usize, line: &str) -> Result<(), ScanError> {
        let Some(labels) = self.labels.as_ref() else {
            return Err(ScanError::format(
                file,
                line_no,
                format!("data row before #L labels in scan {}", self.number),
            ));
        };

        let mut row = Vec::with_capacity(labels.len());
        for tok in line.split_whitespace() {
            let value: f64 = tok.parse().map_err(|_| {
                ScanError::format(file, line_no, format!("invalid numeric value '{tok}'"))
            })?;
            row.push(value);
        }

        if row.len() != labels.len() {
            return Err(ScanError::format(
                file,
                line_no,
                format!(
                    "expected {} values per row in scan {}, found {}",
                    labels.len(),
                    self.number,
                    row.len()
                ),
            ));
        }

        self.rows.push(row);
        Ok(())
    }

    fn finish(self) -> SpecScan {
        SpecScan {
            number: self.number,
            command: self.command,
            date: self.date,
            labels: self.labels.unwrap_or_default(),
            rows: self.rows,
        }
    }
}

/// Match a `#X` control line and return its trimmed payload.
///
/// The tag must be followed by whitespace (or end the line) so that e.g.
/// `#S` never matches an unrelated control word.
fn directive<'a>(line: &'a str, tag: &str) -> Option<&'a str> {
    let rest = line.strip_prefix(tag)?;
    if rest.is_empty() {
        return Some("");
    }
    if rest.starts_with([' ', '\t']) {
        return Some(rest.trim());
    }
    None
}

/// Split a `#L` payload into labels.
///
/// The format separates labels with two or more spaces so that a single
/// label may contain one internal space ("Two Theta"). When a `#N` count is
/// declared and the double-space split disagrees with it, fall back to a
/// plain whitespace split (some writers pad with single spaces only).
fn split_labels(raw: &str, declared: Option<usize>) -> Vec<String> {
    let two_space: Vec<String> = raw
        .split("  ")
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();

    if let Some(n) = declared {
        if two_space.len() != n {
            let plain: Vec<String> = raw.split_whitespace().map(str::to_string).collect();
            if plain.len() == n {
                return plain;
            }
        }
    }

    two_space
}

/// Parse a `#D` timestamp.
///
/// The classic writer emits ctime-style stamps ("Thu Feb 27 14:04:28 2014");
/// ISO-ish variants show up in converted files. An unrecognized stamp is
/// advisory metadata, not an error.
fn parse_spec_date(raw: &str) -> Option<NaiveDateTime> {
    const FMTS: [&str; 3] = ["%a %b %d %H:%M:%S %Y", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];
    for fmt in FMTS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_scan_text() -> String {
        let mut text = String::new();
        text.push_str("#F /data/beamline/run42.dat\n");
        text.push_str("#E 1393509966\n");
        text.push_str("#D Thu Feb 27 14:04:28 2014\n");
        text.push_str("#C acquisition restarted after refill\n");
        text.push('\n');
        text.push_str("#S 1  ascan th 0.5 1.0 2 1\n");
        text.push_str("#D Thu Feb 27 14:05:02 2014\n");
        text.push_str("#T 1 (Seconds)\n");
        text.push_str("#N 3\n");
        text.push_str("#L th  detector  monitor\n");
        text.push_str("0.5 101 9000\n");
        text.push_str("0.75 154 9012\n");
        text.push_str("1.0 90 8995\n");
        text.push('\n');
        text.push_str("#S 4  timescan 0.1\n");
        text.push_str("#N 2\n");
        text.push_str("#L Time  Counts\n");
        text.push_str("0.0 12\n");
        text.push_str("0.1 15\n");
        text
    }

    #[test]
    fn parses_scans_labels_and_rows() {
        let file = SpecFile::parse_str("run42.dat", &two_scan_text()).unwrap();
        assert_eq!(file.scans().len(), 2);

        let scan = file.scan_by_number(1).unwrap();
        assert_eq!(scan.command(), "ascan th 0.5 1.0 2 1");
        assert_eq!(scan.labels(), ["th", "detector", "monitor"]);
        assert_eq!(scan.points(), 3);
        assert_eq!(scan.rows()[1], vec![0.75, 154.0, 9012.0]);
        assert_eq!(scan.column(2).unwrap(), vec![9000.0, 9012.0, 8995.0]);
        assert!(scan.column(3).is_none());

        let second = file.scan_by_number(4).unwrap();
        assert_eq!(second.labels(), ["Time", "Counts"]);
        assert_eq!(second.points(), 2);
    }

    #[test]
    fn missing_scan_number_is_a_lookup_error() {
        let file = SpecFile::parse_str("run42.dat", &two_scan_text()).unwrap();
        let err = file.scan_by_number(2).unwrap_err();
        assert_eq!(err.exit_code(), 3);
        assert!(err.to_string().contains("scan 2"));
    }

    #[test]
    fn dates_parse_for_file_and_scan() {
        let file = SpecFile::parse_str("run42.dat", &two_scan_text()).unwrap();
        let file_date = file.date().unwrap();
        assert_eq!(file_date.format("%Y-%m-%d %H:%M:%S").to_string(), "2014-02-27 14:04:28");

        let scan_date = file.scan_by_number(1).unwrap().date().unwrap();
        assert_eq!(scan_date.format("%H:%M:%S").to_string(), "14:05:02");
        assert!(file.scan_by_number(4).unwrap().date().is_none());
    }

    #[test]
    fn labels_split_on_double_spaces() {
        let text = "#S 1  a2scan\n#L Two Theta  Counts  I zero\n1 2 3\n";
        let file = SpecFile::parse_str("t.dat", text).unwrap();
        let scan = file.scan_by_number(1).unwrap();
        assert_eq!(scan.labels(), ["Two Theta", "Counts", "I zero"]);
        assert_eq!(scan.rows()[0], vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn declared_count_falls_back_to_whitespace_split() {
        // Single-space separators disagree with the double-space rule; #N
        // resolves the split.
        let text = "#S 1  ascan\n#N 3\n#L th det mon\n0.5 10 100\n";
        let file = SpecFile::parse_str("t.dat", text).unwrap();
        assert_eq!(file.scan_by_number(1).unwrap().labels(), ["th", "det", "mon"]);
    }

    #[test]
    fn ragged_row_is_a_format_error_with_line() {
        let text = "#S 1  ascan\n#L a  b\n1 2\n3\n";
        let err = SpecFile::parse_str("bad.dat", text).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        let text = err.to_string();
        assert!(text.contains("line 4"));
        assert!(text.contains("found 1"));
    }

    #[test]
    fn bad_numeric_token_is_a_format_error() {
        let text = "#S 1  ascan\n#L a  b\n1 x\n";
        let err = SpecFile::parse_str("bad.dat", text).unwrap_err();
        assert!(err.to_string().contains("'x'"));
    }

    #[test]
    fn duplicate_labels_are_rejected() {
        let text = "#S 1  ascan\n#L th  det  th\n1 2 3\n";
        let err = SpecFile::parse_str("dup.dat", text).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("duplicate channel label 'th'"));
    }

    #[test]
    fn data_before_labels_is_rejected() {
        let text = "#S 1  ascan\n1 2 3\n";
        let err = SpecFile::parse_str("bad.dat", text).unwrap_err();
        assert!(err.to_string().contains("before #L"));
    }

    #[test]
    fn mca_blocks_and_comments_are_skipped() {
        let text = concat!(
            "#S 1  ct\n",
            "#L det  mon\n",
            "1 2\n",
            "@A 0 0 1 5 9 2\\\n",
            " 7 3 0 0 1 4\\\n",
            " 0 0 0 0 0 0\n",
            "#C beam dump at 14:10\n",
            "3 4\n",
        );
        let file = SpecFile::parse_str("mca.dat", text).unwrap();
        let scan = file.scan_by_number(1).unwrap();
        assert_eq!(scan.points(), 2);
        assert_eq!(scan.rows()[1], vec![3.0, 4.0]);
    }

    #[test]
    fn empty_scan_is_valid() {
        let text = "#S 9  aborted before first point\n#L a  b\n";
        let file = SpecFile::parse_str("t.dat", text).unwrap();
        let scan = file.scan_by_number(9).unwrap();
        assert_eq!(scan.points(), 0);
        assert_eq!(scan.labels().len(), 2);
    }

    #[test]
    fn repeated_scan_number_keeps_first_occurrence() {
        let text = "#S 3  ascan first\n#L a\n1\n#S 3  ascan second\n#L a\n2\n";
        let file = SpecFile::parse_str("t.dat", text).unwrap();
        assert_eq!(file.scans().len(), 2);
        let scan = file.scan_by_number(3).unwrap();
        assert_eq!(scan.command(), "ascan first");
        assert_eq!(scan.rows()[0], vec![1.0]);
    }

    #[test]
    fn scan_with_hundred_points_and_three_channels() {
        let mut text = String::from("#S 2  Escan\n#N 3\n#L energy  mu  I0\n");
        for i in 0..100 {
            let e = 7000.0 + i as f64;
            text.push_str(&format!("{e} {} {}\n", 0.1 + i as f64 * 1e-3, 50_000 - i));
        }
        let file = SpecFile::parse_str("xafs.dat", &text).unwrap();
        let scan = file.scan_by_number(2).unwrap();
        assert_eq!(scan.points(), 100);
        assert_eq!(scan.labels(), ["energy", "mu", "I0"]);
    }
}
