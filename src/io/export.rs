//! Export channel tables to CSV.
//!
//! The export is meant to be easy to consume in spreadsheets or downstream
//! scripts: one column per channel, in the reader's sorted label order.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::data::ChannelMap;
use crate::error::ScanError;

/// Write every channel of one scan to a CSV file.
pub fn write_channels_csv(path: &Path, channels: &ChannelMap) -> Result<(), ScanError> {
    let mut file = File::create(path).map_err(|e| ScanError::io(path, e))?;

    let header: Vec<String> = channels.keys().map(|k| csv_field(k)).collect();
    writeln!(file, "{}", header.join(",")).map_err(|e| ScanError::io(path, e))?;

    let rows = channels.values().next().map_or(0, |c| c.len());
    for i in 0..rows {
        let mut line = String::new();
        for (j, column) in channels.values().enumerate() {
            if j > 0 {
                line.push(',');
            }
            line.push_str(&column[i].to_string());
        }
        writeln!(file, "{line}").map_err(|e| ScanError::io(path, e))?;
    }

    Ok(())
}

/// Quote a CSV field only when it needs it.
fn csv_field(raw: &str) -> String {
    if raw.contains(',') || raw.contains('"') {
        format!("\"{}\"", raw.replace('"', "\"\""))
    } else {
        raw.to_string()
    }
}
