//! Text rendering of a summary

use crate::inspector::FolderRecord;
use std::fmt::Write;

const UNITS: [(u64, &str); 6] = [
    (1 << 50, "PB"),
    (1 << 40, "TB"),
    (1 << 30, "GB"),
    (1 << 20, "MB"),
    (1 << 10, "KB"),
    (1, ""),
];

/// Format a byte count with a binary unit suffix and two decimals.
///
/// A size exactly on a threshold uses that threshold's unit, so
/// `1024` is `1.00KB` and `1023` stays `1023.00`.
///
/// ```
/// use imap_folder_summary::human_size;
///
/// assert_eq!(human_size(0), "0.00");
/// assert_eq!(human_size(1536), "1.50KB");
/// ```
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn human_size(bytes: u64) -> String {
    let (factor, suffix) = UNITS
        .iter()
        .copied()
        .find(|&(factor, _)| bytes >= factor)
        .unwrap_or((1, ""));
    format!("{:.2}{suffix}", bytes as f64 / factor as f64)
}

/// Render records as a fixed-width table with a header row.
#[must_use]
pub fn render(records: &[FolderRecord]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<30}{:>10}{:>20}{:>10}",
        "Name", "No. Msgs", "Size(b)", "Size(txt)"
    );
    for record in records {
        let _ = writeln!(
            out,
            "{:<30}{:>10}{:>20}{:>10}",
            record.name().as_str(),
            record.message_count(),
            record.byte_size(),
            human_size(record.byte_size()),
        );
    }
    out
}
