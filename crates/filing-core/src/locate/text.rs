//! Line units for flat-text documents.

use super::Unit;

/// Non-blank lines with their byte offsets into `text`.
pub fn lines(text: &str) -> Vec<Unit> {
    let mut units = Vec::new();
    let mut offset = 0usize;
    for raw in text.split_inclusive('\n') {
        let line = raw.trim();
        if !line.is_empty() {
            units.push(Unit {
                text: line.to_string(),
                start: offset,
            });
        }
        offset += raw.len();
    }
    units
}
