//! Spreadsheet column labels.
//!
//! Columns are numbered from 1 and labelled in bijective base 26:
//! `1 => A`, `26 => Z`, `27 => AA`, `53 => BA`.

/// Label for a 1-based column number. Column 0 has no label and yields an
/// empty string.
pub fn column_name(mut n: u32) -> String {
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push((b'A' + rem as u8) as char);
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}

/// 1-based column number for a label. Returns `None` for an empty label, any
/// character outside `A-Z`, or a label too wide to fit in a `u32`.
pub fn column_number(label: &str) -> Option<u32> {
    if label.is_empty() {
        return None;
    }

    label.bytes().try_fold(0u32, |acc, b| {
        if !b.is_ascii_uppercase() {
            return None;
        }
        acc.checked_mul(26)?.checked_add(u32::from(b - b'A') + 1)
    })
}
