//! Natural sort keys for sequence-numbered filenames.

/// Width numeric suffixes are padded to.
pub const KEY_DIGITS: usize = 6;

/// Build a sort key in which `<stem>-<digits>.<ext>` suffixes compare by
/// numeric value.
///
/// The digits must directly follow a `-` and directly precede the final
/// extension separator of the last path component. Leading zeros are dropped
/// and the number is re-rendered zero-padded to [`KEY_DIGITS`] places, so
/// `abc-1.png` and `abc-01.png` both become `abc-000001.png`. Names without
/// that pattern are returned unchanged.
pub fn filename_key(name: &str) -> String {
    let Some(dot) = name.rfind('.') else {
        return name.to_string();
    };
    let (head, suffix) = name.split_at(dot);
    if suffix.contains(['/', '\\']) {
        return name.to_string();
    }

    let digits_start = head
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_ascii_digit())
        .last()
        .map(|(i, _)| i);
    let Some(digits_start) = digits_start else {
        return name.to_string();
    };
    let (stem, digits) = head.split_at(digits_start);
    if !stem.ends_with('-') {
        return name.to_string();
    }

    let significant = digits.trim_start_matches('0');
    let significant = if significant.is_empty() { "0" } else { significant };
    format!("{stem}{significant:0>width$}{suffix}", width = KEY_DIGITS)
}
