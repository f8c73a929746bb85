//! Output file naming.
//!
//! Battle location archives name their members by a two-letter scene prefix
//! plus a two-letter suffix: `**aa` is the skeleton, `**ac` onward the
//! textures, `**am` onward the model pieces.

/// Uppercase, truncate to two characters, pad with 'A'.
pub fn normalize_prefix(prefix: &str) -> String {
    let mut p: String = prefix
        .to_uppercase()
        .chars()
        .filter(|c| c.is_ascii())
        .take(2)
        .collect();
    while p.len() < 2 {
        p.push('A');
    }
    p
}

/// Skeleton file: `prefix + "AA"`, lowercased.
pub fn skeleton_file_name(prefix: &str) -> String {
    format!("{}AA", prefix).to_lowercase()
}

/// Model piece `index`: suffix starts at "AM" and rolls the second letter
/// past 'Z' by bumping the first.
pub fn model_file_name(prefix: &str, index: u32) -> String {
    let mut first = 'A' as u32;
    let mut second = 'M' as u32 + index;
    while second > 'Z' as u32 {
        second -= 26;
        first += 1;
    }
    let first = char::from_u32(first).unwrap_or('A');
    let second = char::from_u32(second).unwrap_or('A');
    format!("{}{}{}", prefix, first, second).to_lowercase()
}

/// Texture page `tex_index`: `prefix + 'A' + ('C' + tex_index)`.
pub fn texture_file_name(prefix: &str, tex_index: u32) -> String {
    let suffix = char::from_u32('C' as u32 + tex_index).unwrap_or('C');
    format!("{}A{}", prefix, suffix).to_lowercase()
}
