/// Formats an integer with comma thousands separators (`1234567` → `"1,234,567"`).
///
/// # Example
///
/// ```
/// use instarelay::core::utils::format_count;
///
/// assert_eq!(format_count(1234567), "1,234,567");
/// assert_eq!(format_count(999), "999");
/// ```
pub fn format_count(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Truncates to at most `max_chars` characters without splitting a code point.
pub fn truncate_chars(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}

/// Bytes to MiB as a float, for display.
pub fn bytes_to_mb(bytes: u64) -> f64 {
    bytes as f64 / 1024.0 / 1024.0
}

/// Escapes characters that are unsafe in file names.
///
/// Replaced characters:
/// - `/` and `\` (path separators)
/// - `:` `*` `?` `<` `>` `|` (reserved on Windows)
/// - `"` becomes `'`
/// - control characters
///
/// # Example
///
/// ```
/// use instarelay::core::utils::escape_filename;
///
/// let safe = escape_filename("reel/name*.mp4");
/// assert_eq!(safe, "reel_name_.mp4");
/// ```
pub fn escape_filename(filename: &str) -> String {
    let mut result = String::with_capacity(filename.len());

    for c in filename.chars() {
        match c {
            '/' | '\\' => result.push('_'),
            ':' | '*' | '?' | '<' | '>' | '|' => result.push('_'),
            '"' => result.push('\''),
            c if c.is_control() => result.push('_'),
            _ => result.push(c),
        }
    }

    let result = result.trim_matches(|c: char| c.is_whitespace() || c == '.');

    if result.is_empty() {
        "unnamed".to_string()
    } else {
        result.to_string()
    }
}
