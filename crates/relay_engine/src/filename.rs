use relay_core::asset_filename;
use sha2::{Digest, Sha256};

const MAX_FILENAME_CHARS: usize = 120;

/// Local filename for a downloaded attachment: the URL's last path segment,
/// made safe for the downloads directory. URLs without a usable segment get
/// `attachment-{short_hash(url)}`. Equal URLs always map to the same name.
pub fn attachment_filename(url: &str) -> String {
    asset_filename(url)
        .map(|name| sanitize(&name))
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| format!("attachment-{}", short_hash(url)))
}

fn sanitize(input: &str) -> String {
    let cleaned: String = input
        .chars()
        .map(|c| if is_forbidden(c) { '_' } else { c })
        .collect();
    // Also strips "." and ".." so nothing escapes the directory.
    let mut name: String = cleaned
        .trim_matches(&['_', ' ', '.'][..])
        .chars()
        .take(MAX_FILENAME_CHARS)
        .collect();
    let stem = name.split('.').next().unwrap_or(&name);
    if is_reserved_windows_name(stem) {
        name.insert(0, '_');
    }
    name
}

fn is_forbidden(c: char) -> bool {
    matches!(c,
        '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0'..='\u{1F}'
    )
}

fn is_reserved_windows_name(name: &str) -> bool {
    const RESERVED: &[&str] = &[
        "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
        "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
    ];
    RESERVED.iter().any(|r| r.eq_ignore_ascii_case(name))
}

fn short_hash(input: &str) -> String {
    use std::fmt::Write;

    let digest = Sha256::digest(input.as_bytes());
    digest.iter().take(4).fold(String::with_capacity(8), |mut hex, byte| {
        let _ = write!(&mut hex, "{byte:02x}");
        hex
    })
}
