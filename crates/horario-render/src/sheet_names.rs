//! Worksheet naming
//!
//! XLSX sheet names may not contain `\ / ? * [ ] :`, are capped at 31
//! characters and are unique case-insensitively within a workbook.

use std::collections::HashSet;

/// Hard limit of the XLSX format
pub const MAX_SHEET_NAME_CHARS: usize = 31;

const FORBIDDEN: &[char] = &['\\', '/', '?', '*', '[', ']', ':'];
const FALLBACK_NAME: &str = "Hoja";

/// Strip forbidden characters and truncate to the length limit
pub fn sanitize_sheet_name(raw: &str) -> String {
    let cleaned: String = raw.chars().filter(|c| !FORBIDDEN.contains(c)).collect();
    // Excel also rejects names that start or end with an apostrophe
    let cleaned = cleaned.trim().trim_matches('\'').trim();
    let name = truncate_chars(cleaned, MAX_SHEET_NAME_CHARS);
    if name.is_empty() {
        FALLBACK_NAME.to_string()
    } else {
        name
    }
}

fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect::<String>().trim_end().to_string()
}

/// Hands out unique sheet names for one workbook
#[derive(Debug, Default)]
pub struct SheetNamer {
    taken: HashSet<String>,
}

impl SheetNamer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim a name as-is (e.g. the summary sheet)
    pub fn reserve(&mut self, name: &str) {
        self.taken.insert(name.to_lowercase());
    }

    /// Sanitized, deduplicated name; duplicates get ` (1)`, ` (2)`, ...
    pub fn unique(&mut self, raw: &str) -> String {
        let base = sanitize_sheet_name(raw);
        if self.taken.insert(base.to_lowercase()) {
            return base;
        }
        let mut n = 1usize;
        loop {
            let suffix = format!(" ({n})");
            let room = MAX_SHEET_NAME_CHARS - suffix.chars().count();
            let candidate = format!("{}{suffix}", truncate_chars(&base, room));
            if self.taken.insert(candidate.to_lowercase()) {
                return candidate;
            }
            n += 1;
        }
    }
}
