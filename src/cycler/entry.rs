use chrono::NaiveDate;

/// Width of each rule line in the entry separator block.
pub const SEPARATOR_WIDTH: usize = 120;

/// Tag introducing the run number in an entry footer.
pub const RUN_FOOTER_TAG: &str = "| RUN NO : ";

/// The two-line rule that delimits entries on disk.
pub fn separator() -> String {
    let line = "=".repeat(SEPARATOR_WIDTH);
    format!("{line}\n{line}")
}

/// One archived run: the raw block plus whatever could be extracted from it.
/// `run_number` is `None` when the footer is missing or malformed; such
/// entries never contribute to numbering. `last_date` is the most recent
/// date-shaped token found anywhere in the block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub text: String,
    pub run_number: Option<u64>,
    pub last_date: Option<NaiveDate>,
}

impl Entry {
    pub fn parse(block: &str) -> Entry {
        let text = block.trim().to_string();
        let run_number = last_token_run_number(&text);
        let last_date = last_date_token(&text);
        Entry {
            text,
            run_number,
            last_date,
        }
    }
}

/// Split a raw archive blob into ordered entries. Empty input yields no
/// entries; separator-adjacent whitespace is trimmed away.
pub fn split_entries(raw: &str) -> Vec<Entry> {
    if raw.trim().is_empty() {
        return Vec::new();
    }
    let sep = separator();
    raw.split(sep.as_str())
        .filter(|block| !block.trim().is_empty())
        .map(Entry::parse)
        .collect()
}

fn last_token_run_number(text: &str) -> Option<u64> {
    text.split_whitespace()
        .next_back()?
        .parse::<u64>()
        .ok()
        .filter(|n| *n > 0)
}

fn date_shaped(window: &[u8]) -> bool {
    window.len() == 10
        && window[..4].iter().all(u8::is_ascii_digit)
        && window[4] == b'-'
        && window[5..7].iter().all(u8::is_ascii_digit)
        && window[7] == b'-'
        && window[8..10].iter().all(u8::is_ascii_digit)
}

/// Last `YYYY-MM-DD`-shaped token in `text` that parses as a real date.
/// Tokens embedded in longer digit runs are skipped.
fn last_date_token(text: &str) -> Option<NaiveDate> {
    let bytes = text.as_bytes();
    let mut found = None;
    let mut i = 0usize;
    while i + 10 <= bytes.len() {
        let bounded_left = i == 0 || !bytes[i - 1].is_ascii_digit();
        let bounded_right = i + 10 == bytes.len() || !bytes[i + 10].is_ascii_digit();
        if bounded_left && bounded_right && date_shaped(&bytes[i..i + 10]) {
            // All ten bytes are ASCII, so the slice is on char boundaries.
            if let Ok(date) = NaiveDate::parse_from_str(&text[i..i + 10], "%Y-%m-%d") {
                found = Some(date);
            }
            i += 10;
            continue;
        }
        i += 1;
    }
    found
}
