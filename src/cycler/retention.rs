use crate::cycler::entry::{Entry, RUN_FOOTER_TAG};
use chrono::{Duration, NaiveDate};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExcludeReason {
    /// The entry's most recent date falls outside the retention window.
    Expired(NaiveDate),
    /// No date token could be extracted; the entry cannot be aged.
    MissingDate,
}

impl fmt::Display for ExcludeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExcludeReason::Expired(date) => write!(f, "expired (last date {date})"),
            ExcludeReason::MissingDate => write!(f, "no parsable date"),
        }
    }
}

/// One entry dropped by the retention filter, with enough context to report.
#[derive(Debug, Clone)]
pub struct ExcludedEntry {
    pub position: usize,
    pub run_number: Option<u64>,
    pub reason: ExcludeReason,
}

#[derive(Debug, Clone, Default)]
pub struct RetentionOutcome {
    pub kept: Vec<Entry>,
    pub excluded: Vec<ExcludedEntry>,
}

fn is_recent(date: NaiveDate, today: NaiveDate, window_days: u32) -> bool {
    today.signed_duration_since(date) < Duration::days(i64::from(window_days))
}

/// Apply the retention window to `entries`, preserving relative order.
/// A window of 0 disables filtering. Entries with no parsable date are
/// excluded with `MissingDate` rather than aborting the archival pass.
pub fn filter_recent(entries: Vec<Entry>, window_days: u32, today: NaiveDate) -> RetentionOutcome {
    if window_days == 0 {
        return RetentionOutcome {
            kept: entries,
            excluded: Vec::new(),
        };
    }

    let mut out = RetentionOutcome::default();
    for (position, entry) in entries.into_iter().enumerate() {
        match entry.last_date {
            Some(date) if is_recent(date, today, window_days) => out.kept.push(entry),
            Some(date) => out.excluded.push(ExcludedEntry {
                position,
                run_number: entry.run_number,
                reason: ExcludeReason::Expired(date),
            }),
            None => out.excluded.push(ExcludedEntry {
                position,
                run_number: entry.run_number,
                reason: ExcludeReason::MissingDate,
            }),
        }
    }
    out
}

/// Rewrite the run number in the last `RUN NO :` footer of `text`.
/// Returns `None` when no well-formed footer is present; the caller leaves
/// such entries untouched.
fn rewrite_run_footer(text: &str, number: u64) -> Option<String> {
    let tag_at = text.rfind(RUN_FOOTER_TAG)?;
    let digits_start = tag_at + RUN_FOOTER_TAG.len();
    let digits_len = text[digits_start..]
        .bytes()
        .take_while(u8::is_ascii_digit)
        .count();
    if digits_len == 0 {
        return None;
    }

    let mut out = String::with_capacity(text.len() + 4);
    out.push_str(&text[..digits_start]);
    out.push_str(&number.to_string());
    out.push_str(&text[digits_start + digits_len..]);
    Some(out)
}

/// Renumber surviving entries to a contiguous 1..N in their current order.
/// Only the footer token changes; entries without a locatable footer pass
/// through verbatim.
pub fn renumber(entries: Vec<Entry>) -> Vec<Entry> {
    entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| {
            let number = index as u64 + 1;
            match rewrite_run_footer(&entry.text, number) {
                Some(text) => Entry {
                    text,
                    run_number: Some(number),
                    last_date: entry.last_date,
                },
                None => entry,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cycler::entry::Entry;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn entry(text: &str) -> Entry {
        Entry::parse(text)
    }

    #[test]
    fn window_zero_is_identity() {
        let entries = vec![entry("a 2020-01-01 | RUN NO : 1"), entry("no date here")];
        let out = filter_recent(entries.clone(), 0, date(2024, 6, 1));
        assert_eq!(out.kept, entries);
        assert!(out.excluded.is_empty());
    }

    #[test]
    fn boundary_is_strict_an_entry_exactly_window_days_old_is_dropped() {
        let today = date(2024, 6, 30);
        let exactly = vec![entry("x 2024-05-31 | RUN NO : 1")];
        let out = filter_recent(exactly, 30, today);
        assert!(out.kept.is_empty());
        assert_eq!(out.excluded.len(), 1);

        let just_inside = vec![entry("x 2024-06-01 | RUN NO : 1")];
        let out = filter_recent(just_inside, 30, today);
        assert_eq!(out.kept.len(), 1);
    }

    #[test]
    fn undated_entries_are_excluded_with_reason() {
        let out = filter_recent(vec![entry("no dates at all")], 30, date(2024, 6, 1));
        assert!(out.kept.is_empty());
        assert_eq!(out.excluded[0].reason, ExcludeReason::MissingDate);
    }

    #[test]
    fn filtering_preserves_relative_order() {
        let today = date(2024, 6, 10);
        let entries = vec![
            entry("a 2024-06-01 | RUN NO : 1"),
            entry("b 2020-01-01 | RUN NO : 2"),
            entry("c 2024-06-05 | RUN NO : 3"),
        ];
        let out = filter_recent(entries, 30, today);
        assert_eq!(
            out.kept.iter().map(|e| e.run_number).collect::<Vec<_>>(),
            vec![Some(1), Some(3)]
        );
        assert_eq!(out.excluded[0].position, 1);
    }

    #[test]
    fn filtering_is_idempotent() {
        let today = date(2024, 6, 10);
        let entries = vec![
            entry("a 2024-06-01 | RUN NO : 1"),
            entry("b 2020-01-01 | RUN NO : 2"),
        ];
        let once = filter_recent(entries, 30, today);
        let twice = filter_recent(once.kept.clone(), 30, today);
        assert_eq!(once.kept, twice.kept);
        assert!(twice.excluded.is_empty());
    }

    #[test]
    fn renumber_yields_contiguous_sequence_in_order() {
        let entries = vec![
            entry("a\n2024-06-01 09:00:00 | RUN NO : 4"),
            entry("b\n2024-06-02 09:00:00 | RUN NO : 9"),
            entry("c\n2024-06-03 09:00:00 | RUN NO : 12"),
        ];
        let renumbered = renumber(entries);
        assert_eq!(
            renumbered.iter().map(|e| e.run_number).collect::<Vec<_>>(),
            vec![Some(1), Some(2), Some(3)]
        );
        assert!(renumbered[2].text.ends_with("| RUN NO : 3"));
        assert!(renumbered[2].text.starts_with("c\n"));
    }

    #[test]
    fn renumber_touches_only_the_footer_token() {
        let text = "counted 12 retries on 2024-06-01\n2024-06-01 09:00:00 | RUN NO : 12";
        let renumbered = renumber(vec![entry(text)]);
        assert_eq!(
            renumbered[0].text,
            "counted 12 retries on 2024-06-01\n2024-06-01 09:00:00 | RUN NO : 1"
        );
    }

    #[test]
    fn renumber_leaves_footerless_entries_verbatim() {
        let renumbered = renumber(vec![entry("legacy block with no footer")]);
        assert_eq!(renumbered[0].text, "legacy block with no footer");
        assert_eq!(renumbered[0].run_number, None);
    }
}
