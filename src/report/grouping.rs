//! Grouping, collapsing and ordering of diagnostics for display

use std::collections::{BTreeSet, HashMap};

use crate::cargo::DiagnosticEntry;

/// Lowest priority tier, for codes not listed in [`PRIORITY_TIERS`]
pub const DEFAULT_TIER: u8 = 4;

/// Codes fixed first because later errors usually cascade from them
pub const PRIORITY_TIERS: [(u8, &[&str]); 3] = [
    (1, &["E0432", "E0433"]),
    (2, &["E0412", "E0405"]),
    (3, &["E0599", "E0609"]),
];

const GROUP_MESSAGE_WIDTH: usize = 80;
const MIXED_GROUP_MESSAGE_WIDTH: usize = 60;
const ITEM_WIDTH: usize = 100;
/// Suggestions this short carry no information worth a line
const MIN_SUGGESTION_LEN: usize = 3;

pub fn priority(code: &str) -> u8 {
    PRIORITY_TIERS
        .iter()
        .find(|(_, codes)| codes.contains(&code))
        .map_or(DEFAULT_TIER, |(tier, _)| *tier)
}

pub fn tier_hint(tier: u8) -> &'static str {
    match tier {
        1 => "unresolved imports -> fix first, cascading",
        2 => "missing types/traits -> often caused by imports",
        3 => "missing methods/fields -> depend on type resolution",
        _ => "other -> usually standalone",
    }
}

/// Order codes by priority tier, then alphabetically
pub fn sort_codes<'a>(codes: impl IntoIterator<Item = &'a str>) -> Vec<&'a str> {
    let mut codes: Vec<&str> = codes
        .into_iter()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    codes.sort_by_key(|code| (priority(code), *code));
    codes
}

/// Cut `text` to `max` characters, marking the cut with `...`
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", kept)
}

pub fn plural(count: usize) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}

/// Merge consecutive lines of the same file into `file:start-end` ranges
///
/// ```
/// use cargo_diag::report::grouping::collapse_locations;
///
/// let locations = [("a.rs", 5), ("b.rs", 10), ("a.rs", 7), ("a.rs", 6)];
/// assert_eq!(collapse_locations(&locations), vec!["a.rs:5-7", "b.rs:10"]);
/// ```
pub fn collapse_locations(locations: &[(&str, u32)]) -> Vec<String> {
    let mut sorted = locations.to_vec();
    sorted.sort_unstable();
    sorted.dedup();

    let mut ranges = Vec::new();
    let mut iter = sorted.into_iter();
    let Some((mut file, mut start)) = iter.next() else {
        return ranges;
    };
    let mut end = start;

    for (next_file, line) in iter {
        if next_file == file && end.checked_add(1) == Some(line) {
            end = line;
            continue;
        }
        ranges.push(render_range(file, start, end));
        file = next_file;
        start = line;
        end = line;
    }
    ranges.push(render_range(file, start, end));
    ranges
}

fn render_range(file: &str, start: u32, end: u32) -> String {
    if start == end {
        format!("{}:{}", file, start)
    } else {
        format!("{}:{}-{}", file, start, end)
    }
}

/// Render `diags` grouped by code into `out`
///
/// A group whose members all share one message becomes a single line with a
/// hit count and collapsed locations. Otherwise every member gets a numbered
/// line of its own; numbering runs across groups.
pub fn format_grouped(out: &mut Vec<String>, diags: &[&DiagnosticEntry]) {
    let mut groups: HashMap<&str, Vec<&DiagnosticEntry>> = HashMap::new();
    for &diag in diags {
        groups.entry(diag.code.as_str()).or_default().push(diag);
    }

    let mut counter = 1;
    for code in sort_codes(groups.keys().copied()) {
        let items = &groups[code];
        let hits = items.len();
        let messages: BTreeSet<&str> = items.iter().map(|d| d.message.as_str()).collect();

        if messages.len() == 1 {
            out.push(format!(
                "## {}: {} [{} hit{}]",
                code,
                truncate(&items[0].message, GROUP_MESSAGE_WIDTH),
                hits,
                plural(hits)
            ));

            let suggestions: BTreeSet<&str> = items
                .iter()
                .filter_map(|d| d.suggestion.as_deref())
                .filter(|s| s.chars().count() > MIN_SUGGESTION_LEN)
                .collect();
            for suggestion in suggestions {
                out.push(format!("  FIX: {}", truncate(suggestion, ITEM_WIDTH)));
            }

            let locations: Vec<(&str, u32)> =
                items.iter().map(|d| (d.file.as_str(), d.line)).collect();
            for location in collapse_locations(&locations) {
                out.push(format!("  - {}", location));
            }
            counter += hits;
        } else {
            out.push(format!(
                "## {}: {} [{} hit{}]",
                code,
                truncate(&items[0].message, MIXED_GROUP_MESSAGE_WIDTH),
                hits,
                plural(hits)
            ));
            for item in items {
                out.push(format!(
                    "  {}. {}:{} -> {}",
                    counter,
                    item.file,
                    item.line,
                    truncate(&item.message, ITEM_WIDTH)
                ));
                if let Some(suggestion) = &item.suggestion {
                    out.push(format!("     FIX: {}", truncate(suggestion, ITEM_WIDTH)));
                }
                counter += 1;
            }
        }

        out.push(String::new());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cargo::Level;

    fn diag(code: &str, file: &str, line: u32, message: &str, suggestion: Option<&str>) -> DiagnosticEntry {
        DiagnosticEntry {
            code: code.to_string(),
            level: Level::Error,
            message: message.to_string(),
            file: file.to_string(),
            line,
            column: 1,
            suggestion: suggestion.map(str::to_string),
        }
    }

    #[test]
    fn test_collapse_locations_range_and_singleton() {
        let locations = [("a", 5), ("a", 6), ("a", 7), ("b", 10)];
        assert_eq!(collapse_locations(&locations), vec!["a:5-7", "b:10"]);
        assert!(collapse_locations(&[]).is_empty());
        assert_eq!(collapse_locations(&[("a", 1), ("a", 3)]), vec!["a:1", "a:3"]);
    }

    #[test]
    fn test_collapse_locations_at_line_limit() {
        let locations = [("a", u32::MAX - 1), ("a", u32::MAX)];
        assert_eq!(
            collapse_locations(&locations),
            vec![format!("a:{}-{}", u32::MAX - 1, u32::MAX)]
        );
        assert_eq!(
            collapse_locations(&[("a", u32::MAX), ("b", 0)]),
            vec![format!("a:{}", u32::MAX), "b:0".to_string()]
        );
    }

    #[test]
    fn test_priority_order() {
        let codes = sort_codes(["E0308", "E0599", "E0432", "E0412", "E0001", "E0432"]);
        assert_eq!(codes, vec!["E0432", "E0412", "E0599", "E0001", "E0308"]);
        assert_eq!(priority("E0609"), 3);
        assert_eq!(priority("E????"), DEFAULT_TIER);
    }

    #[test]
    fn test_truncate_counts_characters() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghij", 8), "abcde...");
        assert_eq!(truncate("ééééééé", 6), "ééé...");
    }

    #[test]
    fn test_same_message_group_is_compact() {
        let a = diag("E0425", "src/a.rs", 3, "cannot find value `x`", Some("y"));
        let b = diag("E0425", "src/a.rs", 4, "cannot find value `x`", Some("let x = 0;"));
        let c = diag("E0425", "src/b.rs", 1, "cannot find value `x`", Some("let x = 0;"));

        let mut out = Vec::new();
        format_grouped(&mut out, &[&a, &b, &c]);
        assert_eq!(
            out,
            vec![
                "## E0425: cannot find value `x` [3 hits]",
                "  FIX: let x = 0;",
                "  - src/a.rs:3-4",
                "  - src/b.rs:1",
                "",
            ]
        );
    }

    #[test]
    fn test_mixed_message_group_numbers_items_after_compact_groups() {
        let import = diag("E0432", "src/lib.rs", 1, "unresolved import `a`", None);
        let first = diag("E0308", "src/x.rs", 10, "mismatched types: expected u32", None);
        let second = diag("E0308", "src/y.rs", 20, "mismatched types: expected &str", Some("\"a\""));

        let mut out = Vec::new();
        format_grouped(&mut out, &[&first, &import, &second]);
        assert_eq!(
            out,
            vec![
                "## E0432: unresolved import `a` [1 hit]",
                "  - src/lib.rs:1",
                "",
                "## E0308: mismatched types: expected u32 [2 hits]",
                "  2. src/x.rs:10 -> mismatched types: expected u32",
                "  3. src/y.rs:20 -> mismatched types: expected &str",
                "     FIX: \"a\"",
                "",
            ]
        );
    }
}
