//! Unified-diff hunk parsing, used to scope records to the edited regions.

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A contiguous base/head line-range pair from a unified diff.
/// Ranges are 1-indexed and inclusive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiffHunk {
    pub file: String,
    pub base_start: u32,
    pub base_end: u32,
    pub head_start: u32,
    pub head_end: u32,
    /// Head line numbers introduced by this hunk.
    pub added_lines: Vec<u32>,
    /// Base line numbers removed by this hunk.
    pub removed_lines: Vec<u32>,
}

impl DiffHunk {
    /// Whole-file fallback hunk, used when no patch is available or no hunk
    /// header parses.
    pub fn whole_file(file: &str, base_lines: u32, head_lines: u32) -> Self {
        Self {
            file: file.to_string(),
            base_start: 1,
            base_end: base_lines.max(1),
            head_start: 1,
            head_end: head_lines.max(1),
            added_lines: Vec::new(),
            removed_lines: Vec::new(),
        }
    }

    /// `line` is 0-indexed (tree-sitter coordinates).
    pub fn contains_head_line(&self, line: u32) -> bool {
        let line = line + 1;
        line >= self.head_start && line <= self.head_end
    }

    /// `line` is 0-indexed (tree-sitter coordinates).
    pub fn contains_base_line(&self, line: u32) -> bool {
        let line = line + 1;
        line >= self.base_start && line <= self.base_end
    }
}

/// Parse a unified-diff patch into hunks. Zero parseable hunks degrades to
/// one whole-file hunk rather than failing.
pub fn parse_patch(
    file: &str,
    patch: Option<&str>,
    base_lines: u32,
    head_lines: u32,
) -> Vec<DiffHunk> {
    let Some(patch) = patch else {
        return vec![DiffHunk::whole_file(file, base_lines, head_lines)];
    };

    let header = match Regex::new(r"^@@ -(\d+)(?:,(\d+))? \+(\d+)(?:,(\d+))? @@") {
        Ok(re) => re,
        Err(_) => return vec![DiffHunk::whole_file(file, base_lines, head_lines)],
    };

    let mut hunks: Vec<DiffHunk> = Vec::new();
    let mut base_line = 0u32;
    let mut head_line = 0u32;

    for line in patch.lines() {
        if let Some(caps) = header.captures(line) {
            let base_start = capture_num(&caps, 1, 1);
            let base_len = capture_num(&caps, 2, 1);
            let head_start = capture_num(&caps, 3, 1);
            let head_len = capture_num(&caps, 4, 1);
            base_line = base_start;
            head_line = head_start;
            hunks.push(DiffHunk {
                file: file.to_string(),
                base_start,
                base_end: base_start + base_len.saturating_sub(1),
                head_start,
                head_end: head_start + head_len.saturating_sub(1),
                added_lines: Vec::new(),
                removed_lines: Vec::new(),
            });
            continue;
        }
        let Some(current) = hunks.last_mut() else {
            continue;
        };
        match line.as_bytes().first() {
            Some(b'+') => {
                current.added_lines.push(head_line);
                head_line += 1;
            }
            Some(b'-') => {
                current.removed_lines.push(base_line);
                base_line += 1;
            }
            Some(b' ') => {
                base_line += 1;
                head_line += 1;
            }
            _ => {}
        }
    }

    if hunks.is_empty() {
        debug!(file, "no parseable hunks, falling back to whole-file hunk");
        return vec![DiffHunk::whole_file(file, base_lines, head_lines)];
    }
    hunks
}

fn capture_num(caps: &regex::Captures<'_>, index: usize, default: u32) -> u32 {
    caps.get(index)
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PATCH: &str = "\
--- a/src/api.ts
+++ b/src/api.ts
@@ -10,4 +10,5 @@ export function send() {
 const a = 1;
-const b = 2;
+const b = 3;
+const c = 4;
 const d = 5;
@@ -40,2 +41,2 @@
-old();
+updated();
 tail();
";

    #[test]
    fn parses_hunk_headers_and_line_lists() {
        let hunks = parse_patch("src/api.ts", Some(PATCH), 50, 51);
        assert_eq!(hunks.len(), 2);

        let first = &hunks[0];
        assert_eq!((first.base_start, first.base_end), (10, 13));
        assert_eq!((first.head_start, first.head_end), (10, 14));
        assert_eq!(first.removed_lines, vec![11]);
        assert_eq!(first.added_lines, vec![11, 12]);

        let second = &hunks[1];
        assert_eq!(second.removed_lines, vec![40]);
        assert_eq!(second.added_lines, vec![41]);
    }

    #[test]
    fn missing_patch_falls_back_to_whole_file() {
        let hunks = parse_patch("f.ts", None, 100, 120);
        assert_eq!(hunks.len(), 1);
        assert_eq!(hunks[0].base_end, 100);
        assert_eq!(hunks[0].head_end, 120);
    }

    #[test]
    fn garbage_patch_falls_back_to_whole_file() {
        let hunks = parse_patch("f.ts", Some("not a patch at all"), 10, 10);
        assert_eq!(hunks.len(), 1);
        assert_eq!(hunks[0].base_start, 1);
    }

    #[test]
    fn zero_indexed_containment() {
        let hunks = parse_patch("f.ts", Some(PATCH), 50, 51);
        // Head line 10 (1-indexed) is 9 in tree-sitter coordinates.
        assert!(hunks[0].contains_head_line(9));
        assert!(!hunks[0].contains_head_line(20));
    }
}
