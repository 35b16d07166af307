//! Line table with token prefix sums

/// Token estimate for a span of text: `ceil(chars / 4)`
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(4)
}

/// A contiguous 1-indexed, inclusive line range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineSpan {
    pub start: usize,
    pub end: usize,
    /// Single line that alone exceeds the budget
    pub oversized: bool,
}

/// Lines of one file plus cumulative character counts
pub struct LineIndex<'a> {
    source: &'a str,
    /// Byte offset where each line starts, plus one sentinel at the end
    offsets: Vec<usize>,
    /// chars[i] = characters in lines 1..=i
    chars: Vec<usize>,
}

impl<'a> LineIndex<'a> {
    pub fn new(source: &'a str) -> Self {
        let mut offsets = vec![0];
        let mut chars = vec![0];
        let mut total = 0;
        for line in source.split_inclusive('\n') {
            total += line.chars().count();
            chars.push(total);
            offsets.push(offsets[offsets.len() - 1] + line.len());
        }
        Self {
            source,
            offsets,
            chars,
        }
    }

    /// Number of lines; a trailing newline does not open a new line
    pub fn len(&self) -> usize {
        self.offsets.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Text of lines `start..=end`, newlines included
    pub fn slice(&self, start: usize, end: usize) -> &'a str {
        let (start, end) = self.clamp(start, end);
        if start > end {
            return "";
        }
        &self.source[self.offsets[start - 1]..self.offsets[end]]
    }

    pub fn tokens(&self, start: usize, end: usize) -> usize {
        let (start, end) = self.clamp(start, end);
        if start > end {
            return 0;
        }
        (self.chars[end] - self.chars[start - 1]).div_ceil(4)
    }

    pub fn is_blank(&self, line: usize) -> bool {
        self.slice(line, line).trim().is_empty()
    }

    /// Shrink a range to its first and last non-blank lines
    pub fn trim(&self, start: usize, end: usize) -> Option<(usize, usize)> {
        let (mut start, mut end) = self.clamp(start, end);
        while start <= end && self.is_blank(start) {
            start += 1;
        }
        while end >= start && self.is_blank(end) {
            end -= 1;
        }
        (start <= end).then_some((start, end))
    }

    /// Split `start..=end` into consecutive spans of at most `max_lines`
    /// lines and `max_tokens` tokens; a line over the budget stands alone
    pub fn windows(
        &self,
        start: usize,
        end: usize,
        max_lines: usize,
        max_tokens: usize,
    ) -> Vec<LineSpan> {
        let (start, end) = self.clamp(start, end);
        let max_lines = max_lines.max(1);
        let mut spans = Vec::new();
        let mut span_start = start;

        while span_start <= end {
            let mut span_end = span_start;
            while span_end < end
                && span_end + 1 - span_start < max_lines
                && self.tokens(span_start, span_end + 1) <= max_tokens
            {
                span_end += 1;
            }
            spans.push(LineSpan {
                start: span_start,
                end: span_end,
                oversized: self.tokens(span_start, span_end) > max_tokens,
            });
            span_start = span_end + 1;
        }
        spans
    }

    fn clamp(&self, start: usize, end: usize) -> (usize, usize) {
        (start.max(1), end.min(self.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimate_tokens_rounds_up() {
        assert_eq!(estimate_tokens(""), 0);
        assert_eq!(estimate_tokens("abc"), 1);
        assert_eq!(estimate_tokens("abcd"), 1);
        assert_eq!(estimate_tokens("abcde"), 2);
    }

    #[test]
    fn test_line_count_and_slice() {
        let index = LineIndex::new("a\nbb\nccc\n");
        assert_eq!(index.len(), 3);
        assert_eq!(index.slice(2, 3), "bb\nccc\n");
        assert_eq!(index.slice(3, 9), "ccc\n");

        let unterminated = LineIndex::new("a\nb");
        assert_eq!(unterminated.len(), 2);
        assert_eq!(unterminated.slice(2, 2), "b");
        assert!(LineIndex::new("").is_empty());
    }

    #[test]
    fn test_tokens_match_estimate() {
        let source = "fn main() {\n    let x = 1;\n}\n";
        let index = LineIndex::new(source);
        assert_eq!(index.tokens(1, 3), estimate_tokens(source));
        assert_eq!(index.tokens(2, 2), estimate_tokens("    let x = 1;\n"));
    }

    #[test]
    fn test_trim_blank_edges() {
        let index = LineIndex::new("\n\nx\ny\n  \n");
        assert_eq!(index.trim(1, 5), Some((3, 4)));
        assert_eq!(index.trim(1, 2), None);
    }

    #[test]
    fn test_windows_respect_line_limit() {
        let source = "l\n".repeat(10);
        let index = LineIndex::new(&source);
        let spans = index.windows(1, 10, 4, 1000);
        let ranges: Vec<_> = spans.iter().map(|s| (s.start, s.end)).collect();
        assert_eq!(ranges, vec![(1, 4), (5, 8), (9, 10)]);
    }

    #[test]
    fn test_windows_respect_token_limit() {
        let line = format!("{}\n", "x".repeat(39));
        let source = line.repeat(6);
        let index = LineIndex::new(&source);
        let spans = index.windows(1, 6, 100, 25);
        assert!(spans.iter().all(|s| index.tokens(s.start, s.end) <= 25));
        assert_eq!(spans.first().map(|s| s.start), Some(1));
        assert_eq!(spans.last().map(|s| s.end), Some(6));
    }

    #[test]
    fn test_single_long_line_is_oversized() {
        let source = format!("short\n{}\nshort\n", "y".repeat(400));
        let index = LineIndex::new(&source);
        let spans = index.windows(1, 3, 100, 50);
        assert_eq!(spans.len(), 3);
        assert!(spans[1].oversized);
        assert!(!spans[0].oversized);
    }
}
