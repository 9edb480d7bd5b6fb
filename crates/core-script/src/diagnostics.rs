use std::fmt::Write as _;
use std::ops::Range;

/// An in-memory script source with a precomputed line table, so byte
/// offsets can be mapped to (line, column) pairs in O(log n).
#[derive(Debug, Clone)]
pub struct SourceBuffer {
    file: String,
    content: String,
    /// Byte offset of the first character of each line.
    line_starts: Vec<usize>,
}

impl SourceBuffer {
    pub fn new<F: Into<String>, C: Into<String>>(file: F, content: C) -> Self {
        let content = content.into();
        let mut line_starts = vec![0];
        for (i, byte) in content.bytes().enumerate() {
            if byte == b'\n' {
                line_starts.push(i + 1);
            }
        }
        Self {
            file: file.into(),
            content,
            line_starts,
        }
    }

    pub fn file(&self) -> &str {
        &self.file
    }

    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Text of line `index` (0-based) without its trailing newline.
    pub fn line(&self, index: usize) -> &str {
        let start = self.line_starts[index];
        let end = self
            .line_starts
            .get(index + 1)
            .map(|next| next - 1)
            .unwrap_or(self.content.len());
        &self.content[start..end]
    }

    /// Map a byte offset to (line, column), both 0-based. Offsets past the
    /// end clamp to the final position.
    pub fn line_column(&self, offset: usize) -> (usize, usize) {
        let offset = offset.min(self.content.len());
        let line = match self.line_starts.binary_search(&offset) {
            Ok(exact) => exact,
            Err(insertion) => insertion - 1,
        };
        (line, offset - self.line_starts[line])
    }
}

/// Accumulates a human-readable diagnostic: message lines interleaved with
/// source excerpts that carry a caret line under the highlighted span.
#[derive(Debug, Default)]
pub struct ErrorFormatter {
    out: String,
}

impl ErrorFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pushline(&mut self, msg: &str) -> &mut Self {
        self.out.push_str(msg);
        self.out.push('\n');
        self
    }

    /// Render the source lines covering `range` with carets underneath the
    /// highlighted columns. An empty range marks an insertion point with a
    /// single caret.
    pub fn highlight(&mut self, src: &SourceBuffer, range: Range<usize>, msg: &str) -> &mut Self {
        let begin = range.start.min(src.len());
        let end = range.end.min(src.len());
        let is_insertion = begin == end;

        let (line_begin, col_begin) = src.line_column(begin);
        let (line_end, col_end) = src.line_column(end);

        if !msg.is_empty() {
            let _ = writeln!(self.out, "At file '{}' {}", src.file(), msg);
        }
        let digit_len = (line_begin.max(line_end) + 1).to_string().len();
        let pref_len = digit_len + 2; // "NN│ "

        for line_idx in line_begin..=line_end {
            let line_text = src.line(line_idx);
            let _ = writeln!(
                self.out,
                "{:<width$}│ {}",
                line_idx + 1,
                line_text,
                width = digit_len
            );

            if is_insertion {
                let pos = col_begin.min(line_text.len());
                let mut caret_line = " ".repeat(pref_len + pos);
                caret_line.push('^');
                self.out.push_str(&caret_line);
                self.out.push('\n');
                continue;
            }

            let mut hl_begin = 0;
            let mut hl_end = line_text.len();
            if line_idx == line_begin {
                hl_begin = col_begin.min(line_text.len());
            }
            if line_idx == line_end {
                hl_end = col_end.min(line_text.len());
            }
            if hl_begin < hl_end {
                let mut caret_line = " ".repeat(pref_len + hl_begin);
                caret_line.push_str(&"^".repeat(hl_end - hl_begin));
                self.out.push_str(&caret_line);
                self.out.push('\n');
            }
        }
        self
    }

    /// Take the accumulated text, leaving the formatter empty.
    pub fn finish(&mut self) -> String {
        std::mem::take(&mut self.out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_column_mapping() {
        let src = SourceBuffer::new("t", "ab\ncde\n\nf");
        assert_eq!(src.line_column(0), (0, 0));
        assert_eq!(src.line_column(1), (0, 1));
        assert_eq!(src.line_column(3), (1, 0));
        assert_eq!(src.line_column(5), (1, 2));
        assert_eq!(src.line_column(7), (2, 0));
        assert_eq!(src.line_column(8), (3, 0));
        // Past-end offsets clamp.
        assert_eq!(src.line_column(100), (3, 1));
        assert_eq!(src.line_count(), 4);
        assert_eq!(src.line(1), "cde");
    }

    #[test]
    fn highlight_places_carets_under_the_span() {
        let src = SourceBuffer::new("script.txt", "a+b-c");
        let mut formatter = ErrorFormatter::new();
        formatter.highlight(&src, 2..5, "expected integer operand");
        let text = formatter.finish();

        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "At file 'script.txt' expected integer operand");
        assert_eq!(lines[1], "1│ a+b-c");
        // Three carets, starting under column 2 of line 1.
        assert_eq!(lines[2], "     ^^^");
        assert_eq!(lines[2].find('^'), Some(2 + 3));
    }

    #[test]
    fn insertion_point_renders_a_single_caret() {
        let src = SourceBuffer::new("script.txt", "a+b-c");
        let mut formatter = ErrorFormatter::new();
        formatter.highlight(&src, 3..3, "");
        let text = formatter.finish();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "1│ a+b-c");
        assert_eq!(lines[1].matches('^').count(), 1);
        assert_eq!(lines[1].find('^'), Some(3 + 3));
    }

    #[test]
    fn multi_line_highlight_covers_both_lines() {
        let src = SourceBuffer::new("s", "abc\ndef");
        let mut formatter = ErrorFormatter::new();
        formatter.highlight(&src, 1..6, "");
        let text = formatter.finish();
        // Line 1 carets from column 1 to end; line 2 carets from 0 to 2.
        assert!(text.contains("1│ abc"));
        assert!(text.contains("2│ def"));
        assert_eq!(text.matches('^').count(), 2 + 2);
    }

    #[test]
    fn pushline_and_finish_reset_state() {
        let mut formatter = ErrorFormatter::new();
        formatter.pushline("first");
        assert_eq!(formatter.finish(), "first\n");
        assert_eq!(formatter.finish(), "");
    }
}
