/// Tracks whether the scan position sits inside a single-quoted literal.
///
/// The flag flips on every `'` that is not directly preceded by a backslash. Doubled
/// quotes (`''`) flip it twice, which happens to land on the right state; dialect
/// escapes such as `E'..'` or dollar quoting are not recognised.
#[derive(Debug, Default, Clone, Copy)]
pub(super) struct QuoteState {
    in_quote: bool,
}

impl QuoteState {
    pub(super) fn observe(&mut self, prev: char, current: char) {
        if current == '\'' && prev != '\\' {
            self.in_quote = !self.in_quote;
        }
    }

    pub(super) fn in_quote(self) -> bool {
        self.in_quote
    }
}

/// Number of `?` characters after the first one, quoted or not.
///
/// Over-counts on purpose: it only sizes the output buffer.
pub(super) fn count_question_marks(sql: &str) -> usize {
    sql.chars().skip(1).filter(|c| *c == '?').count()
}
