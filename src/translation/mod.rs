use std::borrow::Cow;

mod scanner;

use scanner::{QuoteState, count_question_marks};

use crate::error::SqlDbdError;

/// Highest placeholder number the translator will emit.
pub const MAX_PLACEHOLDERS: usize = 9999;

/// Widest native marker, in bytes: the marker character plus four digits.
pub const MAX_PLACEHOLDER_SIZE: usize = 1 + 4;

/// Native bind-parameter syntax of a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderStyle {
    /// The backend understands positional `?` markers as written (`SQLite`, `DuckDB`).
    Positional,
    /// PostgreSQL-style numbered markers like `$1`.
    Dollar,
    /// Oracle-style numbered markers like `:1`.
    Colon,
}

impl PlaceholderStyle {
    /// Marker character for numbered styles; `None` when `?` is passed through untouched.
    #[must_use]
    pub fn marker(self) -> Option<char> {
        match self {
            PlaceholderStyle::Positional => None,
            PlaceholderStyle::Dollar => Some('$'),
            PlaceholderStyle::Colon => Some(':'),
        }
    }
}

/// Rewrite portable `?` placeholders into `{native_marker}{N}` markers.
///
/// `N` starts at 1 and increases left to right; numbering restarts on every call. A `?`
/// inside a single-quoted literal is copied as-is. The first character of `sql` is copied
/// without inspection since valid SQL cannot start with a bind marker.
///
/// Warning: literal detection is a quote-toggle heuristic (a `'` preceded by `\` does not
/// toggle). Dollar-quoted bodies and dialect-specific escapes are not understood, so SQL
/// relying on those should use native markers directly instead of `?`:
/// ```rust
/// use sql_dbd::translation::translate;
///
/// let sql = translate("SELECT * FROM t WHERE a=? AND b='c?d'", '$').unwrap();
/// assert_eq!(sql, "SELECT * FROM t WHERE a=$1 AND b='c?d'");
/// ```
///
/// # Errors
/// Returns `SqlDbdError::PrepareFailed` if the statement uses more than
/// [`MAX_PLACEHOLDERS`] placeholders.
pub fn translate(sql: &str, native_marker: char) -> Result<String, SqlDbdError> {
    let extra_space = count_question_marks(sql) * (MAX_PLACEHOLDER_SIZE - 1);
    let mut out = String::with_capacity(sql.len() + extra_space + 1);

    let mut chars = sql.chars();
    let Some(first) = chars.next() else {
        return Ok(out);
    };
    out.push(first);

    let mut quote = QuoteState::default();
    let mut prev = first;
    let mut ph_num: usize = 1;

    for c in chars {
        quote.observe(prev, c);

        if c == '?' && !quote.in_quote() {
            if ph_num > MAX_PLACEHOLDERS {
                return Err(SqlDbdError::PrepareFailed(format!(
                    "more than {MAX_PLACEHOLDERS} placeholders; use {native_marker}{{num}} format instead"
                )));
            }
            out.push(native_marker);
            out.push_str(&ph_num.to_string());
            ph_num += 1;
        } else {
            out.push(c);
        }
        prev = c;
    }

    Ok(out)
}

/// Translate `sql` for a backend's placeholder style.
///
/// Returns a borrowed `Cow` when no rewriting is needed, either because the backend takes
/// `?` natively or because the statement has no candidate markers.
///
/// # Errors
/// Propagates the placeholder limit error from [`translate`].
pub fn translate_placeholders(
    sql: &str,
    style: PlaceholderStyle,
) -> Result<Cow<'_, str>, SqlDbdError> {
    match style.marker() {
        None => Ok(Cow::Borrowed(sql)),
        Some(_) if count_question_marks(sql) == 0 => Ok(Cow::Borrowed(sql)),
        Some(marker) => translate(sql, marker).map(Cow::Owned),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_unquoted_markers_in_order() {
        let res = translate("SELECT * FROM t WHERE a=? AND b='c?d'", '$').unwrap();
        assert_eq!(res, "SELECT * FROM t WHERE a=$1 AND b='c?d'");

        let res = translate("insert into t values(?, ?, ?)", ':').unwrap();
        assert_eq!(res, "insert into t values(:1, :2, :3)");
    }

    #[test]
    fn escaped_quote_keeps_literal_open() {
        let res = translate(r"select 'it\'s ?' , ?", '$').unwrap();
        assert_eq!(res, r"select 'it\'s ?' , $1");
    }

    #[test]
    fn doubled_quotes_toggle_twice() {
        let res = translate("select 'a''?' , ?", '$').unwrap();
        assert_eq!(res, "select 'a''?' , $1");
    }

    #[test]
    fn first_character_is_never_a_marker() {
        assert_eq!(translate("?", '$').unwrap(), "?");
        assert_eq!(translate("??", '$').unwrap(), "?$1");
        assert_eq!(translate("", '$').unwrap(), "");
    }

    #[test]
    fn numbering_restarts_per_call() {
        let sql = "update t set a = ? where b = ?";
        assert_eq!(translate(sql, '$').unwrap(), translate(sql, '$').unwrap());
        assert_eq!(
            translate(sql, '$').unwrap(),
            "update t set a = $1 where b = $2"
        );
    }

    #[test]
    fn multibyte_text_is_preserved() {
        let res = translate("select 'héllo ?', ? -- ✓", '$').unwrap();
        assert_eq!(res, "select 'héllo ?', $1 -- ✓");
    }

    #[test]
    fn placeholder_limit_is_enforced() {
        let mut sql = String::from("select 1");
        for _ in 0..MAX_PLACEHOLDERS {
            sql.push_str(", ?");
        }
        let ok = translate(&sql, '$').unwrap();
        assert!(ok.ends_with("$9999"));

        sql.push_str(", ?");
        let err = translate(&sql, '$').unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::PrepareFailed);
    }

    #[test]
    fn positional_style_borrows() {
        let sql = "select * from t where a = ?";
        let res = translate_placeholders(sql, PlaceholderStyle::Positional).unwrap();
        assert!(matches!(res, Cow::Borrowed(_)));

        let res = translate_placeholders("select 1", PlaceholderStyle::Dollar).unwrap();
        assert!(matches!(res, Cow::Borrowed(_)));

        let res = translate_placeholders(sql, PlaceholderStyle::Dollar).unwrap();
        assert_eq!(res, "select * from t where a = $1");
    }
}
