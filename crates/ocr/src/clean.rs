use crate::tokens::re;

re!(re_url_marker, r"(?i)https?://|www\.|\.com/|\.com\b");
re!(re_page_marker, r"^\(?\s*(?:page\s+)?\d{1,3}\s*/\s*\d{1,3}\s*\)?$");

/// Drop rows that carry nothing the line pipeline can use. Order is kept and
/// nothing is merged.
pub fn clean_raw_lines<S: AsRef<str>>(lines: &[S]) -> Vec<String> {
    lines
        .iter()
        .map(|l| l.as_ref().trim())
        .filter(|l| l.chars().any(char::is_alphanumeric))
        .filter(|l| !re_url_marker().is_match(l))
        .filter(|l| !re_page_marker().is_match(&l.to_lowercase()))
        .map(str::to_string)
        .collect()
}
