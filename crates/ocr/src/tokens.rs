//! Token-level recognizers shared by every stage: money tokens, weight and
//! rate markers, flags.

use larder_core::Money;

macro_rules! re {
    ($name:ident, $pat:expr) => {
        fn $name() -> &'static ::regex::Regex {
            static R: ::std::sync::OnceLock<::regex::Regex> = ::std::sync::OnceLock::new();
            R.get_or_init(|| ::regex::Regex::new($pat).expect("invalid regex"))
        }
    };
}
pub(crate) use re;

re!(re_unit_word, r"(?i)^(?:lbs?|kgs?|oz|g)\.?$");
re!(re_per_unit_suffix, r"(?i)^/\s*(?:lbs?|kgs?|oz|g|ea|each)\.?$");
re!(re_flag, r"^[A-Za-z*]{1,2}$");
re!(re_weight, r"(?i)\b(\d+(?:\.\d+)?)\s*(lbs?|kgs?|oz|g)\b");
re!(re_unit_token, r"(?i)\b(?:lbs?|kgs?|oz|g)\b");
re!(re_rate_marker, r"(?i)@|/\s*(?:lbs?|kgs?|oz|g|ea|each)\b");

/// A money-like token located inside a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoneyToken {
    /// Byte offset of the token's first character (sign or `$` included).
    pub start: usize,
    /// Byte offset one past the token's last character.
    pub end: usize,
    pub value: Money,
    /// Followed by a unit-rate marker such as `/lb`.
    pub per_unit: bool,
    /// Preceded by `@`.
    pub rate: bool,
    /// Followed by a bare weight unit (`3.04 lb`): a quantity, not money.
    pub quantity: bool,
}

impl MoneyToken {
    /// Whether this token can close a row as its line total.
    pub fn is_total_candidate(&self) -> bool {
        !self.per_unit && !self.rate && !self.quantity
    }

    /// The line with exactly this token's span removed.
    pub fn remove_from(&self, line: &str) -> String {
        let mut out = String::with_capacity(line.len());
        out.push_str(&line[..self.start]);
        out.push_str(&line[self.end..]);
        out
    }

    /// Text preceding the token, trimmed.
    pub fn prefix<'a>(&self, line: &'a str) -> &'a str {
        line[..self.start].trim()
    }
}

/// Whitespace-separated words with their byte offsets.
pub fn words(line: &str) -> Vec<(usize, &str)> {
    let mut out = Vec::new();
    let mut start = None;
    for (i, c) in line.char_indices() {
        match (c.is_whitespace(), start) {
            (true, Some(s)) => {
                out.push((s, &line[s..i]));
                start = None;
            }
            (false, None) => start = Some(i),
            _ => {}
        }
    }
    if let Some(s) = start {
        out.push((s, &line[s..]));
    }
    out
}

/// Every money-like token in reading order.
pub fn money_tokens(line: &str) -> Vec<MoneyToken> {
    let ws = words(line);
    let mut tokens = Vec::new();

    for (i, &(offset, word)) in ws.iter().enumerate() {
        let mut core = word;
        let mut start = offset;
        let mut rate = false;
        let mut per_unit = false;

        if let Some(rest) = core.strip_prefix('@') {
            rate = true;
            core = rest;
            start += 1;
        }
        if let Some(slash) = core.find('/') {
            if !re_per_unit_suffix().is_match(&core[slash..]) {
                continue;
            }
            per_unit = true;
            core = &core[..slash];
        }
        let Some(value) = Money::parse_token(core) else {
            continue;
        };

        if i > 0 && ws[i - 1].1.ends_with('@') {
            rate = true;
        }

        let next = ws.get(i + 1).map(|w| w.1);
        let after_next = ws.get(i + 2).map(|w| w.1);
        let mut quantity = false;
        match next {
            Some(n) if re_unit_word().is_match(n) => quantity = true,
            Some(n) if re_per_unit_suffix().is_match(n) => per_unit = true,
            Some(n) if n == "/" || n.eq_ignore_ascii_case("per") => {
                if after_next.is_some_and(|a| re_unit_word().is_match(a) || a.eq_ignore_ascii_case("ea")) {
                    per_unit = true;
                }
            }
            _ => {}
        }

        tokens.push(MoneyToken {
            start,
            end: start + core.len(),
            value,
            per_unit,
            rate,
            quantity,
        });
    }

    tokens
}

/// The line-total token: the last money token that is not a per-unit price,
/// a rate or a quantity, followed by nothing but at most two short flags.
pub fn line_total_token(line: &str) -> Option<MoneyToken> {
    let token = money_tokens(line)
        .into_iter()
        .rev()
        .find(MoneyToken::is_total_candidate)?;
    let trailing = words(&line[token.end..]);
    let flags_only = trailing.len() <= 2 && trailing.iter().all(|(_, w)| re_flag().is_match(w));
    flags_only.then_some(token)
}

/// Weight amount and unit, e.g. `3.04 lb`, with the match's byte offset.
pub fn weight_match(line: &str) -> Option<(usize, &str, &str)> {
    let c = re_weight().captures(line)?;
    let whole = c.get(0)?;
    Some((whole.start(), c.get(1)?.as_str(), c.get(2)?.as_str()))
}

pub fn has_unit_token(line: &str) -> bool {
    re_unit_token().is_match(line)
}

pub fn has_rate_marker(line: &str) -> bool {
    re_rate_marker().is_match(line)
}

pub fn has_weight_or_rate_signal(line: &str) -> bool {
    re_weight().is_match(line) || has_rate_marker(line)
}

pub fn has_letters(s: &str) -> bool {
    s.chars().any(char::is_alphabetic)
}

pub fn letter_count(s: &str) -> usize {
    s.chars().filter(|c| c.is_alphabetic()).count()
}

pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn words_with_offsets() {
        assert_eq!(words("  AB  C "), vec![(2, "AB"), (6, "C")]);
        assert!(words("   ").is_empty());
    }

    #[test]
    fn plain_total_is_found() {
        let t = line_total_token("MILK 2% 3.49").unwrap();
        assert_eq!(t.value, Money::from_cents(349));
        assert_eq!(&"MILK 2% 3.49"[t.start..t.end], "3.49");
    }

    #[test]
    fn trailing_flags_are_allowed() {
        let line = "1234567 KS WATER 4.99 A";
        let t = line_total_token(line).unwrap();
        assert_eq!(t.value, Money::from_cents(499));
    }

    #[test]
    fn per_unit_price_is_not_a_total() {
        assert!(line_total_token("BANANAS 0.54/lb").is_none());
        assert!(line_total_token("BANANAS 0.54 /lb").is_none());
        assert!(line_total_token("BANANAS 0.54 / lb").is_none());
        let t = line_total_token("BANANAS 0.54/lb 1.64").unwrap();
        assert_eq!(t.value, Money::from_cents(164));
    }

    #[test]
    fn rate_after_at_is_not_a_total() {
        assert!(line_total_token("3.04 lb @ 0.54").is_none());
        assert!(line_total_token("3.04 lb @0.54").is_none());
        let t = line_total_token("BANANAS 3.04 lb @ 0.54 1.64").unwrap();
        assert_eq!(t.value, Money::from_cents(164));
    }

    #[test]
    fn weight_is_a_quantity() {
        let toks = money_tokens("3.04 lb");
        assert_eq!(toks.len(), 1);
        assert!(toks[0].quantity);
        assert!(line_total_token("3.04 lb").is_none());
    }

    #[test]
    fn earlier_money_token_is_kept_out_of_the_way() {
        // The line total is the *last* candidate, not merely the last occurrence
        // of its text.
        let line = "3.49 COFFEE 3.49";
        let t = line_total_token(line).unwrap();
        assert_eq!(t.start, 12);
        assert_eq!(t.remove_from(line), "3.49 COFFEE ");
    }

    #[test]
    fn negative_totals() {
        let t = line_total_token("350276 /1207907 7.80-").unwrap();
        assert!(t.value.is_negative());
        assert_eq!(t.prefix("350276 /1207907 7.80-"), "350276 /1207907");
    }

    #[test]
    fn trailing_words_disqualify() {
        assert!(line_total_token("4.99 SAVE MORE TODAY").is_none());
    }

    #[test]
    fn signals() {
        assert!(has_weight_or_rate_signal("3.04 lb @ 0.54"));
        assert!(has_weight_or_rate_signal("2 @ 1.99"));
        assert!(has_weight_or_rate_signal("0.99/lb"));
        assert!(!has_weight_or_rate_signal("BANANAS"));
        assert_eq!(weight_match("BANANAS 3.04 lb @ 0.54"), Some((8, "3.04", "lb")));
        assert!(has_unit_token("1.2 KG"));
        assert!(!has_unit_token("GLOBE"));
    }

    #[test]
    fn collapse() {
        assert_eq!(collapse_whitespace("  a   b\tc "), "a b c");
    }
}
