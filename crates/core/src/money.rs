use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A currency amount held as a decimal, always at two-decimal precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(Decimal);

impl Money {
    pub fn from_cents(cents: i64) -> Self {
        Money(Decimal::new(cents, 2))
    }

    /// Rounds half away from zero to cents.
    pub fn from_decimal(decimal: Decimal) -> Self {
        let mut d = decimal.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        d.rescale(2);
        Money(d)
    }

    pub fn is_negative(self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    pub fn abs(self) -> Self {
        Money(self.0.abs())
    }

    pub fn as_decimal(self) -> Decimal {
        self.0
    }

    /// `quantity × self`, rounded to cents.
    pub fn times(self, quantity: Decimal) -> Self {
        Money::from_decimal(self.0 * quantity)
    }

    /// Parse a receipt money token: `1.64`, `$1.64`, `1,234.56`, `-7.80`,
    /// `7.80-`, `-$7.80`. Returns `None` for anything else.
    pub fn parse_token(token: &str) -> Option<Self> {
        let mut s = token.trim();
        let mut negative = false;
        if let Some(rest) = s.strip_suffix('-') {
            negative = true;
            s = rest;
        }
        if let Some(rest) = s.strip_prefix('-') {
            if negative {
                return None;
            }
            negative = true;
            s = rest;
        }
        s = s.strip_prefix('$').unwrap_or(s);
        if let Some(rest) = s.strip_prefix('-') {
            if negative {
                return None;
            }
            negative = true;
            s = rest;
        }

        let (whole, frac) = s.split_once('.')?;
        if frac.len() != 2 || !frac.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        if !valid_whole_part(whole) {
            return None;
        }

        let clean = format!("{}.{frac}", whole.replace(',', ""));
        let value = Decimal::from_str(&clean).ok()?;
        Some(Money::from_decimal(if negative { -value } else { value }))
    }

    /// Plain two-decimal rendering without a currency symbol: `-7.80`.
    pub fn to_plain_string(self) -> String {
        format!("{:.2}", self.0)
    }
}

/// Digits only, or digits grouped by thousands separators (`1,234`).
fn valid_whole_part(whole: &str) -> bool {
    if whole.is_empty() {
        return false;
    }
    if !whole.contains(',') {
        return whole.bytes().all(|b| b.is_ascii_digit());
    }
    let mut groups = whole.split(',');
    let head = groups.next().unwrap_or_default();
    (1..=3).contains(&head.len())
        && head.bytes().all(|b| b.is_ascii_digit())
        && groups.all(|g| g.len() == 3 && g.bytes().all(|b| b.is_ascii_digit()))
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_negative() {
            write!(f, "-${:.2}", self.0.abs())
        } else {
            write!(f, "${:.2}", self.0)
        }
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_plain_string())
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        <Decimal as Deserialize>::deserialize(deserializer).map(Money::from_decimal)
    }
}
