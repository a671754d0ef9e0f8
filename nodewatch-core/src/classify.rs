// Severity buckets for the risk and shared-user columns

use nodewatch_client::model::{NOT_APPLICABLE_MARK, UNKNOWN_MARK};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RiskClass {
    White,
    Green,
    Yellow,
    Orange,
    Red,
    Black,
}

impl RiskClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskClass::White => "risk-white",
            RiskClass::Green => "risk-green",
            RiskClass::Yellow => "risk-yellow",
            RiskClass::Orange => "risk-orange",
            RiskClass::Red => "risk-red",
            RiskClass::Black => "risk-black",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SharedClass {
    Green,
    Yellow,
    Orange,
    Red,
    Black,
}

impl SharedClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            SharedClass::Green => "shared-green",
            SharedClass::Yellow => "shared-yellow",
            SharedClass::Orange => "shared-orange",
            SharedClass::Red => "shared-red",
            SharedClass::Black => "shared-black",
        }
    }
}

fn is_sentinel(raw: &str) -> bool {
    raw.is_empty() || raw == UNKNOWN_MARK || raw == NOT_APPLICABLE_MARK
}

/// Parse the integer a string starts with ("35%" -> 35). Leading whitespace
/// and a sign are accepted, anything after the digits is ignored.
fn leading_integer(raw: &str) -> Option<i64> {
    let trimmed = raw.trim_start();
    let (negative, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let digits_end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    if digits_end == 0 {
        return None;
    }

    let value = rest[..digits_end].parse::<i64>().unwrap_or(i64::MAX);
    Some(if negative { -value } else { value })
}

pub fn risk_class(risk: &str) -> Option<RiskClass> {
    if is_sentinel(risk) {
        return None;
    }

    let value = leading_integer(risk)?;
    Some(match value {
        ..=10 => RiskClass::White,
        ..=30 => RiskClass::Green,
        ..=50 => RiskClass::Yellow,
        ..=70 => RiskClass::Orange,
        ..=90 => RiskClass::Red,
        _ => RiskClass::Black,
    })
}

/// Bucket a shared-user count. Ranges ("100-500") use their upper bound and
/// an open-ended count ("10000+") is pushed past its bound.
pub fn shared_class(shared: &str) -> Option<SharedClass> {
    if is_sentinel(shared) {
        return None;
    }

    let upper = shared
        .split(|c: char| !c.is_ascii_digit())
        .filter(|run| !run.is_empty())
        .last()?;
    let mut upper = upper.parse::<u64>().unwrap_or(u64::MAX);

    if shared.contains('+') {
        upper = upper.saturating_add(1);
    }

    Some(match upper {
        ..=10 => SharedClass::Green,
        ..=100 => SharedClass::Yellow,
        ..=1000 => SharedClass::Orange,
        ..=10000 => SharedClass::Red,
        _ => SharedClass::Black,
    })
}
