//! Recurrence kinds and configured day tokens.
//!
//! Habits keep their configured days as raw tokens, exactly as clients sent
//! them. The tokens only gain a meaning once resolved against the habit's
//! [`Frequency`]: weekday names for weekly habits, day-of-month numbers for
//! monthly ones. Daily habits ignore them.

use chrono::Weekday;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{CoreError, Result};

/// How often a habit is expected to happen.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Frequency {
    /// Every day
    Daily,
    /// On configured weekdays
    Weekly,
    /// On configured days of the month
    Monthly,
    /// Unrecognized kind, kept verbatim
    Other(String),
}

impl Frequency {
    /// Parse a frequency name. Matching is case-insensitive and accepts the
    /// Spanish names existing clients send.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "daily" | "diario" | "diaria" => Frequency::Daily,
            "weekly" | "semanal" => Frequency::Weekly,
            "monthly" | "mensual" => Frequency::Monthly,
            _ => Frequency::Other(raw.to_string()),
        }
    }

    /// Canonical name.
    pub fn as_str(&self) -> &str {
        match self {
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
            Frequency::Monthly => "monthly",
            Frequency::Other(raw) => raw,
        }
    }
}

impl From<String> for Frequency {
    fn from(raw: String) -> Self {
        Frequency::parse(&raw)
    }
}

impl From<Frequency> for String {
    fn from(frequency: Frequency) -> Self {
        frequency.as_str().to_string()
    }
}

impl std::fmt::Display for Frequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A configured day, resolved by the habit's frequency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DayToken {
    /// Day of the week (weekly habits)
    Weekday(Weekday),
    /// Day of the month, 1..=31 (monthly habits)
    DayOfMonth(u32),
}

impl DayToken {
    /// Day-of-month value, if this token is one.
    pub fn day_of_month(&self) -> Option<u32> {
        match self {
            DayToken::DayOfMonth(day) => Some(*day),
            DayToken::Weekday(_) => None,
        }
    }
}

/// Parse a weekday name in English or Spanish, full or abbreviated.
pub fn parse_weekday(token: &str) -> Option<Weekday> {
    let weekday = match token.trim().to_lowercase().as_str() {
        "mon" | "monday" | "lun" | "lunes" => Weekday::Mon,
        "tue" | "tues" | "tuesday" | "mar" | "martes" => Weekday::Tue,
        "wed" | "wednesday" | "mie" | "mié" | "miercoles" | "miércoles" => Weekday::Wed,
        "thu" | "thurs" | "thursday" | "jue" | "jueves" => Weekday::Thu,
        "fri" | "friday" | "vie" | "viernes" => Weekday::Fri,
        "sat" | "saturday" | "sab" | "sáb" | "sabado" | "sábado" => Weekday::Sat,
        "sun" | "sunday" | "dom" | "domingo" => Weekday::Sun,
        _ => return None,
    };
    Some(weekday)
}

/// Parse a day-of-month number in 1..=31.
pub fn parse_day_of_month(token: &str) -> Option<u32> {
    token
        .trim()
        .parse::<u32>()
        .ok()
        .filter(|day| (1..=31).contains(day))
}

fn resolve_one(frequency: &Frequency, token: &str) -> Option<Option<DayToken>> {
    match frequency {
        Frequency::Weekly => Some(parse_weekday(token).map(DayToken::Weekday)),
        Frequency::Monthly => Some(parse_day_of_month(token).map(DayToken::DayOfMonth)),
        Frequency::Daily | Frequency::Other(_) => None,
    }
}

/// Resolve raw tokens, failing on the first one that does not fit the
/// frequency. Daily and unrecognized frequencies resolve to nothing.
pub fn resolve_days(frequency: &Frequency, raw: &[String]) -> Result<Vec<DayToken>> {
    let mut resolved = Vec::with_capacity(raw.len());
    for token in raw {
        match resolve_one(frequency, token) {
            None => return Ok(Vec::new()),
            Some(Some(day)) => resolved.push(day),
            Some(None) => {
                return Err(CoreError::InvalidDayToken {
                    token: token.clone(),
                    frequency: frequency.to_string(),
                })
            }
        }
    }
    Ok(resolved)
}

/// Resolve raw tokens, skipping any that do not fit the frequency.
pub fn resolve_days_lenient(frequency: &Frequency, raw: &[String]) -> Vec<DayToken> {
    raw.iter()
        .filter_map(|token| resolve_one(frequency, token).flatten())
        .collect()
}

/// Deserialize configured days, accepting numbers as well as strings.
pub fn deserialize_day_tokens<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawToken {
        Text(String),
        Number(i64),
    }

    let raw = Option::<Vec<RawToken>>::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .map(|token| match token {
            RawToken::Text(text) => text,
            RawToken::Number(number) => number.to_string(),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_frequency_parse_names() {
        assert_eq!(Frequency::parse("Diario"), Frequency::Daily);
        assert_eq!(Frequency::parse("diaria"), Frequency::Daily);
        assert_eq!(Frequency::parse("SEMANAL"), Frequency::Weekly);
        assert_eq!(Frequency::parse("monthly"), Frequency::Monthly);
        assert_eq!(
            Frequency::parse("Quincenal"),
            Frequency::Other("Quincenal".to_string())
        );
    }

    #[test]
    fn test_frequency_serde_keeps_unknown_verbatim() {
        let json = serde_json::to_string(&Frequency::Other("Quincenal".into())).unwrap();
        assert_eq!(json, "\"Quincenal\"");
        let back: Frequency = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Frequency::Other("Quincenal".into()));

        let daily: Frequency = serde_json::from_str("\"Diario\"").unwrap();
        assert_eq!(daily, Frequency::Daily);
    }

    #[test]
    fn test_parse_weekday_both_languages() {
        assert_eq!(parse_weekday("Mon"), Some(Weekday::Mon));
        assert_eq!(parse_weekday("miércoles"), Some(Weekday::Wed));
        assert_eq!(parse_weekday("vie"), Some(Weekday::Fri));
        assert_eq!(parse_weekday("15"), None);
    }

    #[test]
    fn test_resolve_weekly_strict() {
        let days = resolve_days(&Frequency::Weekly, &tokens(&["Mon", "Wed", "Fri"])).unwrap();
        assert_eq!(
            days,
            vec![
                DayToken::Weekday(Weekday::Mon),
                DayToken::Weekday(Weekday::Wed),
                DayToken::Weekday(Weekday::Fri),
            ]
        );

        let err = resolve_days(&Frequency::Weekly, &tokens(&["Mon", "5"])).unwrap_err();
        assert!(matches!(err, CoreError::InvalidDayToken { ref token, .. } if token == "5"));
    }

    #[test]
    fn test_resolve_monthly_strict_rejects_out_of_range() {
        assert!(resolve_days(&Frequency::Monthly, &tokens(&["5", "15", "25"])).is_ok());
        assert!(resolve_days(&Frequency::Monthly, &tokens(&["0"])).is_err());
        assert!(resolve_days(&Frequency::Monthly, &tokens(&["32"])).is_err());
        assert!(resolve_days(&Frequency::Monthly, &tokens(&["Mon"])).is_err());
    }

    #[test]
    fn test_resolve_daily_ignores_tokens() {
        let days = resolve_days(&Frequency::Daily, &tokens(&["whatever", "7"])).unwrap();
        assert!(days.is_empty());
    }

    #[test]
    fn test_resolve_lenient_skips_bad_tokens() {
        let days = resolve_days_lenient(&Frequency::Monthly, &tokens(&["5", "x", "40", "31"]));
        assert_eq!(days, vec![DayToken::DayOfMonth(5), DayToken::DayOfMonth(31)]);
    }

    #[test]
    fn test_deserialize_mixed_tokens() {
        #[derive(Deserialize)]
        struct Wrapper {
            #[serde(deserialize_with = "deserialize_day_tokens")]
            days: Vec<String>,
        }

        let w: Wrapper = serde_json::from_str(r#"{"days": [5, "15", 25]}"#).unwrap();
        assert_eq!(w.days, tokens(&["5", "15", "25"]));

        let w: Wrapper = serde_json::from_str(r#"{"days": null}"#).unwrap();
        assert!(w.days.is_empty());
    }
}
