use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Width of the buckets used for period aggregation.
///
/// Only calendar months and calendar years are supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    #[default]
    #[serde(alias = "M", alias = "m", alias = "month")]
    Monthly,
    #[serde(alias = "Y", alias = "y", alias = "year")]
    Yearly,
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Granularity::Monthly => write!(f, "monthly"),
            Granularity::Yearly => write!(f, "yearly"),
        }
    }
}

impl std::str::FromStr for Granularity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "m" | "month" | "monthly" => Ok(Granularity::Monthly),
            "y" | "year" | "yearly" => Ok(Granularity::Yearly),
            other => Err(format!("Unknown period granularity: '{other}' (expected M or Y)")),
        }
    }
}

/// A transaction date truncated to the start of its month or year.
///
/// Ordering is chronological by start date, so sorting keys of one granularity
/// yields calendar order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PeriodKey {
    start: NaiveDate,
    granularity: Granularity,
}

impl PeriodKey {
    pub fn containing(date: NaiveDate, granularity: Granularity) -> Self {
        let start = match granularity {
            Granularity::Monthly => date - Days::new(u64::from(date.day0())),
            Granularity::Yearly => date - Days::new(u64::from(date.ordinal0())),
        };
        PeriodKey { start, granularity }
    }

    pub fn start_date(self) -> NaiveDate {
        self.start
    }
}

impl fmt::Display for PeriodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.granularity {
            Granularity::Monthly => write!(f, "{}", self.start.format("%Y-%m")),
            Granularity::Yearly => write!(f, "{}", self.start.format("%Y")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn monthly_key_truncates_to_first_of_month() {
        let key = PeriodKey::containing(date(2024, 1, 15), Granularity::Monthly);
        assert_eq!(key.start_date(), date(2024, 1, 1));
        assert_eq!(key.to_string(), "2024-01");
    }

    #[test]
    fn yearly_key_truncates_to_new_year() {
        let key = PeriodKey::containing(date(2024, 8, 31), Granularity::Yearly);
        assert_eq!(key.start_date(), date(2024, 1, 1));
        assert_eq!(key.to_string(), "2024");
    }

    #[test]
    fn same_month_same_key() {
        let a = PeriodKey::containing(date(2024, 1, 15), Granularity::Monthly);
        let b = PeriodKey::containing(date(2024, 1, 20), Granularity::Monthly);
        assert_eq!(a, b);
    }

    #[test]
    fn truncation_is_idempotent() {
        let key = PeriodKey::containing(date(2023, 11, 30), Granularity::Monthly);
        let again = PeriodKey::containing(key.start_date(), Granularity::Monthly);
        assert_eq!(key, again);
    }

    #[test]
    fn keys_sort_chronologically() {
        let mut keys = vec![
            PeriodKey::containing(date(2024, 3, 1), Granularity::Monthly),
            PeriodKey::containing(date(2023, 12, 5), Granularity::Monthly),
            PeriodKey::containing(date(2024, 1, 9), Granularity::Monthly),
        ];
        keys.sort();
        let labels: Vec<String> = keys.iter().map(|k| k.to_string()).collect();
        assert_eq!(labels, ["2023-12", "2024-01", "2024-03"]);
    }

    #[test]
    fn granularity_from_str() {
        assert_eq!("M".parse::<Granularity>(), Ok(Granularity::Monthly));
        assert_eq!("yearly".parse::<Granularity>(), Ok(Granularity::Yearly));
        assert!("W".parse::<Granularity>().is_err());
    }
}
