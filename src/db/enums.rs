use serde::{Deserialize, Serialize};

/// Lookback window for the provider's "top" endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeRange {
    ShortTerm,
    MediumTerm,
    LongTerm,
}

impl TimeRange {
    pub const ALL: [TimeRange; 3] = [Self::ShortTerm, Self::MediumTerm, Self::LongTerm];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ShortTerm => "short_term",
            Self::MediumTerm => "medium_term",
            Self::LongTerm => "long_term",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "short_term" => Some(Self::ShortTerm),
            "medium_term" => Some(Self::MediumTerm),
            "long_term" => Some(Self::LongTerm),
            _ => None,
        }
    }

    /// Human-facing window label used for generated playlist names.
    pub fn label(&self) -> &'static str {
        match self {
            Self::ShortTerm => "Son 4 Hafta",
            Self::MediumTerm => "Son 6 Ay",
            Self::LongTerm => "Tüm Zamanlar",
        }
    }
}

impl From<TimeRange> for String {
    fn from(range: TimeRange) -> String {
        range.as_str().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_range_round_trip() {
        for range in TimeRange::ALL {
            assert_eq!(TimeRange::from_str(range.as_str()), Some(range));
        }
        assert_eq!(TimeRange::from_str("last_week"), None);
    }
}
