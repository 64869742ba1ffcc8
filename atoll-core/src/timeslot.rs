use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::CoreError;

/// Closed set of departure slots a route can be offered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TimeSlot {
    #[serde(rename = "Early Morning")]
    EarlyMorning,
    Morning,
    Midday,
    Afternoon,
    Evening,
    Night,
}

impl TimeSlot {
    /// Global enumeration, in display order. Also the fallback for routes without usable timings.
    pub const ALL: [TimeSlot; 6] = [
        TimeSlot::EarlyMorning,
        TimeSlot::Morning,
        TimeSlot::Midday,
        TimeSlot::Afternoon,
        TimeSlot::Evening,
        TimeSlot::Night,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            TimeSlot::EarlyMorning => "Early Morning",
            TimeSlot::Morning => "Morning",
            TimeSlot::Midday => "Midday",
            TimeSlot::Afternoon => "Afternoon",
            TimeSlot::Evening => "Evening",
            TimeSlot::Night => "Night",
        }
    }

    /// Parses stored timing labels, dropping unknown ones.
    /// An empty result falls back to [`TimeSlot::ALL`].
    pub fn from_labels<I, S>(labels: I) -> Vec<TimeSlot>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut slots: Vec<TimeSlot> = Vec::new();
        for label in labels {
            match label.as_ref().parse::<TimeSlot>() {
                Ok(slot) if !slots.contains(&slot) => slots.push(slot),
                Ok(_) => {}
                Err(_) => tracing::debug!("Dropping unknown timing label {:?}", label.as_ref()),
            }
        }

        if slots.is_empty() {
            TimeSlot::ALL.to_vec()
        } else {
            slots
        }
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TimeSlot {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        TimeSlot::ALL
            .iter()
            .copied()
            .find(|slot| slot.label().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| CoreError::UnknownTimeSlot(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_labels() {
        assert_eq!("Morning".parse::<TimeSlot>().unwrap(), TimeSlot::Morning);
        assert_eq!(" early morning ".parse::<TimeSlot>().unwrap(), TimeSlot::EarlyMorning);
        assert!("Brunch".parse::<TimeSlot>().is_err());
    }

    #[test]
    fn test_from_labels_filters_unknown() {
        let slots = TimeSlot::from_labels(["Evening", "Brunch", "Morning", "Evening"]);
        assert_eq!(slots, vec![TimeSlot::Evening, TimeSlot::Morning]);
    }

    #[test]
    fn test_from_labels_falls_back_to_all() {
        let empty: Vec<String> = vec![];
        assert_eq!(TimeSlot::from_labels(empty), TimeSlot::ALL.to_vec());
        assert_eq!(TimeSlot::from_labels(["9:15"]), TimeSlot::ALL.to_vec());
    }

    #[test]
    fn test_serde_uses_labels() {
        assert_eq!(serde_json::to_string(&TimeSlot::EarlyMorning).unwrap(), "\"Early Morning\"");
        let slot: TimeSlot = serde_json::from_str("\"Midday\"").unwrap();
        assert_eq!(slot, TimeSlot::Midday);
    }
}
