use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::MonitorError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Comparator {
    /// `spread > threshold`
    #[serde(rename = ">")]
    Above,
    /// `spread < threshold`
    #[serde(rename = "<")]
    Below,
}

impl Comparator {
    pub fn symbol(&self) -> char {
        match self {
            Comparator::Above => '>',
            Comparator::Below => '<',
        }
    }
}

/// User-configured alert trigger on the signed spread percent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertZone {
    pub comparator: Comparator,
    pub threshold: f64,
    /// Sound reference; the default sound is used when unset.
    pub sound: Option<String>,
    pub enabled: bool,
}

impl AlertZone {
    pub fn above(threshold: f64) -> Self {
        Self {
            comparator: Comparator::Above,
            threshold,
            sound: None,
            enabled: true,
        }
    }

    pub fn below(threshold: f64) -> Self {
        Self {
            comparator: Comparator::Below,
            ..Self::above(threshold)
        }
    }

    pub fn with_sound(mut self, sound: impl Into<String>) -> Self {
        self.sound = Some(sound.into());
        self
    }

    /// Strict comparison; NaN never matches.
    pub fn matches(&self, spread_percent: f64) -> bool {
        if !self.enabled {
            return false;
        }
        match self.comparator {
            Comparator::Above => spread_percent > self.threshold,
            Comparator::Below => spread_percent < self.threshold,
        }
    }
}

impl fmt::Display for AlertZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.comparator.symbol(), self.threshold)?;
        if let Some(sound) = &self.sound {
            write!(f, "@{sound}")?;
        }
        Ok(())
    }
}

/// Parses `">1.0"`, `"<-0.5"` or `">2@https://host/alarm.mp3"`.
impl FromStr for AlertZone {
    type Err = MonitorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || MonitorError::InvalidZone(s.to_string());
        let trimmed = s.trim();

        let (comparator, rest) = if let Some(rest) = trimmed.strip_prefix('>') {
            (Comparator::Above, rest)
        } else if let Some(rest) = trimmed.strip_prefix('<') {
            (Comparator::Below, rest)
        } else {
            return Err(invalid());
        };

        let (threshold, sound) = match rest.split_once('@') {
            Some((t, sound)) => (t, Some(sound.trim()).filter(|s| !s.is_empty())),
            None => (rest, None),
        };

        let threshold: f64 = threshold.trim().parse().map_err(|_| invalid())?;
        if !threshold.is_finite() {
            return Err(invalid());
        }

        Ok(Self {
            comparator,
            threshold,
            sound: sound.map(str::to_string),
            enabled: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comparisons_are_strict() {
        let above = AlertZone::above(1.0);
        assert!(above.matches(1.01));
        assert!(!above.matches(1.0));

        let below = AlertZone::below(-1.0);
        assert!(below.matches(-1.5));
        assert!(!below.matches(-1.0));
        assert!(!below.matches(0.0));
    }

    #[test]
    fn disabled_zone_never_matches() {
        let mut z = AlertZone::above(0.0);
        z.enabled = false;
        assert!(!z.matches(100.0));
    }

    #[test]
    fn non_finite_spreads_compare_per_ieee() {
        assert!(!AlertZone::above(1.0).matches(f64::NAN));
        assert!(!AlertZone::below(1.0).matches(f64::NAN));
        assert!(AlertZone::above(1.0).matches(f64::INFINITY));
        assert!(AlertZone::below(-1.0).matches(f64::NEG_INFINITY));
    }

    #[test]
    fn parses_cli_syntax() {
        let z: AlertZone = " >1.5 ".parse().unwrap();
        assert_eq!(z, AlertZone::above(1.5));

        let z: AlertZone = "<-0.75@alarm.example/beep.mp3".parse().unwrap();
        assert_eq!(z.comparator, Comparator::Below);
        assert_eq!(z.threshold, -0.75);
        assert_eq!(z.sound.as_deref(), Some("alarm.example/beep.mp3"));
        assert_eq!(z.to_string(), "<-0.75@alarm.example/beep.mp3");

        let z: AlertZone = ">2@".parse().unwrap();
        assert_eq!(z.sound, None);
    }

    #[test]
    fn rejects_malformed_zones() {
        for bad in ["1.0", "=1", ">", ">abc", "<NaN", ">inf"] {
            assert!(
                matches!(bad.parse::<AlertZone>(), Err(MonitorError::InvalidZone(_))),
                "{bad} should be rejected"
            );
        }
    }
}
