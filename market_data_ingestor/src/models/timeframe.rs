//! Bar interval (amount × unit).
//!
//! Construction validates the amount against the unit using the widest rules
//! the supported vendors accept. Providers may still reject a valid
//! [`TimeFrame`] they cannot serve.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum TimeFrameError {
    #[error("Invalid amount for {:?}: {}", unit, message)]
    InvalidAmount {
        unit: TimeFrameUnit,
        message: String,
    },

    #[error("Invalid input: {}", message)]
    InvalidInput { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeFrameUnit {
    Minute,
    Hour,
    Day,
    Week,
    Month,
}

impl std::str::FromStr for TimeFrameUnit {
    type Err = TimeFrameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // "M" is month, "m" is minute
        if s.trim() == "M" {
            return Ok(TimeFrameUnit::Month);
        }
        match s.trim().to_lowercase().as_str() {
            "m" | "min" | "minute" => Ok(TimeFrameUnit::Minute),
            "h" | "hr" | "hour" => Ok(TimeFrameUnit::Hour),
            "d" | "day" => Ok(TimeFrameUnit::Day),
            "w" | "wk" | "week" => Ok(TimeFrameUnit::Week),
            "mo" | "month" => Ok(TimeFrameUnit::Month),
            _ => Err(TimeFrameError::InvalidInput {
                message: format!("Invalid timeframe unit: {s}"),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawTimeFrame")]
pub struct TimeFrame {
    pub amount: u32,
    pub unit: TimeFrameUnit,
}

#[derive(Deserialize)]
struct RawTimeFrame {
    amount: u32,
    unit: TimeFrameUnit,
}

impl TryFrom<RawTimeFrame> for TimeFrame {
    type Error = TimeFrameError;

    fn try_from(raw: RawTimeFrame) -> Result<Self, Self::Error> {
        TimeFrame::new(raw.amount, raw.unit)
    }
}

impl TimeFrame {
    pub fn new(amount: u32, unit: TimeFrameUnit) -> Result<Self, TimeFrameError> {
        Self::validate(amount, unit)?;
        Ok(Self { amount, unit })
    }

    /// One-minute bars.
    pub const fn minute() -> Self {
        Self {
            amount: 1,
            unit: TimeFrameUnit::Minute,
        }
    }

    pub fn minutes(amount: u32) -> Result<Self, TimeFrameError> {
        Self::new(amount, TimeFrameUnit::Minute)
    }

    pub fn hours(amount: u32) -> Result<Self, TimeFrameError> {
        Self::new(amount, TimeFrameUnit::Hour)
    }

    pub const fn day() -> Self {
        Self {
            amount: 1,
            unit: TimeFrameUnit::Day,
        }
    }

    fn validate(amount: u32, unit: TimeFrameUnit) -> Result<(), TimeFrameError> {
        match unit {
            TimeFrameUnit::Minute if !(1..=59).contains(&amount) => {
                Err(TimeFrameError::InvalidAmount {
                    unit,
                    message: "Minute units can only be used with amounts between 1-59.".into(),
                })
            }
            TimeFrameUnit::Hour if !(1..=23).contains(&amount) => {
                Err(TimeFrameError::InvalidAmount {
                    unit,
                    message: "Hour units can only be used with amounts 1-23".into(),
                })
            }
            TimeFrameUnit::Day | TimeFrameUnit::Week if amount != 1 => {
                Err(TimeFrameError::InvalidAmount {
                    unit,
                    message: "Day and Week units can only be used with amount 1".into(),
                })
            }
            TimeFrameUnit::Month if ![1, 2, 3, 6, 12].contains(&amount) => {
                Err(TimeFrameError::InvalidAmount {
                    unit,
                    message: "Month units can only be used with amount 1, 2, 3, 6 and 12".into(),
                })
            }
            _ => Ok(()),
        }
    }
}

impl Default for TimeFrame {
    fn default() -> Self {
        Self::minute()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod timeframe_creation_tests {
        use super::*;

        #[test]
        fn test_valid_minute_timeframe() {
            let tf = TimeFrame::new(5, TimeFrameUnit::Minute).unwrap();
            assert_eq!(tf.amount, 5);
            assert!(matches!(tf.unit, TimeFrameUnit::Minute));
        }

        #[test]
        fn test_valid_month_timeframes() {
            for amount in [1, 2, 3, 6, 12] {
                let tf = TimeFrame::new(amount, TimeFrameUnit::Month);
                assert!(tf.is_ok(), "Month with amount {} should be valid", amount);
            }
        }

        #[test]
        fn test_invalid_amounts() {
            assert!(TimeFrame::new(0, TimeFrameUnit::Minute).is_err());
            assert!(TimeFrame::new(60, TimeFrameUnit::Minute).is_err());
            assert!(TimeFrame::new(24, TimeFrameUnit::Hour).is_err());
            assert!(TimeFrame::new(2, TimeFrameUnit::Day).is_err());
            assert!(TimeFrame::new(2, TimeFrameUnit::Week).is_err());
            assert!(TimeFrame::new(4, TimeFrameUnit::Month).is_err());
        }

        #[test]
        fn test_error_messages() {
            match TimeFrame::new(60, TimeFrameUnit::Minute) {
                Err(TimeFrameError::InvalidAmount { unit, message }) => {
                    assert!(matches!(unit, TimeFrameUnit::Minute));
                    assert!(message.contains("Minute units"));
                }
                _ => panic!("Expected InvalidAmount error"),
            }
        }
    }

    mod parsing_tests {
        use super::*;

        #[test]
        fn unit_aliases() {
            assert_eq!("min".parse::<TimeFrameUnit>().unwrap(), TimeFrameUnit::Minute);
            assert_eq!("m".parse::<TimeFrameUnit>().unwrap(), TimeFrameUnit::Minute);
            assert_eq!("M".parse::<TimeFrameUnit>().unwrap(), TimeFrameUnit::Month);
            assert_eq!("Hour".parse::<TimeFrameUnit>().unwrap(), TimeFrameUnit::Hour);
            // only the single letter is case-sensitive
            assert_eq!("Month".parse::<TimeFrameUnit>().unwrap(), TimeFrameUnit::Month);
            assert_eq!("MONTH".parse::<TimeFrameUnit>().unwrap(), TimeFrameUnit::Month);
            assert_eq!("Mo".parse::<TimeFrameUnit>().unwrap(), TimeFrameUnit::Month);
            assert!("fortnight".parse::<TimeFrameUnit>().is_err());
        }

        #[test]
        fn deserialize_validates() {
            let ok: TimeFrame = serde_json::from_str(r#"{"amount":5,"unit":"minute"}"#).unwrap();
            assert_eq!(ok, TimeFrame::minutes(5).unwrap());

            let bad = serde_json::from_str::<TimeFrame>(r#"{"amount":90,"unit":"minute"}"#);
            assert!(bad.is_err());
        }
    }
}
