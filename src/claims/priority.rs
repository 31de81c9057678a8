use crate::error::{KioskError, Result};
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// Order in which claims are staked. Lower values go first.
///
/// Priorities may be named (`high`, `normal`, `low`) or given as any integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Deserialize)]
#[serde(try_from = "PriorityValue")]
pub struct Priority(i32);

impl Priority {
	pub const HIGH: Priority = Priority(-9);
	pub const NORMAL: Priority = Priority(0);
	pub const LOW: Priority = Priority(9);

	pub const fn new(value: i32) -> Self {
		Priority(value)
	}

	pub const fn value(self) -> i32 {
		self.0
	}

	/// Look up a named priority.
	pub fn from_name(name: &str) -> Option<Self> {
		match name {
			"high" => Some(Priority::HIGH),
			"normal" => Some(Priority::NORMAL),
			"low" => Some(Priority::LOW),
			_ => None,
		}
	}
}

impl From<i32> for Priority {
	fn from(value: i32) -> Self {
		Priority(value)
	}
}

impl FromStr for Priority {
	type Err = KioskError;

	fn from_str(s: &str) -> Result<Self> {
		let s = s.trim();
		Priority::from_name(s)
			.or_else(|| s.parse().ok().map(Priority))
			.ok_or_else(|| KioskError::InvalidPriority {
				value: s.to_string(),
			})
	}
}

impl fmt::Display for Priority {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

/// A priority as written in configuration.
#[derive(Deserialize)]
#[serde(untagged)]
enum PriorityValue {
	Value(i32),
	Name(String),
}

impl TryFrom<PriorityValue> for Priority {
	type Error = KioskError;

	fn try_from(value: PriorityValue) -> Result<Self> {
		match value {
			PriorityValue::Value(value) => Ok(Priority(value)),
			PriorityValue::Name(name) => name.parse(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_named_priorities() {
		assert_eq!("high".parse::<Priority>().unwrap().value(), -9);
		assert_eq!("normal".parse::<Priority>().unwrap().value(), 0);
		assert_eq!("low".parse::<Priority>().unwrap().value(), 9);
	}

	#[test]
	fn test_numeric_priorities() {
		assert_eq!("-3".parse::<Priority>().unwrap(), Priority::new(-3));
		assert_eq!(Priority::from(4).value(), 4);
	}

	#[test]
	fn test_default_is_normal() {
		assert_eq!(Priority::default(), Priority::NORMAL);
	}

	#[test]
	fn test_ordering() {
		assert!(Priority::HIGH < Priority::NORMAL);
		assert!(Priority::NORMAL < Priority::LOW);
	}

	#[test]
	fn test_invalid_priority() {
		match "urgent".parse::<Priority>().unwrap_err() {
			KioskError::InvalidPriority { value } => assert_eq!(value, "urgent"),
			_ => panic!("Expected InvalidPriority error"),
		}
	}
}
