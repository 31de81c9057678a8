use crate::error::{KioskError, Result};
use crate::resource::Attributes;
use regex::Regex;
use std::collections::HashMap;

/// Shape matched by a token when no override pattern is given.
pub const DEFAULT_TOKEN_PATTERN: &str = r"[^/?]+";

/// A compiled path template.
///
/// Templates mix regular-expression text with two kinds of named tokens:
///
/// - `:name` captures the matched segment under `name`
/// - `!name` matches the same shape but is not captured; it exists purely for
///   readability of the template
///
/// ```
/// use kiosk::uri::PathPattern;
/// use std::collections::HashMap;
///
/// let pattern = PathPattern::compile("some/!word/:type/:id", &HashMap::new()).unwrap();
/// let captures = pattern.captures("some/blarby/post/123").unwrap();
/// assert_eq!(captures.get("type").map(String::as_str), Some("post"));
/// assert!(!captures.contains_key("word"));
/// ```
#[derive(Debug, Clone)]
pub struct PathPattern {
	/// The template as written.
	pub source: String,

	/// Compiled expression, anchored at the start of the path.
	regex: Regex,

	/// Capture names in emission order.
	names: Vec<String>,
}

impl PathPattern {
	/// Compile a template, using `overrides` for tokens that need a shape
	/// other than [`DEFAULT_TOKEN_PATTERN`].
	pub fn compile(pattern: &str, overrides: &HashMap<String, String>) -> Result<Self> {
		for (name, shape) in overrides {
			Regex::new(shape).map_err(|source| KioskError::InvalidPattern {
				pattern: format!("{}={}", name, shape),
				source,
			})?;
		}

		let mut expression = String::from("^(?:");
		let mut names = Vec::new();
		let mut rest = pattern;

		while let Some(start) = rest.find(['!', ':']) {
			let sigil = rest.as_bytes()[start];
			let tail = &rest[start + 1..];
			let len = tail
				.find(|c: char| !(c.is_alphanumeric() || c == '_'))
				.unwrap_or(tail.len());

			if len == 0 {
				// A bare sigil is literal text.
				expression.push_str(&rest[..=start]);
				rest = tail;
				continue;
			}

			let name = &tail[..len];
			let shape = overrides
				.get(name)
				.map(String::as_str)
				.unwrap_or(DEFAULT_TOKEN_PATTERN);

			expression.push_str(&rest[..start]);
			if sigil == b':' {
				expression.push_str(&format!("(?P<{}>(?:{}))", group_name(names.len()), shape));
				names.push(name.to_string());
			} else {
				expression.push_str(&format!("(?:{})", shape));
			}

			rest = &tail[len..];
		}

		expression.push_str(rest);
		expression.push(')');

		let regex = Regex::new(&expression).map_err(|source| KioskError::InvalidPattern {
			pattern: pattern.to_string(),
			source,
		})?;

		Ok(PathPattern {
			source: pattern.to_string(),
			regex,
			names,
		})
	}

	/// Match the start of `path`, returning the captured tokens.
	///
	/// Trailing content after the template is allowed.
	pub fn captures(&self, path: &str) -> Option<Attributes> {
		let captures = self.regex.captures(path)?;

		// Later duplicates overwrite earlier ones.
		let mut attributes = Attributes::new();
		for (i, name) in self.names.iter().enumerate() {
			if let Some(value) = captures.name(&group_name(i)) {
				attributes.insert(name.clone(), value.as_str().to_string());
			}
		}

		Some(attributes)
	}

	/// Names of the capture tokens in the order they appear.
	pub fn names(&self) -> &[String] {
		&self.names
	}
}

/// Group name of the `index`th capture token.
fn group_name(index: usize) -> String {
	format!("kiosk{}", index)
}
