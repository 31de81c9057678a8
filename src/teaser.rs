//! Content teasers: truncated, re-balanced excerpts of origin markup.

use crate::document::{Document, ParseMode};

const OMISSION: &str = "...";

/// Allowance subtracted from the horizon for the teaser's own chrome.
const HORIZON_ALLOWANCE: usize = 18;

/// Shortest teaser ever produced, in characters.
const MIN_LENGTH: usize = 36;

/// A teaser of `content` of roughly `horizon` characters.
///
/// The markup is cut to `max(horizon - 18, 36)` characters, `...` included,
/// then parsed and re-serialized so that open elements are closed. The cut
/// ignores markup, so the visible text may be shorter than the horizon.
pub fn teaser(content: &str, horizon: usize) -> String {
	let length = horizon.saturating_sub(HORIZON_ALLOWANCE).max(MIN_LENGTH);
	let truncated = truncate(content, length);

	Document::parse_with_mode(&truncated, ParseMode::Fragment).serialize()
}

/// Cut `text` to at most `length` characters, ending in `...` when cut.
fn truncate(text: &str, length: usize) -> String {
	if text.chars().count() <= length {
		return text.to_string();
	}

	let keep = length.saturating_sub(OMISSION.len());
	let mut truncated: String = text.chars().take(keep).collect();
	truncated.push_str(OMISSION);
	truncated
}
