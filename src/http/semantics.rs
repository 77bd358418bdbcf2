//! `Cache-Control` interpretation and the cache-duration arbiter.

/// Extract the `max-age` value from a `Cache-Control` header.
///
/// Directives are comma-separated with surrounding whitespace ignored; the first `max-age`
/// directive decides the result. An absent header, an absent directive, or an unparseable value
/// all yield 0.
pub fn parse_max_age(header: Option<&str>) -> u64 {
	let Some(header) = header else { return 0 };

	for directive in header.split(',') {
		let Some((name, value)) = directive.split_once('=') else { continue };

		if name.trim().eq_ignore_ascii_case("max-age") {
			return value.trim().parse().unwrap_or(0);
		}
	}

	0
}

/// Choose the client-facing cache duration from the upstream suggestion and the operator-chosen
/// value.
///
/// An upstream that rotates faster than the operator assumed wins; a laxer upstream suggestion
/// is capped at the configured duration. No suggestion means the configured duration applies.
pub fn effective_cache_duration(idp_suggested: u64, configured: u64) -> u64 {
	if idp_suggested == 0 { configured } else { idp_suggested.min(configured) }
}
