//! JWKS data model with verbatim key passthrough.
//!
//! Upstream JWK documents are carried as opaque JSON objects: unknown members and member order
//! survive a round trip untouched. Only the `keys` array shape is enforced at parse time.

// crates.io
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single JSON Web Key, carried verbatim from the upstream document.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Jwk(
	/// Key members exactly as the upstream returned them.
	pub Map<String, Value>,
);
impl Jwk {
	/// Key type, when present as a string member.
	pub fn kty(&self) -> Option<&str> {
		self.0.get("kty").and_then(Value::as_str)
	}

	/// Key identifier, when present as a string member.
	pub fn kid(&self) -> Option<&str> {
		self.0.get("kid").and_then(Value::as_str)
	}

	/// Whether the key carries the mandatory `kty` member.
	pub fn has_kty(&self) -> bool {
		self.0.contains_key("kty")
	}
}

/// A JSON Web Key Set in upstream order.
///
/// Deserialization requires a `keys` array; a missing or `null` member fails the parse, so such
/// a document is recorded as a fetch error rather than published as an empty set.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct KeySet {
	/// Keys in the order the upstream returned them.
	pub keys: Vec<Jwk>,
}
impl KeySet {
	/// Number of keys in the set.
	pub fn len(&self) -> usize {
		self.keys.len()
	}

	/// Whether the set has no keys.
	pub fn is_empty(&self) -> bool {
		self.keys.is_empty()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn parse_preserves_unknown_members_and_order() {
		let raw = r#"{"keys":[{"use":"sig","kty":"RSA","kid":"a","x5c":["MIIB"],"vendor_hint":{"rotation":"weekly"}}]}"#;
		let keyset: KeySet = serde_json::from_str(raw).expect("keyset");

		assert_eq!(keyset.len(), 1);
		assert_eq!(keyset.keys[0].kty(), Some("RSA"));
		assert_eq!(keyset.keys[0].kid(), Some("a"));
		// Round trip must reproduce the document byte for byte, member order included.
		assert_eq!(serde_json::to_string(&keyset).expect("serialize"), raw);
	}

	#[test]
	fn missing_keys_member_fails_to_parse() {
		assert!(serde_json::from_str::<KeySet>(r#"{"kid":"a"}"#).is_err());
	}

	#[test]
	fn null_keys_member_fails_to_parse() {
		assert!(serde_json::from_str::<KeySet>(r#"{"keys":null}"#).is_err());
	}

	#[test]
	fn non_object_key_entry_fails_to_parse() {
		assert!(serde_json::from_str::<KeySet>(r#"{"keys":["not-a-key"]}"#).is_err());
	}

	#[test]
	fn keys_without_kty_are_parsed_but_flagged() {
		let keyset: KeySet =
			serde_json::from_str(r#"{"keys":[{"kid":"orphan"}]}"#).expect("keyset");

		assert!(!keyset.keys[0].has_kty());
		assert_eq!(keyset.keys[0].kid(), Some("orphan"));
	}
}
