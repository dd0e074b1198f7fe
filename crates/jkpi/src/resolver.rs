// ai
//! 🔍 The Key Resolver: schema-free spelunking through nested records.
//!
//! 🎬 *[a user id is hiding somewhere in a 400-line JSON blob]*
//! *[it could be at the top. it could be three maps deep inside "fields".]*
//! *[it could be in an array of comments nobody asked for.]*
//! *["I'll find you," whispered the resolver. And it did. Depth-first.]*
//!
//! 🧠 Knowledge graph:
//! - Depth-first walk over `Value`: maps, sequences, scalars.
//! - A direct key on the current map wins over anything nested, even if the nested
//!   hit sits inside a value that comes earlier in iteration order.
//! - Otherwise values are visited in insertion order; first hit wins.
//! - A key bound to `null` counts as "nothing here", and the search carries on in
//!   the parent's remaining siblings.
//! - Absence is `None`. Never an error. Missing fields are a Tuesday, not an incident.
//!
//! 🦆 (the duck was found at depth 3, under "fields". it was not looking to be found.)

use serde_json::Value;

use crate::common::{UserId, scalar_token};

/// 🔍 Find the first value bound to `key`, depth-first.
///
/// Returns `None` when the key is absent everywhere, or only ever bound to `null`.
pub fn find_key<'a>(node: &'a Value, key: &str) -> Option<&'a Value> {
    match node {
        Value::Object(map) => {
            // -- 🎯 direct hit: no descending into this map, whatever it holds
            if let Some(hit) = map.get(key) {
                return if hit.is_null() { None } else { Some(hit) };
            }
            map.values()
                .filter(|value| value.is_object() || value.is_array())
                .find_map(|value| find_key(value, key))
        }
        Value::Array(items) => items.iter().find_map(|item| find_key(item, key)),
        _ => None,
    }
}

/// 🧵 [`find_key`], then render the hit as a text token (strings verbatim, numbers as JSON).
pub fn find_token(node: &Value, key: &str) -> Option<String> {
    find_key(node, key).and_then(scalar_token)
}

/// 🔑 [`find_key`], then interpret the hit as a [`UserId`].
pub fn find_user_id(node: &Value, key: &str) -> Option<UserId> {
    find_key(node, key).and_then(UserId::from_value)
}
