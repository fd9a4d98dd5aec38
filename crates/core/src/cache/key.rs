//! Cache key derivation for measure rows.
//!
//! Keys have the form `{country}-{channel}-{impressions}-{inventoryId}`.
//! Country and channel escape `\` and `-` with a backslash so a dash inside
//! either field can never move a field boundary. Impressions is an integer and
//! the inventory id is the tail, so neither needs escaping.

use crate::model::{RequestRow, ResolveRow};

/// Derive the cache key for a request row.
///
/// `utc_datetime` and `is_priority` do not take part in the key.
pub fn derive_key(row: &RequestRow) -> String {
    compute_cache_key(&row.country, &row.channel, row.impressions, &row.inventory_id)
}

/// Derive the cache key for a row that was sent to the resolver.
pub fn resolve_row_key(row: &ResolveRow) -> String {
    compute_cache_key(&row.country, &row.channel, row.impressions, &row.inventory_id)
}

/// Compute a cache key from the four identifying fields.
pub fn compute_cache_key(country: &str, channel: &str, impressions: i64, inventory_id: &str) -> String {
    let mut key = String::with_capacity(country.len() + channel.len() + inventory_id.len() + 24);
    push_escaped(&mut key, country);
    key.push('-');
    push_escaped(&mut key, channel);
    key.push('-');
    key.push_str(&impressions.to_string());
    key.push('-');
    key.push_str(inventory_id);
    key
}

fn push_escaped(out: &mut String, field: &str) {
    for c in field.chars() {
        if c == '\\' || c == '-' {
            out.push('\\');
        }
        out.push(c);
    }
}
