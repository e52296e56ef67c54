//! Turns heterogeneous tabular payloads into canonical points.
//!
//! API responses and CSV files both arrive here as a [`RawTable`]; column
//! roles are resolved through the tables in [`mapping`], cells are coerced
//! through [`coerce`], and the result is keyed, deduplicated and tagged with
//! its symbol.

pub mod coerce;
pub mod mapping;
mod prices;
mod macro_series;
pub mod table;

pub use macro_series::normalize_macro;
pub use prices::normalize_prices;
pub use table::RawTable;

use std::collections::HashMap;
use std::hash::Hash;

/// Collapses repeated keys to their last occurrence, keeping first-seen order.
pub fn dedupe_keep_last<T, K, F>(items: Vec<T>, key: F) -> Vec<T>
where
    K: Eq + Hash,
    F: Fn(&T) -> K,
{
    let mut slots: HashMap<K, usize> = HashMap::with_capacity(items.len());
    let mut out: Vec<T> = Vec::with_capacity(items.len());

    for item in items {
        let k = key(&item);
        if let Some(&idx) = slots.get(&k) {
            out[idx] = item;
        } else {
            slots.insert(k, out.len());
            out.push(item);
        }
    }

    out
}
