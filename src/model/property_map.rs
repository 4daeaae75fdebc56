//! PropertyMap: the key-value store on nodes and relationships.

use std::collections::HashMap;
use super::Value;

/// A map of property names to values.
pub type PropertyMap = HashMap<String, Value>;

/// Build a PropertyMap from `(key, value)` pairs.
///
/// ```
/// use simgraph::model::{props, Value};
/// let p = props([("name", Value::from("linear")), ("uid", Value::from(3))]);
/// assert_eq!(p.len(), 2);
/// ```
pub fn props<K, V, I>(pairs: I) -> PropertyMap
where
    K: Into<String>,
    V: Into<Value>,
    I: IntoIterator<Item = (K, V)>,
{
    pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect()
}
