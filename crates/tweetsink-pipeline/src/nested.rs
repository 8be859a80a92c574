//! Arbitrarily nested lists of values and their flattening.

use serde_json::Value;

use crate::row::RawPost;

/// A value, or a list of further nested values, to any depth.
#[derive(Debug, Clone, PartialEq)]
pub enum Nested<T> {
    Leaf(T),
    Many(Vec<Nested<T>>),
}

impl<T> Nested<T> {
    /// All leaves in depth-first order, regardless of nesting depth.
    #[must_use]
    pub fn flatten(self) -> Vec<T> {
        let mut out = Vec::new();
        self.flatten_into(&mut out);
        out
    }

    fn flatten_into(self, out: &mut Vec<T>) {
        match self {
            Nested::Leaf(value) => out.push(value),
            Nested::Many(items) => {
                for item in items {
                    item.flatten_into(out);
                }
            }
        }
    }
}

impl<T> Default for Nested<T> {
    fn default() -> Self {
        Nested::Many(Vec::new())
    }
}

/// JSON arrays become nesting levels; every other value is a post.
impl From<Value> for Nested<RawPost> {
    fn from(value: Value) -> Self {
        match value {
            Value::Array(items) => Nested::Many(items.into_iter().map(Nested::from).collect()),
            other => Nested::Leaf(RawPost(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn flatten_handles_mixed_depths() {
        let nested = Nested::Many(vec![
            Nested::Leaf(1),
            Nested::Many(vec![Nested::Leaf(2), Nested::Many(vec![Nested::Leaf(3)])]),
            Nested::Many(vec![]),
            Nested::Many(vec![Nested::Many(vec![Nested::Many(vec![Nested::Leaf(4)])])]),
        ]);
        assert_eq!(nested.flatten(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn empty_nesting_flattens_to_nothing() {
        let nested: Nested<u8> = Nested::default();
        assert!(nested.flatten().is_empty());
    }

    #[test]
    fn json_arrays_become_levels() {
        let nested = Nested::<RawPost>::from(json!([[{"id_str": "1"}], [[{"id_str": "2"}]], []]));
        let ids: Vec<_> = nested
            .flatten()
            .into_iter()
            .map(|p| p.0["id_str"].clone())
            .collect();
        assert_eq!(ids, vec![json!("1"), json!("2")]);
    }

    #[test]
    fn bare_object_is_a_single_post() {
        let nested = Nested::<RawPost>::from(json!({"id_str": "9"}));
        assert_eq!(nested.flatten().len(), 1);
    }
}
