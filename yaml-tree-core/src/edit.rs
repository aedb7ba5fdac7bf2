//! Field and element editing on [`Node`] trees.
//!
//! Mapping lookups assume the caller already checked the node kind: calling
//! them on anything but a mapping is a programming error and panics. Sequence
//! appends report a wrong node kind as a [`TreeError`] instead, because the
//! operand usually comes from input data.

use crate::tree::{Node, TreeError};

impl Node {
    fn pairs(&self) -> &Vec<(String, Node)> {
        match self {
            Node::Mapping(pairs) => pairs,
            other => panic!("target is not a mapping node, found {}", other.kind()),
        }
    }

    fn pairs_mut(&mut self) -> &mut Vec<(String, Node)> {
        match self {
            Node::Mapping(pairs) => pairs,
            other => panic!("target is not a mapping node, found {}", other.kind()),
        }
    }

    /// Return the pair index of `key`, or `None` if the key is not present.
    ///
    /// # Panics
    ///
    /// Panics if `self` is not a mapping.
    pub fn find_key_index(&self, key: &str) -> Option<usize> {
        self.pairs().iter().position(|(k, _)| k == key)
    }

    /// Return the pair index holding the value of `key`.
    ///
    /// Pairs store key and value together, so this addresses the same slot as
    /// [`Node::find_key_index`].
    ///
    /// # Panics
    ///
    /// Panics if `self` is not a mapping.
    pub fn find_value_index(&self, key: &str) -> Option<usize> {
        self.find_key_index(key)
    }

    /// Return the value stored under `key`.
    ///
    /// # Panics
    ///
    /// Panics if `self` is not a mapping.
    pub fn get_field(&self, key: &str) -> Option<&Node> {
        self.pairs()
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, value)| value)
    }

    /// Mutable variant of [`Node::get_field`].
    pub fn get_field_mut(&mut self, key: &str) -> Option<&mut Node> {
        self.pairs_mut()
            .iter_mut()
            .find(|(k, _)| k == key)
            .map(|(_, value)| value)
    }

    /// Set, overwrite or remove a field.
    ///
    /// A new key is appended at the end, an existing key keeps its position.
    /// Passing `None` removes the key if it exists, otherwise does nothing.
    ///
    /// # Panics
    ///
    /// Panics if `self` is not a mapping.
    pub fn set_field(&mut self, key: &str, value: Option<Node>) {
        match (self.find_key_index(key), value) {
            (Some(idx), Some(value)) => self.pairs_mut()[idx].1 = value,
            (Some(idx), None) => self.remove_field_at(idx),
            (None, Some(value)) => self.pairs_mut().push((key.to_string(), value)),
            (None, None) => {}
        }
    }

    /// Remove `key` and its value if present.
    pub fn remove_field(&mut self, key: &str) {
        if let Some(idx) = self.find_key_index(key) {
            self.remove_field_at(idx);
        }
    }

    /// Remove the pair at `idx`.
    ///
    /// # Panics
    ///
    /// Panics if `self` is not a mapping or `idx` is out of bounds.
    pub fn remove_field_at(&mut self, idx: usize) {
        let pairs = self.pairs_mut();
        if idx >= pairs.len() {
            panic!("pair index {idx} out of bounds ({} pairs)", pairs.len());
        }
        pairs.remove(idx);
    }

    /// Append `values` to the end of a sequence.
    ///
    /// Either every value is appended or, on error, the sequence is left
    /// untouched.
    pub fn append<I>(&mut self, values: I) -> Result<(), TreeError>
    where
        I: IntoIterator<Item = Option<Node>>,
    {
        let found = self.kind();
        let Node::Sequence(items) = self else {
            return Err(TreeError::NotASequence { found });
        };

        let mut staged = Vec::new();
        for (index, value) in values.into_iter().enumerate() {
            match value {
                Some(node) => staged.push(node),
                None => return Err(TreeError::NilElement { index }),
            }
        }
        items.extend(staged);
        Ok(())
    }

    /// Append an optional list of values. `None` and empty lists are no-ops.
    pub fn append_slice(&mut self, values: Option<Vec<Option<Node>>>) -> Result<(), TreeError> {
        if !self.is_sequence() {
            return Err(TreeError::NotASequence { found: self.kind() });
        }
        match values {
            Some(values) => self.append(values),
            None => Ok(()),
        }
    }
}
