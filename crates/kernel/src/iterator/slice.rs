//! An in-memory [`NamedReadCloserIterator`] over `(id, bytes)` pairs.
//!
//! Not part of the distilled `spec.md` contract, but every test and every
//! library consumer that doesn't want to write its own iterator needs at
//! least one concrete implementation — this is the smallest one.

use super::{NamedReadCloserIterator, ReadClose};
use crate::error::PolicyError;
use std::io::Cursor;

pub struct SliceIterator {
    items: std::vec::IntoIter<(String, Vec<u8>)>,
}

impl SliceIterator {
    pub fn new(items: impl IntoIterator<Item = (String, Vec<u8>)>) -> Self {
        Self {
            items: items.into_iter().collect::<Vec<_>>().into_iter(),
        }
    }
}

impl NamedReadCloserIterator for SliceIterator {
    fn has_next(&self) -> bool {
        self.items.len() > 0
    }

    fn next(&mut self) -> (String, Box<dyn ReadClose>) {
        let (id, bytes) = self.items.next().expect("next() called with has_next() == false");
        (id, Box::new(Cursor::new(bytes)))
    }

    fn error(&self) -> Option<&PolicyError> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drains_in_order() {
        let iter = SliceIterator::new(vec![
            ("a".to_string(), b"one".to_vec()),
            ("b".to_string(), b"two".to_vec()),
        ]);
        let drained = super::super::drain_named(iter, "test").unwrap();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].0, "a");
        assert_eq!(drained[0].1, b"one");
        assert_eq!(drained[1].0, "b");
    }
}
