//! Equality join of two tuple iterators on one field each. Grounded on
//! `sql/executor/join.rs`'s join shape, generalized off SQL-plan-
//! specific types and rebuilt as a plain iterator adaptor.
//!
//! The right-hand iterator is fully materialized into a hash map keyed
//! by its join field (the "build" side); the left-hand iterator is
//! then streamed and probed against it (the "probe" side). A real
//! optimizer would pick whichever side is smaller as the build side —
//! this engine has no cardinality estimates to make that call, so it
//! always builds on the right, the same simplification the teacher's
//! SQL executor makes.

use std::collections::HashMap;

use crate::{cell::Cell, tuple::Tuple};

pub struct HashJoin<L: Iterator<Item = Tuple>> {
    left: L,
    left_field: usize,
    right_field: usize,
    build: HashMap<Cell, Vec<Tuple>>,
    current_left: Option<Tuple>,
    current_matches: std::vec::IntoIter<Tuple>,
}

impl<L: Iterator<Item = Tuple>> HashJoin<L> {
    pub fn new<R: Iterator<Item = Tuple>>(
        left: L,
        left_field: usize,
        right: R,
        right_field: usize,
    ) -> Self {
        let mut build: HashMap<Cell, Vec<Tuple>> = HashMap::new();
        for tuple in right {
            let key = tuple.get_cell(right_field).clone();
            build.entry(key).or_default().push(tuple);
        }

        HashJoin {
            left,
            left_field,
            right_field,
            build,
            current_left: None,
            current_matches: Vec::new().into_iter(),
        }
    }

    fn joined(&self, left: &Tuple, right: &Tuple) -> Tuple {
        let mut cells: Vec<Cell> = left.cells().to_vec();
        cells.extend(right.cells().iter().cloned());
        // the joined schema has no name for its own fields beyond the
        // concatenation, since `Schema` has no "qualified by source
        // table" notion in this engine — callers that need that
        // project the two halves back out by known offsets.
        let mut fields = left.schema.fields.clone();
        fields.extend(right.schema.fields.clone());
        Tuple::new(std::sync::Arc::new(crate::schema::Schema::new(fields)), cells)
    }
}

impl<L: Iterator<Item = Tuple>> Iterator for HashJoin<L> {
    type Item = Tuple;

    fn next(&mut self) -> Option<Tuple> {
        loop {
            if let Some(right) = self.current_matches.next() {
                let left = self.current_left.as_ref().expect("set alongside current_matches");
                return Some(self.joined(left, &right));
            }

            let left = self.left.next()?;
            let key = left.get_cell(self.left_field).clone();
            let matches = self.build.get(&key).cloned().unwrap_or_default();
            self.current_left = Some(left);
            self.current_matches = matches.into_iter();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        field::{Field, Type},
        schema::Schema,
    };
    use std::sync::Arc;

    fn row(v: i64) -> Tuple {
        let schema = Arc::new(Schema::new(vec![Field::new("a", Type::Int64)]));
        Tuple::new(schema, vec![Cell::Int64(v)])
    }

    #[test]
    fn matches_equal_keys() {
        let left = vec![row(1), row(2), row(3)];
        let right = vec![row(2), row(3), row(4)];
        let joined: Vec<_> = HashJoin::new(left.into_iter(), 0, right.into_iter(), 0).collect();
        assert_eq!(joined.len(), 2);
        for t in &joined {
            assert_eq!(t.get_cell(0), t.get_cell(1));
        }
    }

    #[test]
    fn no_match_produces_nothing() {
        let left = vec![row(1)];
        let right = vec![row(2)];
        let joined: Vec<_> = HashJoin::new(left.into_iter(), 0, right.into_iter(), 0).collect();
        assert!(joined.is_empty());
    }
}
