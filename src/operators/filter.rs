//! Wraps any tuple iterator and keeps only the rows whose predicate
//! field matches. Grounded on the teacher's `predicate.rs`/`Filter`
//! pairing (`Predicate::matches` driving a plain iterator adaptor).

use crate::{operators::predicate::Predicate, tuple::Tuple};

pub struct Filter<I> {
    input: I,
    predicate: Predicate,
}

impl<I: Iterator<Item = Tuple>> Filter<I> {
    pub fn new(input: I, predicate: Predicate) -> Self {
        Filter { input, predicate }
    }
}

impl<I: Iterator<Item = Tuple>> Iterator for Filter<I> {
    type Item = Tuple;

    fn next(&mut self) -> Option<Tuple> {
        for tuple in self.input.by_ref() {
            let cell = tuple.get_cell(self.predicate.field_index);
            if self.predicate.matches(cell) {
                return Some(tuple);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        cell::Cell,
        field::{Field, Type},
        operators::predicate::Op,
        schema::Schema,
    };
    use std::sync::Arc;

    fn row(v: i64) -> Tuple {
        let schema = Arc::new(Schema::new(vec![Field::new("a", Type::Int64)]));
        Tuple::new(schema, vec![Cell::Int64(v)])
    }

    #[test]
    fn keeps_only_matching_rows() {
        let rows = vec![row(1), row(2), row(3)];
        let predicate = Predicate::new(0, Op::GreaterThan, Cell::Int64(1));
        let filtered: Vec<_> = Filter::new(rows.into_iter(), predicate).collect();
        assert_eq!(filtered.len(), 2);
    }
}
