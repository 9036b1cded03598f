//! Single-field comparison, applied by [`super::filter::Filter`].
//! Grounded on the teacher's `predicate.rs`/`operator.rs` (`Op`,
//! `Predicate::matches`), widened from the teacher's single hardcoded
//! `IntCell` field to the crate's closed [`crate::cell::Cell`] set.

use std::fmt;

use crate::cell::Cell;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Equals,
    NotEquals,
    GreaterThan,
    GreaterThanOrEq,
    LessThan,
    LessThanOrEq,
    /// Not supported by this engine's fixed-width `Cell` set — kept as
    /// a named variant (rather than omitted) because the SQL front end
    /// still needs to reject `LIKE` with a clear error instead of
    /// silently mis-parsing it.
    Like,
}

#[derive(Debug, Clone)]
pub struct Predicate {
    pub field_index: usize,
    pub op: Op,
    pub cell: Cell,
}

impl Predicate {
    pub fn new(field_index: usize, op: Op, cell: Cell) -> Self {
        Predicate {
            field_index,
            op,
            cell,
        }
    }

    pub fn matches(&self, candidate: &Cell) -> bool {
        match self.op {
            Op::Equals => candidate == &self.cell,
            Op::NotEquals => candidate != &self.cell,
            Op::GreaterThan => candidate > &self.cell,
            Op::GreaterThanOrEq => candidate >= &self.cell,
            Op::LessThan => candidate < &self.cell,
            Op::LessThanOrEq => candidate <= &self.cell,
            Op::Like => todo!("LIKE is not supported by this engine's fixed-width cell set"),
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "field_index: {}, op: {:?}, cell: {:?}",
            self.field_index, self.op, self.cell
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equals_matches_same_value() {
        let p = Predicate::new(0, Op::Equals, Cell::Int64(5));
        assert!(p.matches(&Cell::Int64(5)));
        assert!(!p.matches(&Cell::Int64(6)));
    }

    #[test]
    fn ordering_ops_compare_within_variant() {
        let p = Predicate::new(0, Op::GreaterThan, Cell::Int64(5));
        assert!(p.matches(&Cell::Int64(6)));
        assert!(!p.matches(&Cell::Int64(5)));
    }
}
