//! `COUNT`/`SUM`/`MIN`/`MAX`/`AVG` over one field, with an optional
//! single-field `GROUP BY`. Computed by full materialization — a
//! teaching engine, not a production one, so no spill-to-disk.
//! Grounded on `sql/executor/select.rs`'s aggregate shape, generalized
//! off its SQL-plan-specific types.

use std::collections::HashMap;

use crate::{cell::Cell, tuple::Tuple};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggOp {
    Count,
    Sum,
    Min,
    Max,
    Avg,
}

pub struct Aggregate<I> {
    input: I,
    agg_field: usize,
    group_field: Option<usize>,
    op: AggOp,
}

/// One aggregate result: the group key (`None` for a bare aggregate
/// with no `GROUP BY`) and the computed value. `AVG` is always
/// returned as a `Cell::Int64` truncated towards zero, matching this
/// engine's integer-only arithmetic — there is no floating-point cell
/// variant to return a fractional average in.
pub struct AggregateResult {
    pub group: Option<Cell>,
    pub value: Cell,
}

impl<I: Iterator<Item = Tuple>> Aggregate<I> {
    pub fn new(input: I, agg_field: usize, group_field: Option<usize>, op: AggOp) -> Self {
        Aggregate {
            input,
            agg_field,
            group_field,
            op,
        }
    }

    pub fn compute(self) -> Vec<AggregateResult> {
        let mut groups: HashMap<Option<Cell>, Vec<i64>> = HashMap::new();

        for tuple in self.input {
            let group = self.group_field.map(|i| tuple.get_cell(i).clone());
            let value = match tuple.get_cell(self.agg_field) {
                Cell::Int64(v) => *v,
                Cell::Bytes(_) => continue,
            };
            groups.entry(group).or_default().push(value);
        }

        let mut results: Vec<AggregateResult> = groups
            .into_iter()
            .map(|(group, values)| AggregateResult {
                group,
                value: self.reduce(&values),
            })
            .collect();

        // deterministic output order for tests and callers, since
        // `HashMap` iteration order is not.
        results.sort_by(|a, b| format!("{:?}", a.group).cmp(&format!("{:?}", b.group)));
        results
    }

    fn reduce(&self, values: &[i64]) -> Cell {
        match self.op {
            AggOp::Count => Cell::Int64(values.len() as i64),
            AggOp::Sum => Cell::Int64(values.iter().sum()),
            AggOp::Min => Cell::Int64(values.iter().copied().min().unwrap_or(0)),
            AggOp::Max => Cell::Int64(values.iter().copied().max().unwrap_or(0)),
            AggOp::Avg => {
                if values.is_empty() {
                    Cell::Int64(0)
                } else {
                    Cell::Int64(values.iter().sum::<i64>() / values.len() as i64)
                }
            }
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

    fn row(group: i64, value: i64) -> Tuple {
        let schema = Arc::new(Schema::new(vec![
            Field::new("g", Type::Int64),
            Field::new("v", Type::Int64),
        ]));
        Tuple::new(schema, vec![Cell::Int64(group), Cell::Int64(value)])
    }

    #[test]
    fn sums_per_group() {
        let rows = vec![row(1, 10), row(1, 20), row(2, 5)];
        let results = Aggregate::new(rows.into_iter(), 1, Some(0), AggOp::Sum).compute();
        assert_eq!(results.len(), 2);
        let group1 = results
            .iter()
            .find(|r| r.group == Some(Cell::Int64(1)))
            .unwrap();
        assert_eq!(group1.value, Cell::Int64(30));
    }

    #[test]
    fn count_with_no_group_by() {
        let rows = vec![row(1, 10), row(2, 20), row(3, 30)];
        let results = Aggregate::new(rows.into_iter(), 1, None, AggOp::Count).compute();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].value, Cell::Int64(3));
    }
}
