//! A single column value. Closed enum mirroring [`crate::field::Type`];
//! comparing across variants is a caller bug (the teacher's `IntCell`
//! had no such hazard since it only ever had one variant — this widens
//! it and documents the new invariant instead of hiding it).

use std::cmp::Ordering;

use crate::{
    field::Type,
    io::{Decodeable, Encodeable},
};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Cell {
    Int64(i64),
    Bytes(Vec<u8>),
}

impl PartialOrd for Cell {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Cell::Int64(a), Cell::Int64(b)) => a.partial_cmp(b),
            (Cell::Bytes(a), Cell::Bytes(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

impl Encodeable for Cell {
    fn encode(&self) -> Vec<u8> {
        match self {
            Cell::Int64(v) => v.encode(),
            Cell::Bytes(b) => b.clone(),
        }
    }
}

/// Decoding a bare `Cell` requires knowing its [`Type`] up front (the
/// width of a `Bytes` cell isn't self-describing on disk, unlike
/// `BitVec`/`String`), so `Tuple::decode` reads field-by-field against
/// the schema rather than through `Decodeable` directly.
pub fn decode_cell<R: std::io::Read>(reader: &mut R, ty: Type) -> Cell {
    match ty {
        Type::Int64 => Cell::Int64(i64::decode_from(reader)),
        Type::Bytes(n) => Cell::Bytes(crate::io::read_exact(reader, n)),
    }
}
