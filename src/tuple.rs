use std::{fmt, io::Cursor, sync::Arc};

use crate::{
    cell::{decode_cell, Cell},
    io::Encodeable,
    page_id::PageId,
    schema::Schema,
};

/// Where a tuple currently lives on disk: the page and slot it was
/// read out of. Set by [`Tuple::decode`] when a scan materializes a
/// row, so a later `DELETE` of that same row doesn't need its own
/// index to find it again — it just replays the (page, slot) the scan
/// already paid to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordId {
    pub page_id: PageId,
    pub slot: usize,
}

/// A row of column values tied to the schema that produced it.
/// Grounded on the teacher's `Tuple`/`TupleScheme`, generalized off the
/// hardcoded all-`IntCell` layout to the widened [`Cell`] set.
#[derive(Debug, Clone, PartialEq)]
pub struct Tuple {
    pub schema: Arc<Schema>,
    pub record_id: Option<RecordId>,
    cells: Vec<Cell>,
}

impl Tuple {
    pub fn new(schema: Arc<Schema>, cells: Vec<Cell>) -> Self {
        debug_assert_eq!(schema.fields.len(), cells.len());
        Tuple {
            schema,
            record_id: None,
            cells,
        }
    }

    pub fn decode(schema: Arc<Schema>, bytes: &[u8]) -> Self {
        let mut reader = Cursor::new(bytes);
        let cells = schema
            .fields
            .iter()
            .map(|f| decode_cell(&mut reader, f.ty))
            .collect();
        Tuple {
            schema,
            record_id: None,
            cells,
        }
    }

    pub fn with_record_id(mut self, record_id: RecordId) -> Self {
        self.record_id = Some(record_id);
        self
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.schema.tuple_size());
        for cell in &self.cells {
            buf.extend_from_slice(&cell.encode());
        }
        buf
    }

    pub fn get_cell(&self, i: usize) -> &Cell {
        &self.cells[i]
    }

    pub fn set_cell(&mut self, i: usize, cell: Cell) {
        self.cells[i] = cell;
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }
}

impl fmt::Display for Tuple {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{{")?;
        for (i, cell) in self.cells.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{:?}", cell)?;
        }
        write!(f, "}}")
    }
}
