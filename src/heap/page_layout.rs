//! Pure byte-layout math for a heap page: a bitmap header followed by
//! a fixed number of fixed-width tuple slots. Grounded on `page.rs`'s
//! `HeapPage` (`get_rows_count`/`get_header_size`/`is_slot_used`
//! arithmetic), generalized off the hardcoded all-int schema.
//!
//! ```text
//! [ header: ceil(slots/8) bytes, one bit per slot ][ slot 0 ][ slot 1 ] ...
//! ```

use std::sync::Arc;

use crate::{config, schema::Schema, tuple::Tuple};

pub fn slot_count(schema: &Schema) -> usize {
    let tuple_size = schema.tuple_size();
    // each slot costs `tuple_size` bytes plus one header bit.
    config::page_size() * 8 / (tuple_size * 8 + 1)
}

pub fn header_size(schema: &Schema) -> usize {
    (slot_count(schema) + 7) / 8
}

pub fn is_slot_used(header: &[u8], slot: usize) -> bool {
    let byte = header[slot / 8];
    let bit = slot % 8;
    (byte & (1 << (7 - bit))) != 0
}

pub fn set_slot_used(header: &mut [u8], slot: usize, used: bool) {
    let byte_index = slot / 8;
    let bit = 1 << (7 - (slot % 8));
    if used {
        header[byte_index] |= bit;
    } else {
        header[byte_index] &= !bit;
    }
}

fn slot_offset(schema: &Schema, slot: usize) -> usize {
    header_size(schema) + slot * schema.tuple_size()
}

pub fn empty_page(_schema: &Schema) -> Vec<u8> {
    vec![0u8; config::page_size()]
}

pub fn read_tuple(bytes: &[u8], schema: Arc<Schema>, slot: usize) -> Tuple {
    let offset = slot_offset(&schema, slot);
    let size = schema.tuple_size();
    Tuple::decode(schema, &bytes[offset..offset + size])
}

pub fn write_tuple(bytes: &mut [u8], slot: usize, schema: &Schema, tuple: &Tuple) {
    let offset = slot_offset(schema, slot);
    let encoded = tuple.encode();
    debug_assert_eq!(encoded.len(), schema.tuple_size());
    bytes[offset..offset + encoded.len()].copy_from_slice(&encoded);
    let mut header = bytes[..header_size(schema)].to_vec();
    set_slot_used(&mut header, slot, true);
    bytes[..header.len()].copy_from_slice(&header);
}

pub fn clear_slot(bytes: &mut [u8], slot: usize, schema: &Schema) {
    let mut header = bytes[..header_size(schema)].to_vec();
    set_slot_used(&mut header, slot, false);
    bytes[..header.len()].copy_from_slice(&header);
}

pub fn first_free_slot(bytes: &[u8], schema: &Schema) -> Option<usize> {
    let header = &bytes[..header_size(schema)];
    (0..slot_count(schema)).find(|&slot| !is_slot_used(header, slot))
}

pub fn used_slots(bytes: &[u8], schema: &Schema) -> Vec<usize> {
    let header = &bytes[..header_size(schema)];
    (0..slot_count(schema))
        .filter(|&slot| is_slot_used(header, slot))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        cell::Cell,
        field::{Field, Type},
    };

    fn int_schema(n: usize) -> Arc<Schema> {
        let fields = (0..n)
            .map(|i| Field::new(&format!("f{}", i), Type::Int64))
            .collect();
        Arc::new(Schema::new(fields))
    }

    #[test]
    fn round_trips_a_tuple_through_a_slot() {
        let schema = int_schema(2);
        let mut page = empty_page(&schema);
        let tuple = Tuple::new(Arc::clone(&schema), vec![Cell::Int64(1), Cell::Int64(2)]);
        write_tuple(&mut page, 0, &schema, &tuple);
        assert!(is_slot_used(&page[..header_size(&schema)], 0));
        let read_back = read_tuple(&page, Arc::clone(&schema), 0);
        assert_eq!(read_back, tuple);
    }

    #[test]
    fn clearing_a_slot_frees_it() {
        let schema = int_schema(1);
        let mut page = empty_page(&schema);
        let tuple = Tuple::new(Arc::clone(&schema), vec![Cell::Int64(42)]);
        write_tuple(&mut page, 3, &schema, &tuple);
        clear_slot(&mut page, 3, &schema);
        assert!(!is_slot_used(&page[..header_size(&schema)], 3));
    }

    #[test]
    fn first_free_slot_finds_a_gap() {
        let schema = int_schema(1);
        let mut page = empty_page(&schema);
        let tuple = Tuple::new(Arc::clone(&schema), vec![Cell::Int64(1)]);
        write_tuple(&mut page, 0, &schema, &tuple);
        assert_eq!(first_free_slot(&page, &schema), Some(1));
    }
}
