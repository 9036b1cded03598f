//! A table's column layout: name, order, and type, plus (on `Field`
//! itself) which field, if any, is the primary key. Grounded on the
//! teacher's `RowScheme`, widened to carry the new `Type` set instead
//! of a single hardcoded int width.

use crate::field::Field;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    pub fields: Vec<Field>,
}

impl Schema {
    pub fn new(fields: Vec<Field>) -> Self {
        Schema { fields }
    }

    pub fn tuple_size(&self) -> usize {
        self.fields.iter().map(|f| f.ty.len()).sum()
    }

    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }
}
