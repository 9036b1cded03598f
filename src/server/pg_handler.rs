//! Postgres wire protocol front door: translate a `SimpleQueryHandler`
//! call into [`crate::sql::Session::execute`] and the resulting
//! [`QueryResult`] into pgwire's row-stream wire format. Grounded on
//! the teacher's `server/pg_handler.rs` (same `PostgresHandler` shape,
//! same `Arc<Mutex<Session>>`), whose `do_query` body was
//! `unimplemented!()` — filled in here using the field/row encoding
//! pattern from `omendb-omen/src/postgres/encoding.rs`
//! (`FieldInfo::new`, `DataRowEncoder`, `QueryResponse`).

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::stream;
use log::info;
use pgwire::{
    api::{
        query::SimpleQueryHandler,
        results::{DataRowEncoder, FieldFormat, FieldInfo, QueryResponse, Response, Tag},
        ClientInfo, Type as PgType,
    },
    error::{ErrorInfo, PgWireError, PgWireResult},
};

use crate::{
    field::Type,
    sql::{session::Session, QueryResult},
    tuple::Tuple,
};

pub struct PostgresHandler {
    pub session: Arc<Mutex<Session>>,
}

impl PostgresHandler {
    pub fn new(session: Arc<Mutex<Session>>) -> Self {
        Self { session }
    }
}

#[async_trait]
impl SimpleQueryHandler for PostgresHandler {
    async fn do_query<'b, C>(&self, _client: &C, query: &'b str) -> PgWireResult<Vec<Response<'b>>>
    where
        C: ClientInfo + Unpin + Send + Sync,
    {
        info!("query: {}", query);

        let result = {
            let session = self.session.lock().unwrap();
            session.execute(query)
        };

        match result {
            Ok(QueryResult::TableCreated(_)) => {
                Ok(vec![Response::Execution(Tag::new_for_execution("CREATE TABLE", None))])
            }
            Ok(QueryResult::RowsAffected(n)) => {
                let tag = if query.trim_start().to_uppercase().starts_with("DELETE") {
                    Tag::new_for_execution("DELETE", Some(n))
                } else {
                    Tag::new_for_execution("INSERT", Some(n))
                };
                Ok(vec![Response::Execution(tag)])
            }
            Ok(QueryResult::Rows { schema, rows }) => {
                let fields: Vec<FieldInfo> = schema
                    .fields
                    .iter()
                    .map(|f| FieldInfo::new(f.name.clone(), None, None, field_pg_type(f.ty), FieldFormat::Text))
                    .collect();
                let fields = Arc::new(fields);
                let rows_encoded: Vec<PgWireResult<_>> = rows
                    .iter()
                    .map(|row| encode_row(row, fields.clone()))
                    .collect();
                Ok(vec![Response::Query(QueryResponse::new(
                    fields,
                    stream::iter(rows_encoded),
                ))])
            }
            Err(e) => {
                e.show_backtrace();
                Err(PgWireError::UserError(Box::new(ErrorInfo::new(
                    "ERROR".to_owned(),
                    "XX000".to_owned(),
                    e.to_string(),
                ))))
            }
        }
    }
}

fn field_pg_type(ty: Type) -> PgType {
    match ty {
        Type::Int64 => PgType::INT8,
        Type::Bytes(_) => PgType::VARCHAR,
    }
}

fn encode_row(
    tuple: &Tuple,
    fields: Arc<Vec<FieldInfo>>,
) -> PgWireResult<pgwire::messages::data::DataRow> {
    let mut encoder = DataRowEncoder::new(fields);
    for cell in tuple.cells() {
        match cell {
            crate::cell::Cell::Int64(v) => encoder.encode_field(v)?,
            crate::cell::Cell::Bytes(b) => {
                let trimmed = b
                    .iter()
                    .position(|&byte| byte == 0)
                    .map_or(b.as_slice(), |end| &b[..end]);
                let text = String::from_utf8_lossy(trimmed);
                encoder.encode_field(&text.as_ref())?
            }
        }
    }
    encoder.finish()
}
