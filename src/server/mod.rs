pub mod pg_handler;

pub use pg_handler::PostgresHandler;
