//! A thin `sqlparser`-backed SQL front end over the execution layer:
//! `CREATE TABLE`, `INSERT`, `SELECT` (optional `WHERE` + `GROUP BY`/
//! aggregate), `DELETE`. Ambient surface carried because the teacher
//! carries it (`sqlparser`, `pgwire`, `tokio` are already in its
//! `Cargo.toml`) — this spec's correctness obligations live in the
//! buffer pool, not here.

pub mod handler;
pub mod session;

pub use handler::{execute, QueryResult};
pub use session::Session;
