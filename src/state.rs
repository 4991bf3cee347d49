use crate::db::{DbPool, OrmConn};

/// Shared handles threaded through every route. The sqlx pool serves the raw
/// aggregate queries; the SeaORM connection serves entity work and
/// transactions. Both point at the same database.
#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub orm: OrmConn,
}

impl AppState {
    pub fn new(pool: DbPool, orm: OrmConn) -> Self {
        Self { pool, orm }
    }
}
