/// Database plumbing
///
/// - `pool`: PostgreSQL connection pool creation and health check
/// - `migrations`: embedded schema migrations
///
/// Queries live with their store in [`crate::store::postgres`].

pub mod migrations;
pub mod pool;
