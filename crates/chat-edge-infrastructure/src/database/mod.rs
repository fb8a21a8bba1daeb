//! Database module (message repository adapters)

pub mod connection;
pub mod memory;
pub mod postgres;

pub use connection::create_pool;
pub use memory::InMemoryMessageRepository;
pub use postgres::PgMessageRepository;
