pub mod boats;
pub mod connection;
pub mod locks;
pub mod runs;

pub use connection::Database;
