pub mod connection;
pub mod mysql;
pub mod postgres;
pub mod schema;
