pub mod server;

pub use server::{ConnectionError, Server, serve_connection};
