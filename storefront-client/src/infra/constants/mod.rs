//! Constants shared across the client

pub mod routes;
