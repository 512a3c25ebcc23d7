pub mod connection;
pub mod location;
pub mod models;
pub mod registry;
pub mod repositories;
pub mod schema;

pub use connection::{ConnectionState, TenantConnection};
pub use location::Location;
pub use registry::TenantRegistry;
