pub mod macros;
pub mod shift;
pub mod user;

// Re-export all models for easy importing
pub use shift::*;
pub use user::*;
