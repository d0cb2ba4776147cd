pub mod config;
pub mod quantity;
pub mod types;

pub use config::AdapterConfig;
pub use quantity::{Quantity, QuantityError};
pub use types::*;
