//! Spreadsheet backing store: gateway trait, Google implementation, auth.

pub mod auth;
pub mod gateway;
pub mod memory;

pub use gateway::{GatewayError, GoogleSheets, SheetsGateway};
pub use memory::MemorySheet;
