//! Data Transfer Objects for REST request/response serialization.
//!
//! Domain entities never cross the HTTP boundary directly: every response
//! is built from a DTO so the wire shape stays stable when storage fields
//! change. Identifiers travel as bare UUID strings.

pub mod account_dto;
pub mod catalog_dto;
pub mod checkin_dto;
pub mod common_dto;
pub mod redemption_dto;

pub use account_dto::*;
pub use catalog_dto::*;
pub use checkin_dto::*;
pub use common_dto::*;
pub use redemption_dto::*;
