//! Gateway types module
//!
//! ## Input Types
//! - [`CreateAccountRequest`], [`TransferRequest`]: JSON bodies
//! - [`PageQuery`]: `page_id` / `page_size` query string
//!
//! ## Output Types
//! - [`ApiResponse<T>`]: Unified API response wrapper
//! - [`ApiError`]: error response with HTTP status and code

pub mod request;
pub mod response;

pub use request::{CreateAccountRequest, PageQuery, TransferRequest};
pub use response::{ApiError, ApiResponse, ApiResult, DeletedData, created, error_codes, ok};
