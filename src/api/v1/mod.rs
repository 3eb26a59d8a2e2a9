mod error;
mod handler;
mod router;

pub use error::{ApiError, ApiErrorCode, recover_error};
pub use handler::{ApiResponse, MAX_BATCH_TARGETS};
pub use router::routes;
