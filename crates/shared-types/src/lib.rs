pub mod operation;
pub mod types;

pub use operation::{Operation, UnknownOperation};
pub use types::{ErrorBody, HealthResponse, OperationResult, SplitFile, OUTPUT_URL_PREFIX};
