pub mod error;
pub mod logger;
pub mod response;

pub use error::ApiError;
pub use logger::init_logger;
