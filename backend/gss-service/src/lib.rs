pub mod error;
pub mod lock;
pub mod logger;
pub mod service;

#[cfg(test)]
mod tests;

pub use error::{Result as ServiceResult, ServiceError};
pub use lock::LockFile;
