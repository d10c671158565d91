//! Driver interface shared by the storage backends that hold registry content.

mod driver;
mod error;

pub use driver::Driver;
pub use driver::Metadata;
pub use driver::Reader;
pub use driver::Writer;
pub use error::StorageError;
pub use error::StorageErrorBuilder;
pub use error::StorageErrorKind;
