pub mod crud;
pub mod error;
pub mod validate;

pub use crud::*;
pub use error::*;
pub use validate::*;
