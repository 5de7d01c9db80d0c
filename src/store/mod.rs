pub mod memory;
pub mod postgres;
pub mod schema;
pub mod traits;

pub use memory::*;
pub use postgres::*;
pub use schema::*;
pub use traits::*;
