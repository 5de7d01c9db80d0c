pub mod filter;
pub mod form;
pub mod page;
pub mod projection;
pub mod tab;

pub use filter::*;
pub use form::*;
pub use page::*;
pub use projection::*;
pub use tab::*;
