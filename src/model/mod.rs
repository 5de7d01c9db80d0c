pub mod activity;
pub mod common;
pub mod descriptor;
pub mod entity;
pub mod entreprise;
pub mod prospect;
pub mod tache;

pub use activity::*;
pub use common::*;
pub use descriptor::*;
pub use entity::*;
pub use entreprise::*;
pub use prospect::*;
pub use tache::*;
