pub mod collection;
pub mod er_task;

pub use collection::{Attributes, EntityCollection};
pub use er_task::ErTask;
