pub mod model;
pub mod storage;

pub use model::{Priority, SortDirection, Status, TagRow, TaskRow};
pub use storage::{TagInput, TaskStore};
