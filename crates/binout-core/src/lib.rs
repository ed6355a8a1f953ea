pub mod constants;
pub mod errors;
pub mod path;
pub mod tree;

// Re-export commonly used items
pub use constants::{ElementType, RecordCommand};
pub use errors::{BinoutError, Result};
pub use path::PathView;
pub use tree::{Child, DirectoryTree, Folder, Resolved, Variable};
