pub mod info;
pub mod list;
pub mod read;
pub mod timesteps;
pub mod validate;

pub use info::InfoCommand;
pub use list::ListCommand;
pub use read::ReadCommand;
pub use timesteps::TimestepsCommand;
pub use validate::ValidateCommand;
