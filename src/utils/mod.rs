/// Shared helpers
pub mod command;

pub use command::CommandBuilder;
