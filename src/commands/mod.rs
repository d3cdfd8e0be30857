mod convert_command;
pub use convert_command::*;
