pub mod convert;
pub mod explain;

pub use convert::convert_command;
pub use explain::explain_command;
