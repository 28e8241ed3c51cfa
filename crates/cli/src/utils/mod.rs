pub mod file;
pub mod workspace;

pub use file::{BUILD_FILE_NAME, build_file_path, write_build_files};
pub use workspace::load_context;
