mod command;
mod refs;

pub use command::{
    format_command, get_repo_root, join_command, parse_properties, read_repo_config, run_listing,
    CommandRunner, ShellRunner, Stream, TemplateError,
};
pub use refs::{Ref, RefKind, RefStore};
