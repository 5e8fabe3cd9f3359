//! 平台相关的输出

mod cli;

pub use cli::{format_value, module_info_json, print_error, ErrorFormat};
