//! Command-line arguments, shared with the build script through `ggcdash-cli`.

pub use ggcdash_cli::{render_options_markdown, Args};
