//! Frontmatter parsing and record building shared by the `fl-cli` commands.

pub mod utils;
