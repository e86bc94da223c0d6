//! Configuration section definitions.
//!
//! | Module  | TOML Section | Purpose                                 |
//! |---------|--------------|-----------------------------------------|
//! | `build` | `[build]`    | Generator command, directories, filters |
//! | `serve` | `[serve]`    | HTTP server and live reload channel     |

mod build;
mod serve;

pub use build::BuildSection;
pub use serve::ServeSection;
