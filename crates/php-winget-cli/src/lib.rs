//! php-winget library - expose the `generate` command for testing

pub mod common;
pub mod errors;
pub mod generate;
pub mod help;

pub use common::GlobalOpts;
pub use errors::CliError;
pub use php_winget_config as config;
pub use php_winget_logger as logger;
