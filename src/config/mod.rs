//! Configuration system for webex-notify.
//!
//! This module provides the configuration structures, the CLI definition and
//! the layered loader. Precedence, highest first: CLI flags, `WEBEX_*`
//! environment variables, a dotenv file, built-in defaults.
//!
//! # Example dotenv file
//!
//! ```text
//! WEBEX_TOKEN=NjM1...
//! WEBEX_DST=user@example.com
//! WEBEX_FORMAT=text
//! WEBEX_TIMEOUT=15
//! WEBEX_INSECURE=no
//! ```

mod cli;
mod loader;
mod types;


pub use cli::Cli;
pub use loader::{
    collect_env_vars, env_var_names, load_config, load_config_with_env, load_settings_with_env,
    parse_bool_token, read_env_file,
};
pub use types::{DEFAULT_TIMEOUT_SECS, MessageFormat, Settings, WebexConfig};
