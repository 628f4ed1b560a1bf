/// Configuration system
///
/// - `macros`: `config_struct!` for struct + defaults in one declaration
/// - `schemas`: every configuration section
/// - `utils`: loading from TOML, environment overrides, global access
pub mod macros;
pub mod schemas;
pub mod utils;

pub use schemas::{
    AuthConfig, Config, FetcherConfig, LedgerConfig, RefreshConfig, WebSocketConfig,
    WebserverConfig,
};
pub use utils::{
    apply_env_overrides, get_config_clone, is_config_initialized, load_config,
    load_config_from_path, read_config_file, with_config, CONFIG_FILE_PATH,
};
