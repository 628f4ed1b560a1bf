/// Centralized argument handling for holderwatch
///
/// Command-line arguments are captured once into a global store so any module
/// can check debug flags without threading them through constructors.
///
/// Recognized flags:
/// - `--config <path>`   Configuration file (default: data/config.toml)
/// - `--debug-<tag>`     Enable debug logs for one tag (e.g. --debug-fetcher)
/// - `--verbose`         Enable verbose logs for every tag
/// - `--quiet`           Only warnings and errors
/// - `--help`            Print usage and exit
use once_cell::sync::Lazy;
use std::env;
use std::sync::Mutex;

/// Global command-line arguments storage
pub static CMD_ARGS: Lazy<Mutex<Vec<String>>> = Lazy::new(|| Mutex::new(env::args().collect()));

/// Sets the global command-line arguments
/// Used by tests to override the default env::args() collection
pub fn set_cmd_args(args: Vec<String>) {
    if let Ok(mut cmd_args) = CMD_ARGS.lock() {
        *cmd_args = args;
    }
}

/// Gets a copy of the current command-line arguments
pub fn get_cmd_args() -> Vec<String> {
    match CMD_ARGS.lock() {
        Ok(args) => args.clone(),
        Err(_) => env::args().collect(),
    }
}

/// Checks if a specific argument is present in the command line
pub fn has_arg(arg: &str) -> bool {
    get_cmd_args().iter().any(|a| a == arg)
}

/// Gets the value of a command-line argument that follows a flag
pub fn get_arg_value(flag: &str) -> Option<String> {
    let args = get_cmd_args();
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

/// Collects every `--debug-<tag>` flag as its lowercase tag key
pub fn debug_flags() -> Vec<String> {
    get_cmd_args()
        .iter()
        .filter_map(|a| a.strip_prefix("--debug-"))
        .map(|tag| tag.to_lowercase())
        .collect()
}

// =============================================================================
// FLAG CHECKS
// =============================================================================

pub fn is_help_requested() -> bool {
    has_arg("--help") || has_arg("-h")
}

pub fn is_verbose_enabled() -> bool {
    has_arg("--verbose")
}

pub fn is_quiet_enabled() -> bool {
    has_arg("--quiet")
}

/// Webserver debug mode
pub fn is_debug_webserver_enabled() -> bool {
    has_arg("--debug-webserver")
}

/// Provider fetcher debug mode (also dumps truncated provider responses)
pub fn is_debug_fetcher_enabled() -> bool {
    has_arg("--debug-fetcher")
}

/// Config file path from `--config`, if given
pub fn config_path_arg() -> Option<String> {
    get_arg_value("--config")
}

/// Print usage to stdout
pub fn print_help() {
    println!("holderwatch - live holder/seller ledger with WebSocket broadcast");
    println!();
    println!("USAGE:");
    println!("    holderwatch [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("    --config <path>     Configuration file (default: data/config.toml)");
    println!("    --debug-<tag>       Debug logs for a tag: system, config, fetcher, api,");
    println!("                        ledger, ingest, scheduler, broadcast, webserver");
    println!("    --verbose           Verbose logs for every tag");
    println!("    --quiet             Only warnings and errors");
    println!("    -h, --help          Print this help");
}
