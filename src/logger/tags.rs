/// Log tags, one per subsystem
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LogTag {
    System,
    Config,
    Fetcher,
    Api,
    Ledger,
    Ingest,
    Scheduler,
    Broadcast,
    Webserver,
    Test,
    Other(String),
}

impl LogTag {
    /// Key used by --debug-<key> flags
    pub fn to_debug_key(&self) -> String {
        match self {
            LogTag::System => "system".to_string(),
            LogTag::Config => "config".to_string(),
            LogTag::Fetcher => "fetcher".to_string(),
            LogTag::Api => "api".to_string(),
            LogTag::Ledger => "ledger".to_string(),
            LogTag::Ingest => "ingest".to_string(),
            LogTag::Scheduler => "scheduler".to_string(),
            LogTag::Broadcast => "broadcast".to_string(),
            LogTag::Webserver => "webserver".to_string(),
            LogTag::Test => "test".to_string(),
            LogTag::Other(s) => s.to_lowercase(),
        }
    }

    /// Uppercase label used in console output
    pub fn to_plain_string(&self) -> String {
        self.to_debug_key().to_uppercase()
    }
}
