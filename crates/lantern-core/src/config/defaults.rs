//! Default value functions used by serde for config deserialization.

pub fn default_name() -> String {
    "Lantern".to_string()
}

pub fn default_data_dir() -> String {
    "~/.lantern".to_string()
}

pub fn default_log_level() -> String {
    "info".to_string()
}

pub fn default_true() -> bool {
    true
}

pub fn default_db_path() -> String {
    "~/.lantern/data/lantern.db".to_string()
}

pub fn default_convo_keep() -> i64 {
    120
}

pub fn default_context_window() -> i64 {
    14
}

pub fn default_message_log_limit() -> i64 {
    200
}

pub fn default_api_base() -> String {
    "https://api.telegram.org".to_string()
}

pub fn default_poll_timeout() -> u64 {
    25
}

pub fn default_api_host() -> String {
    "0.0.0.0".to_string()
}

pub fn default_api_port() -> u16 {
    8000
}
