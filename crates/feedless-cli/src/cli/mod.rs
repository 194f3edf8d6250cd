pub mod commands;
pub mod config;
pub mod http;
pub mod import;
pub mod protocol;

pub use commands::CliCommand;
pub use config::CliConfig;
pub use http::{router, run_server, AppState};
pub use import::import_jsonl;
pub use protocol::ApiResponse;
