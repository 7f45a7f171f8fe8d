pub mod analytics;
pub mod ingest;
pub mod parser;
pub mod progress;
pub mod store;
pub mod target;
pub mod utils;
pub mod validator;
