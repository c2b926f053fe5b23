pub mod config;
pub mod driver;

pub use config::{Cli, Config, DEFAULT_DB, DEFAULT_FORM, Input, SAMPLE_TEXT};
pub use driver::{FrequencyUpdate, Report, run};
