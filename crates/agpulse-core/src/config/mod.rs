mod settings;

pub use settings::{Command, CompanionSettings, Config, Settings};
