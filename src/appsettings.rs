use config::{Config, ConfigError, Environment, File, builder::DefaultState};

use ticklr_models::settings::Settings;

/// Reads `appsettings.*`, then `appsettings.local.*`, then `APP_` environment variables,
/// later sources overriding earlier ones. Nested keys use `__`, e.g. `APP_TELEGRAM__TOKEN`.
pub fn load() -> Result<Settings, ConfigError> {
    builder()
        .add_source(environment())
        .build()?
        .try_deserialize()
}

fn builder() -> config::ConfigBuilder<DefaultState> {
    Config::builder()
        .add_source(File::with_name("appsettings").required(false))
        .add_source(File::with_name("appsettings.local").required(false))
}

fn environment() -> Environment {
    Environment::with_prefix("APP")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("access.allowed_users")
}
