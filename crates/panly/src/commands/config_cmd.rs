//! `panly config`: inspect the configuration file. No device contact.

use panly_config::{Config, config_path, render_config};

use crate::cli::{ConfigArgs, ConfigCommand};
use crate::error::CliError;

pub fn handle(args: &ConfigArgs, config: &Config) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Path => println!("{}", config_path().display()),
        ConfigCommand::Show => print!("{}", render_config(config)?),
        ConfigCommand::Profiles => {
            let default = config.default_profile.as_deref().unwrap_or("default");
            for name in config.profiles.keys() {
                let marker = if name == default { "*" } else { " " };
                println!("{marker} {name}");
            }
            if config.profiles.is_empty() {
                eprintln!("no profiles configured in {}", config_path().display());
            }
        }
    }
    Ok(())
}
