//! CLI configuration: thin wrapper around `panly_config`.
//!
//! Resolves the active profile and applies `GlobalOpts` flag overrides
//! (--hostname, --api-key, --insecure, ...) on top of it.

use secrecy::SecretString;

use panly_api::{TlsMode, XapiConfig};
use panly_config::{Config, CredentialOverrides, Profile, config_path, profile_to_xapi_config};

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

fn overrides(global: &GlobalOpts) -> CredentialOverrides {
    CredentialOverrides {
        api_key: global.api_key.clone().map(SecretString::from),
        api_username: global.api_username.clone(),
        api_password: global.api_password.clone().map(SecretString::from),
    }
}

/// Build the client config from the config file, profile, and flags.
///
/// Without a matching profile, `--hostname` plus credentials on the
/// command line are enough. Naming a profile that does not exist is an
/// error.
pub fn build_xapi_config(global: &GlobalOpts, config: &Config) -> Result<XapiConfig, CliError> {
    let profile_name = active_profile_name(global, config);

    let base = match config.profiles.get(&profile_name) {
        Some(profile) => profile.clone(),
        None if global.profile.is_some() => {
            return Err(CliError::ProfileNotFound {
                name: profile_name,
                available: available_profiles(config),
                path: config_path().display().to_string(),
            });
        }
        None if global.hostname.is_none() => {
            return Err(CliError::NoConfig {
                path: config_path().display().to_string(),
            });
        }
        None => Profile::default(),
    };

    let profile = apply_flags(base, global);
    let mut xapi = profile_to_xapi_config(&profile, &profile_name, &config.defaults, &overrides(global))?;

    if global.insecure {
        xapi.tls = TlsMode::DangerAcceptInvalid;
    }
    Ok(xapi)
}

fn apply_flags(mut profile: Profile, global: &GlobalOpts) -> Profile {
    if let Some(ref hostname) = global.hostname {
        profile.hostname = Some(hostname.clone());
    }
    if global.port.is_some() {
        profile.port = global.port;
    }
    if let Some(ref serial) = global.serial {
        profile.serial = Some(serial.clone());
    }
    if global.timeout.is_some() {
        profile.timeout = global.timeout;
    }
    profile.use_http |= global.http;
    profile.use_get |= global.get;
    profile
}

pub fn available_profiles(config: &Config) -> String {
    if config.profiles.is_empty() {
        return "(none)".into();
    }
    config.profiles.keys().cloned().collect::<Vec<_>>().join(", ")
}
