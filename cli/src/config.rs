// Copyright 2023 Xayn AG
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as
// published by the Free Software Foundation, version 3.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

mod cli;

use std::{path::Path, process::exit};

use clap::{CommandFactory, Parser};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

pub(crate) use self::cli::Args;
use crate::logging;

/// The prefix of environment variables which configure the driver.
const ENV_PREFIX: &str = "DIVERSIFY__";

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
#[cfg_attr(test, serde(deny_unknown_fields))]
pub(crate) struct DiversifyConfig {
    pub(crate) logging: logging::Config,
    pub(crate) embedding: diversify_embedding::Config,
    pub(crate) engine: diversify_engine::Config,
}

/// Loads the config and the arguments of the invocation.
///
/// # Program Exit
///
/// In case of `--help`, `--print-config` and failure this function doesn't return but
/// terminates the program instead.
pub(crate) fn load() -> (DiversifyConfig, Args) {
    load_with_parsed_args(Args::parse())
}

fn load_with_parsed_args(mut args: Args) -> (DiversifyConfig, Args) {
    let config_file = args.config.take();
    let config = match load_config(config_file.as_deref(), args.to_config_overrides()) {
        Ok(config) => config,
        Err(error) => {
            eprintln!("Error: {error}");
            Args::command().print_help().ok();
            exit(1);
        }
    };

    if args.print_config {
        match serde_json::to_string_pretty(&config) {
            Ok(config) => println!("{config}"),
            Err(error) => {
                eprintln!("Error: {error}");
                exit(1);
            }
        }
        exit(0);
    }

    (config, args)
}

/// Loads the configuration into the given type.
///
/// # Load order/priority
///
/// This will by ascending priority load:
///
/// 1. `./config.toml` or the specified toml config file
/// 2. `./.env`
/// 3. process environment
/// 4. options passed through `update_with`
///
/// Environment variables from `.env` are loaded into the process environment if they don't
/// already exist there. Only variables prefixed with `DIVERSIFY__` are considered, the prefix is
/// stripped and the rest is split at `__`. E.g. `DIVERSIFY__ENGINE__N_TOTAL=12` is treated like
/// the json `{ "engine": { "n_total": 12 } }`.
fn load_config<C, U>(config: Option<&str>, update_with: U) -> Result<C, figment::Error>
where
    C: DeserializeOwned,
    U: Serialize,
{
    // the order must be from highest to lowest priority
    load_dotenv(".env")?;

    let mut figment = Figment::new()
        .join(Serialized::defaults(update_with))
        .join(Env::prefixed(ENV_PREFIX).split("__"));

    let provider = config
        .map(|content_or_path| {
            if let Some(content) = content_or_path.strip_prefix("inline:") {
                Toml::string(content)
            } else {
                Toml::file(content_or_path)
            }
        })
        .or_else(|| {
            let default_file = Path::new("config.toml");
            default_file.exists().then(|| Toml::file(default_file))
        });

    if let Some(provider) = provider {
        figment = figment.join(provider);
    }

    figment.extract()
}

fn load_dotenv(file_name: &str) -> Result<(), figment::Error> {
    match dotenvy::from_filename(file_name) {
        Err(error) if !error.not_found() => {
            Err(figment::Error::from(error.to_string()).with_path(file_name))
        }
        _ => Ok(()),
    }
}
