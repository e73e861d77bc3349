// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use actix_web::rt::System;
use actix_web::{App, HttpServer, middleware::Logger, web};
use log::{info, warn};
use std::path::PathBuf;
use std::sync::Arc;

use ade::app_state::AppState;
use ade::config::{Config, ValidatedConfig};
use ade::repository::MemoryRepository;
use ade::runtime_paths::RuntimePaths;

fn main() {
    let exit_code = run();
    std::process::exit(exit_code);
}

fn run() -> i32 {
    let parsed_args = match parse_args() {
        Ok(args) => args,
        Err(error) => {
            eprintln!("❌ Invalid command line arguments: {}", error);
            eprintln!("❌ Use -C <root> to set the runtime directory.");
            return 1;
        }
    };

    if parsed_args.help {
        print!("{}", help_text());
        return 0;
    }

    let validated_config = match Config::load_and_validate(&parsed_args.runtime_root) {
        Ok(config) => config,
        Err(error) => {
            eprintln!("❌ Configuration error: {}", error);
            eprintln!("❌ Application cannot start with invalid configuration.");
            return 1;
        }
    };

    let runtime_paths = match RuntimePaths::from_root(&parsed_args.runtime_root, &validated_config)
    {
        Ok(paths) => paths,
        Err(error) => {
            eprintln!("❌ Runtime directory error: {}", error);
            return 1;
        }
    };

    if let Err(error) = ade::util::init_logger(&validated_config.logging.level) {
        eprintln!("❌ Failed to initialize logger: {}", error);
        return 1;
    }

    match System::new().block_on(run_server(validated_config, runtime_paths)) {
        Ok(()) => 0,
        Err(error) => {
            eprintln!("❌ Server failed to start: {}", error);
            1
        }
    }
}

async fn run_server(
    validated_config: ValidatedConfig,
    runtime_paths: RuntimePaths,
) -> std::io::Result<()> {
    let validated_config = Arc::new(validated_config);
    log_startup_info(&validated_config, &runtime_paths);

    let repository = if runtime_paths.seed_file.is_file() {
        MemoryRepository::from_seed_file(&runtime_paths.seed_file)
            .map_err(|error| std::io::Error::other(error.to_string()))?
    } else {
        warn!(
            "Repository seed {} not found; starting with an empty repository",
            runtime_paths.seed_file.display()
        );
        MemoryRepository::new()
    };
    let repository = Arc::new(repository);

    let app_state = Arc::new(AppState::with_memory_repository(
        validated_config.clone(),
        repository,
    ));
    info!("✅ App state initialized");

    let ade_path = validated_config.ade.path.clone();
    let workers = validated_config.server.workers;
    let address = (validated_config.server.host.clone(), validated_config.server.port);

    HttpServer::new(move || {
        let ade_path = ade_path.clone();
        App::new()
            .app_data(web::Data::from(app_state.clone()))
            .wrap(Logger::new(
                r#"%a "%r" %s %b "%{Referer}i" "%{User-Agent}i" %T"#,
            ))
            .configure(move |cfg| ade::ade::configure(cfg, &ade_path))
    })
    .workers(workers)
    .bind(address)?
    .run()
    .await
}

fn log_startup_info(config: &ValidatedConfig, runtime_paths: &RuntimePaths) {
    info!("Starting ADE service");
    info!("Workers: {}", config.server.workers);
    info!(
        "Listening on {}:{}",
        config.server.host, config.server.port
    );
    info!(
        "Editor endpoints: {0}/server, {0}/publish",
        config.ade.path
    );
    info!(
        "Publish grouping: {} sessions ({}h gap), {} days, UTC offset {} min",
        config.publish.max_sessions,
        config.publish.session_gap_hours,
        config.publish.max_days,
        config.publish.utc_offset_minutes
    );
    info!("Config file: {}", runtime_paths.config_file.display());
    info!("Repository seed: {}", runtime_paths.seed_file.display());
    info!("Runtime root: {}", runtime_paths.root.display());

    if let Ok(current_dir) = std::env::current_dir() {
        info!("Working directory: {}", current_dir.display());
    }
}

fn help_text() -> String {
    [
        "Usage: ade [-C <root>]",
        "",
        "  -C <root>   runtime directory holding config.yaml and the repository seed",
        "  -h, --help  show this help",
        "",
    ]
    .join("\n")
}

#[derive(Debug)]
struct ParsedArgs {
    runtime_root: PathBuf,
    help: bool,
}

fn parse_args() -> Result<ParsedArgs, String> {
    parse_args_from(std::env::args().skip(1))
}

fn parse_args_from<I>(args: I) -> Result<ParsedArgs, String>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter();
    let mut runtime_root = PathBuf::from(".");
    let mut help = false;

    while let Some(arg) = args.next() {
        if arg == "--" {
            continue;
        } else if arg == "-h" || arg == "--help" {
            help = true;
        } else if arg == "-C" {
            let value = args
                .next()
                .ok_or_else(|| "Missing value for -C".to_string())?;
            runtime_root = PathBuf::from(value);
        } else {
            return Err(format!("Unexpected argument '{}'", arg));
        }
    }

    let runtime_root = make_runtime_root_absolute(runtime_root)?;
    Ok(ParsedArgs { runtime_root, help })
}

fn make_runtime_root_absolute(runtime_root: PathBuf) -> Result<PathBuf, String> {
    if runtime_root.is_absolute() {
        return Ok(runtime_root);
    }

    let current_dir = std::env::current_dir()
        .map_err(|error| format!("Failed to resolve current directory: {}", error))?;
    Ok(current_dir.join(runtime_root))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn runtime_root_defaults_to_current_dir() {
        let parsed = parse_args_from(Vec::new()).expect("parse");
        assert!(parsed.runtime_root.is_absolute());
        assert!(!parsed.help);
    }

    #[test]
    fn runtime_root_flag_is_honoured() {
        let parsed = parse_args_from(args(&["-C", "/srv/ade"])).expect("parse");
        assert_eq!(parsed.runtime_root, PathBuf::from("/srv/ade"));
    }

    #[test]
    fn missing_root_value_is_an_error() {
        assert!(parse_args_from(args(&["-C"])).is_err());
        assert!(parse_args_from(args(&["serve"])).is_err());
    }

    #[test]
    fn help_flag_is_detected() {
        assert!(parse_args_from(args(&["--help"])).expect("parse").help);
    }
}
