//! Configuration management CLI commands.
//!
//! Provides `config path`, `config show` and `config init`.

use std::path::Path;

use clap::Subcommand;
use glidecore::config::{config_file_path, ConfigFile};

use crate::error::CliError;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Show the configuration file path
    Path,

    /// Print the effective configuration
    Show,

    /// Write a configuration file with default values
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Run a config subcommand against `config_path`, or the default file.
pub fn run(command: ConfigCommands, config_path: Option<&Path>) -> Result<(), CliError> {
    let path = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(config_file_path);
    match command {
        ConfigCommands::Path => run_path(&path),
        ConfigCommands::Show => run_show(&path),
        ConfigCommands::Init { force } => run_init(&path, force),
    }
}

/// Show the configuration file path.
fn run_path(path: &Path) -> Result<(), CliError> {
    println!("{}", path.display());
    Ok(())
}

/// Print the configuration after defaults are applied.
fn run_show(path: &Path) -> Result<(), CliError> {
    let config = ConfigFile::load_from(path)?;

    if path.exists() {
        println!("# {}", path.display());
    } else {
        println!("# {} does not exist, showing defaults", path.display());
    }
    println!();

    let flight = &config.flight;
    println!("[flight]");
    println!("  takeoff_speed = {} m/s", flight.takeoff_speed);
    println!("  takeoff_confirm_secs = {}", flight.takeoff_confirm_secs);
    println!("  on_ground_secs = {}", flight.on_ground_secs);
    println!("  release_sink_secs = {}", flight.release_sink_secs);
    println!(
        "  engine_noise = {} on / {} off",
        flight.engine_noise_on, flight.engine_noise_off
    );
    println!();

    let circling = &config.circling;
    println!("[circling]");
    println!("  external_trigger_cruise = {}", circling.external_trigger_cruise);
    println!("  min_turn_rate = {} deg/s", circling.min_turn_rate);
    println!(
        "  switch delays = {} s to climb / {} s to cruise",
        circling.cruise_climb_switch_secs, circling.climb_cruise_switch_secs
    );
    println!();

    let wind = &config.wind;
    println!("[wind]");
    println!("  auto_wind = {}", wind.auto_wind);
    println!("  external_wind = {}", wind.external_wind);
    match wind.manual_wind {
        Some(w) => println!("  manual_wind = {:.0}° {:.1} m/s", w.bearing, w.norm),
        None => println!("  manual_wind = (not set)"),
    }
    println!("  forecast_temperature = {} °C", wind.forecast_temperature);
    match &wind.sounding_file {
        Some(path) => println!("  sounding_file = {}", path.display()),
        None => println!("  sounding_file = (not set)"),
    }
    println!();

    println!("[devices]");
    for (priority, name) in config.devices.slots.iter().enumerate() {
        println!("  {}: {}", priority, name);
    }
    println!();

    println!("[runtime]");
    println!("  tick_interval_ms = {}", config.runtime.tick_interval_ms);
    println!();

    println!("[logging]");
    println!(
        "  {}",
        config.logging.directory.join(&config.logging.file).display()
    );

    Ok(())
}

/// Create the configuration file.
fn run_init(path: &Path, force: bool) -> Result<(), CliError> {
    if path.exists() && !force {
        println!("Configuration file already exists at {}", path.display());
        println!("Use --force to overwrite it with defaults.");
        return Ok(());
    }

    ConfigFile::default().save_to(path)?;
    println!("Wrote default configuration to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn temp_config() -> (tempfile::TempDir, PathBuf) {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("config.ini");
        (temp, path)
    }

    #[test]
    fn test_init_writes_defaults() {
        let (_temp, path) = temp_config();
        run(ConfigCommands::Init { force: false }, Some(&path)).unwrap();
        assert_eq!(ConfigFile::load_from(&path).unwrap(), ConfigFile::default());
    }

    #[test]
    fn test_init_keeps_existing_file_without_force() {
        let (_temp, path) = temp_config();
        std::fs::write(&path, "[runtime]\ntick_interval_ms = 200\n").unwrap();

        run(ConfigCommands::Init { force: false }, Some(&path)).unwrap();
        assert_eq!(ConfigFile::load_from(&path).unwrap().runtime.tick_interval_ms, 200);

        run(ConfigCommands::Init { force: true }, Some(&path)).unwrap();
        assert_eq!(ConfigFile::load_from(&path).unwrap(), ConfigFile::default());
    }

    #[test]
    fn test_show_reports_invalid_file() {
        let (_temp, path) = temp_config();
        std::fs::write(&path, "[flight]\ntakeoff_speed = 0\n").unwrap();
        assert!(matches!(
            run(ConfigCommands::Show, Some(&path)),
            Err(CliError::ConfigFile(_))
        ));
    }
}
