// CLI module - command-line argument parsing and handlers
//
// Without a subcommand the chat UI starts (or a single headless exchange with
// --prompt). The `config` subcommand manages the config file:
// - config --show:  display effective configuration
// - config --path:  print the config file location
// - config --reset: regenerate the config file with defaults
// - config --edit:  open the config file in $EDITOR

use crate::config::{BackendKind, Config, VERSION};
use clap::{Parser, Subcommand};
use std::io::Write;
use std::process::Command;

/// Terminal chat client that streams LLM answers as rendered markdown
#[derive(Parser, Debug)]
#[command(name = "chatmark")]
#[command(version = VERSION)]
#[command(about = "Stream LLM answers into your terminal as highlighted markdown", long_about = None)]
pub struct Cli {
    /// Backend to use for this run (overrides config)
    #[arg(long, value_enum)]
    pub backend: Option<BackendKind>,

    /// Model to request (overrides config)
    #[arg(long)]
    pub model: Option<String>,

    /// Send one message, print the answer to stdout and exit
    #[arg(long)]
    pub prompt: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage configuration
    Config {
        /// Show effective configuration
        #[arg(long)]
        show: bool,

        /// Reset config file to defaults
        #[arg(long)]
        reset: bool,

        /// Open config file in $EDITOR
        #[arg(long)]
        edit: bool,

        /// Show config file path
        #[arg(long)]
        path: bool,
    },
}

impl Cli {
    /// Apply per-run overrides on top of the loaded config
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(kind) = self.backend {
            config.backend.switch_to(kind);
        }
        if let Some(model) = &self.model {
            config.backend.model = model.clone();
        }
    }
}

/// Handle the `config` subcommand. Returns the parsed CLI when the app
/// should run, or None when a command was handled (exit after).
pub fn handle_cli() -> Option<Cli> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Config {
            show,
            reset,
            edit,
            path,
        }) => {
            if path {
                handle_config_path();
            } else if show {
                handle_config_show();
            } else if reset {
                handle_config_reset();
            } else if edit {
                handle_config_edit();
            } else {
                println!("Usage: chatmark config [--show|--reset|--edit|--path]");
                println!();
                println!("Options:");
                println!("  --show    Display effective configuration");
                println!("  --reset   Reset config file to defaults");
                println!("  --edit    Open config file in $EDITOR");
                println!("  --path    Show config file path");
            }
            None
        }
        None => Some(cli),
    }
}

fn handle_config_path() {
    match Config::config_path() {
        Some(path) => println!("{}", path.display()),
        None => {
            eprintln!("Error: Could not determine config path");
            std::process::exit(1);
        }
    }
}

fn handle_config_show() {
    let config = Config::from_env();

    println!("# Effective configuration (env > file > defaults)");
    println!();
    println!("theme = {:?}", config.theme);
    println!("highlight_theme = {:?}", config.highlight_theme);
    println!("system_preamble = {} chars", config.system_preamble.chars().count());
    println!();
    println!("[backend]");
    println!("kind = {:?}", config.backend.kind.as_str());
    println!("api_url = {:?}", config.backend.api_url);
    println!("model = {:?}", config.backend.model);
    match &config.backend.api_key_env {
        Some(var) => {
            let present = std::env::var(var).is_ok();
            println!(
                "api_key_env = {:?}  # {}",
                var,
                if present { "set" } else { "not set" }
            );
        }
        None => println!("# api_key_env not used"),
    }
    println!();
    println!("[logging]");
    println!("level = {:?}", config.logging.level);
    println!("file_enabled = {}", config.logging.file_enabled);
    println!("file_dir = {:?}", config.logging.file_dir.display().to_string());
    println!("file_rotation = {:?}", config.logging.file_rotation.as_str());

    println!();
    if let Some(path) = Config::config_path() {
        if path.exists() {
            println!("# Source: {}", path.display());
        } else {
            println!("# Source: defaults (no config file)");
        }
    }
}

fn handle_config_reset() {
    let Some(path) = Config::config_path() else {
        eprintln!("Error: Could not determine config path");
        std::process::exit(1);
    };

    if path.exists() {
        eprint!(
            "Config file exists at {}. Overwrite? [y/N] ",
            path.display()
        );
        let _ = std::io::stderr().flush();

        let mut input = String::new();
        if std::io::stdin().read_line(&mut input).is_err()
            || !input.trim().eq_ignore_ascii_case("y")
        {
            println!("Aborted.");
            return;
        }
    }

    if let Err(e) = Config::default().save() {
        eprintln!("Error writing config: {}", e);
        std::process::exit(1);
    }

    println!("Config reset to defaults: {}", path.display());
}

fn handle_config_edit() {
    let Some(path) = Config::config_path() else {
        eprintln!("Error: Could not determine config path");
        std::process::exit(1);
    };

    if !path.exists() {
        Config::ensure_config_exists();
        println!("Created new config file: {}", path.display());
    }

    let editor = std::env::var("EDITOR")
        .or_else(|_| std::env::var("VISUAL"))
        .unwrap_or_else(|_| {
            if cfg!(windows) {
                "notepad".to_string()
            } else {
                "nano".to_string()
            }
        });

    match Command::new(&editor).arg(&path).status() {
        Ok(s) if s.success() => {}
        Ok(s) => {
            eprintln!("Editor exited with status: {}", s);
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("Failed to launch editor '{}': {}", editor, e);
            eprintln!("Set $EDITOR environment variable to your preferred editor");
            std::process::exit(1);
        }
    }
}
