// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use log::{debug, error, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use doctrans::app_config::{self, Config};
use doctrans::app_controller::Controller;
use doctrans::setup::{self, SetupOptions};

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Translate a single markdown file
    File {
        /// Source document, e.g. ko/guide/intro.md
        #[arg(value_name = "FILE")]
        path: PathBuf,

        /// Overwrite an existing translation
        #[arg(short, long)]
        force: bool,

        /// Show debug output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Translate every document matching a pattern
    All {
        /// Overwrite existing translations
        #[arg(short, long)]
        force: bool,

        /// Glob relative to the docs root [default: ko/**/*.md]
        #[arg(short, long)]
        pattern: Option<String>,

        /// Files translated at the same time, 1 to 10 [default: 3]
        #[arg(short, long)]
        concurrent: Option<usize>,

        /// Show per-file results and debug output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Translate source documents as they change
    Watch,

    /// Check translated documents for leftover Korean, broken links and malformed YAML
    Validate {
        /// List every issue
        #[arg(short, long)]
        verbose: bool,
    },

    /// Write <root>/.env with an OpenRouter key and model, and check for translate-shell
    Setup {
        /// OpenRouter API key; omit to write commented placeholders
        #[arg(long)]
        api_key: Option<String>,

        /// OpenRouter model [default: mistralai/mistral-7b-instruct:free]
        #[arg(short, long)]
        model: Option<String>,

        /// Overwrite an existing .env
        #[arg(short, long)]
        force: bool,
    },

    /// Generate shell completions for doctrans
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// doctrans - Korean to English documentation translator
#[derive(Parser, Debug)]
#[command(name = "doctrans")]
#[command(version)]
#[command(about = "Translate Korean markdown documentation with AI backends and fallbacks")]
#[command(long_about = "doctrans translates markdown documents under ko/ (or docs-ko/) into en/ (or docs/).

Each document is translated as a whole by the first hosted backend that answers
(OpenRouter, GitHub Models, OpenAI, Anthropic). If that fails it is translated line by line,
falling back to the local `trans` tool and finally to the original text.

EXAMPLES:
    doctrans file ko/guide/intro.md           # Translate one document
    doctrans all -c 5                         # Translate all untranslated documents
    doctrans all -f -p 'docs-ko/**/*.md'      # Retranslate another tree
    doctrans watch                            # Translate on change until Ctrl-C
    doctrans validate -v                      # Report problems in en/
    doctrans setup --api-key sk-or-...        # Write .env for OpenRouter
    doctrans completions bash > doctrans.bash # Generate bash completions

CONFIGURATION:
    Optional doctrans.json in the docs root. Credentials come from the environment
    or a .env file: OPENROUTER_API_KEY, GITHUB_TOKEN, OPENAI_API_KEY, ANTHROPIC_API_KEY.
    Models can be overridden with OPENROUTER_MODEL, GITHUB_MODELS_MODEL, OPENAI_MODEL
    and ANTHROPIC_MODEL.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,

    /// Docs root containing ko/ and en/
    #[arg(long, global = true, default_value = ".")]
    root: PathBuf,

    /// Configuration file [default: <root>/doctrans.json]
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Set logging level
    #[arg(long, global = true, value_enum)]
    log_level: Option<CliLogLevel>,
}

// @struct: Custom logger implementation
struct CustomLogger;

impl CustomLogger {
    // @initializes: Global logger; verbosity is controlled by log::set_max_level
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        log::set_boxed_logger(Box::new(CustomLogger))?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: Emoji for log level
    fn get_emoji_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "❌ ",
            Level::Warn => "🚧 ",
            Level::Info => " ",
            Level::Debug => "🔍 ",
            Level::Trace => "📋 ",
        }
    }

    // @returns: ANSI color code for log level
    fn get_color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "1;31",
            Level::Warn => "1;33",
            Level::Info => "1;32",
            Level::Debug => "1;36",
            Level::Trace => "1;35",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let level = record.level();

            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "\x1B[{}m{} {} {}\x1B[0m",
                Self::get_color_for_level(level),
                now,
                Self::get_emoji_for_level(level),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

fn level_filter(level: &app_config::LogLevel) -> LevelFilter {
    match level {
        app_config::LogLevel::Error => LevelFilter::Error,
        app_config::LogLevel::Warn => LevelFilter::Warn,
        app_config::LogLevel::Info => LevelFilter::Info,
        app_config::LogLevel::Debug => LevelFilter::Debug,
        app_config::LogLevel::Trace => LevelFilter::Trace,
    }
}

fn is_verbose(command: &Commands) -> bool {
    match command {
        Commands::File { verbose, .. } | Commands::All { verbose, .. } | Commands::Validate { verbose } => *verbose,
        Commands::Watch | Commands::Setup { .. } | Commands::Completions { .. } => false,
    }
}

/// Defaults, then config file, then environment, then command line
fn load_config(cli: &CommandLineOptions) -> Result<Config> {
    let env_file = cli.root.join(".env");
    match dotenvy::from_path(&env_file) {
        Ok(()) => debug!("Loaded {}", env_file.display()),
        Err(e) if e.not_found() => {}
        Err(e) => return Err(e).with_context(|| format!("Failed to load {}", env_file.display())),
    }

    let config_path = cli.config.clone().unwrap_or_else(|| cli.root.join("doctrans.json"));
    let mut config = Config::load(&config_path)?;
    config.apply_env();

    if let Some(log_level) = &cli.log_level {
        config.log_level = log_level.clone().into();
    } else if is_verbose(&cli.command) {
        config.log_level = app_config::LogLevel::Debug;
    }

    Ok(config)
}

async fn run(cli: CommandLineOptions) -> Result<()> {
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = CommandLineOptions::command();
        generate(*shell, &mut cmd, "doctrans", &mut std::io::stdout());
        return Ok(());
    }

    let config = load_config(&cli)?;
    log::set_max_level(level_filter(&config.log_level));

    if let Commands::Setup { api_key, model, force } = &cli.command {
        let options = SetupOptions {
            api_key: api_key.clone(),
            model: model.clone(),
            force: *force,
        };
        setup::run_setup(&cli.root, &options, &config.cli_tool.program)?;
        return Ok(());
    }

    let controller = Controller::with_config(config, &cli.root)?;

    match cli.command {
        Commands::File { path, force, .. } => {
            let force = force || controller.config().force_overwrite;
            controller.translate_file(&path, force).await?;
        }
        Commands::All {
            force,
            pattern,
            concurrent,
            verbose,
        } => {
            let config = controller.config();
            let pattern = pattern.unwrap_or_else(|| config.pattern.clone());
            let concurrent = concurrent.unwrap_or(config.concurrency_limit);
            let force = force || config.force_overwrite;
            controller.translate_all(&pattern, force, concurrent, verbose).await?;
        }
        Commands::Watch => controller.watch().await?,
        Commands::Validate { verbose } => {
            controller.validate(verbose)?;
        }
        Commands::Setup { .. } | Commands::Completions { .. } => {}
    }

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(e) = CustomLogger::init(LevelFilter::Info) {
        eprintln!("Failed to initialize logger: {}", e);
    }

    let cli = CommandLineOptions::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
