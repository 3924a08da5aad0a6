//! Inguard CLI binary.
//!
//! Input sanitization and threat detection for untrusted strings.
//!
//! # Commands
//!
//! - `sanitize` - Rewrite text into a safe form
//! - `classify` - Report threat signatures found in text or JSON
//! - `validate` - Validate a URL or email address
//! - `audit` - Analyze log lines and print a security report

use std::io::{self, BufRead, BufReader, Read};
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use inguard::{Config, Guard, PatternMatch, VERSION};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "inguard")]
#[command(version = VERSION)]
#[command(about = "Inguard - input sanitization and threat detection", long_about = None)]
struct Cli {
    /// Config file (default: <config_dir>/inguard/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rewrite text into a safe form
    Sanitize {
        /// Text to sanitize (or - for stdin)
        input: Option<String>,

        /// Input file path
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Maximum output length in chars
        #[arg(long)]
        max_length: Option<usize>,

        /// Upper bound on rewrite passes
        #[arg(long)]
        max_passes: Option<usize>,

        /// Keep HTML markup
        #[arg(long)]
        allow_html: bool,
    },

    /// Report threat signatures found in the input
    Classify {
        /// Content to classify (or - for stdin)
        input: Option<String>,

        /// Input file path
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Parse the input as JSON and classify it structurally
        #[arg(short, long)]
        structured: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate a URL or email address
    Validate {
        #[command(subcommand)]
        target: ValidateTarget,
    },

    /// Analyze log lines and print a security report
    Audit {
        /// Log file path (default: stdin)
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Source the log lines are attributed to
        #[arg(short, long, default_value = inguard::guard::DEFAULT_LOG_SOURCE)]
        actor: String,
    },
}

#[derive(Subcommand)]
enum ValidateTarget {
    /// Validate a URL
    Url {
        /// URL to validate
        value: String,
    },

    /// Validate an email address
    Email {
        /// Email address to validate
        value: String,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_writer(io::stderr)
        .init();

    let config = Config::load(cli.config.as_deref())?;
    let guard = Guard::new(config)?;

    match cli.command {
        Commands::Sanitize {
            input,
            file,
            max_length,
            max_passes,
            allow_html,
        } => cmd_sanitize(&guard, input, file, max_length, max_passes, allow_html),
        Commands::Classify {
            input,
            file,
            structured,
            json,
        } => cmd_classify(&guard, input, file, structured, json),
        Commands::Validate { target } => cmd_validate(&guard, target),
        Commands::Audit { file, actor } => cmd_audit(&guard, file, &actor),
    }
}

fn cmd_sanitize(
    guard: &Guard,
    input: Option<String>,
    file: Option<PathBuf>,
    max_length: Option<usize>,
    max_passes: Option<usize>,
    allow_html: bool,
) -> anyhow::Result<()> {
    let content = read_input(input, file)?;

    let mut config = guard.config().sanitize;
    if let Some(max) = max_length {
        config = config.with_max_length(max);
    }
    if let Some(passes) = max_passes {
        config = config.with_max_passes(passes);
    }
    if allow_html {
        config = config.allow_html(true);
    }

    println!("{}", guard.sanitize_with(&content, &config));
    Ok(())
}

fn cmd_classify(
    guard: &Guard,
    input: Option<String>,
    file: Option<PathBuf>,
    structured: bool,
    json_output: bool,
) -> anyhow::Result<()> {
    let content = read_input(input, file)?;

    let matches = if structured {
        let value: Value = serde_json::from_str(&content)?;
        guard.classify_structured(&value)
    } else {
        guard.classify(&content)
    };

    if json_output {
        let output = serde_json::json!({
            "clean": matches.is_empty(),
            "matches": matches,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if matches.is_empty() {
        println!("CLEAN");
    } else {
        println!("THREATS DETECTED ({})", matches.len());
        println!();
        print_matches(&matches);
    }

    if !matches.is_empty() {
        std::process::exit(1);
    }
    Ok(())
}

fn cmd_validate(guard: &Guard, target: ValidateTarget) -> anyhow::Result<()> {
    let result = match target {
        ValidateTarget::Url { value } => guard.validate_url(&value).map(|url| url.to_string()),
        ValidateTarget::Email { value } => guard.validate_email(&value),
    };

    match result {
        Ok(valid) => {
            println!("VALID: {valid}");
            Ok(())
        },
        Err(err) => {
            eprintln!("INVALID: {err}");
            std::process::exit(1);
        },
    }
}

fn cmd_audit(guard: &Guard, file: Option<PathBuf>, actor: &str) -> anyhow::Result<()> {
    let reader: Box<dyn BufRead> = match file {
        Some(path) => Box::new(BufReader::new(std::fs::File::open(path)?)),
        None => Box::new(BufReader::new(io::stdin())),
    };

    let mut suspicious = 0usize;
    for line in reader.lines() {
        if guard.analyze_log_entry_from(actor, &line?) {
            suspicious += 1;
        }
    }
    tracing::info!(suspicious, "audit complete");

    println!("{}", serde_json::to_string_pretty(&guard.report())?);
    Ok(())
}

fn print_matches(matches: &[PatternMatch]) {
    for m in matches {
        println!("  - {} ({}) severity: {}", m.category, m.rule_id, m.severity);
        println!("    evidence: {}", m.evidence);
    }
}

fn read_input(input: Option<String>, file: Option<PathBuf>) -> anyhow::Result<String> {
    if let Some(path) = file {
        Ok(std::fs::read_to_string(path)?)
    } else if let Some(s) = input {
        if s == "-" {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            Ok(buffer)
        } else {
            Ok(s)
        }
    } else {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    }
}
