use clap::{ArgAction, Parser as ClapParser, Subcommand};
use rule_dsl::cli::{self, CliError, EngineOptions};
use rule_dsl::{Engine, EvalContext};
use std::io::{self, Read};
use std::path::PathBuf;

#[derive(ClapParser)]
#[command(name = "rule-dsl")]
#[command(about = "rule-dsl - A small expression language for filters and business rules")]
#[command(version)]
struct Cli {
    /// JSON file with engine limits (`max_source_len`, `max_depth`)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Longest accepted expression, in characters
    #[arg(long, global = true)]
    max_length: Option<usize>,

    /// Deepest accepted nesting
    #[arg(long, global = true)]
    max_depth: Option<usize>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate an expression without evaluating it
    Check {
        expression: String,

        /// Print the full validation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Evaluate an expression and print the result as JSON
    Eval {
        expression: String,

        /// JSON object of bindings (reads from stdin if not provided)
        #[arg(short, long)]
        context: Option<String>,

        /// Pretty-print the output
        #[arg(short, long)]
        pretty: bool,
    },

    /// Evaluate an expression as a boolean rule
    Rule {
        expression: String,

        /// JSON object of bindings (reads from stdin if not provided)
        #[arg(short, long)]
        context: Option<String>,

        /// Rule name reported in the outcome
        #[arg(long, default_value = "rule")]
        name: String,
    },

    /// Print the tokens of an expression
    Tokens { expression: String },

    /// List the available functions
    Functions,
}

fn main() {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    let options = EngineOptions {
        config: cli.config.as_deref(),
        max_length: cli.max_length,
        max_depth: cli.max_depth,
    };

    let result = cli::load_engine(&options).and_then(|engine| run(&engine, cli.command));
    match result {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    }
}

/// Runs one command; `Ok(false)` means the command reported a failure itself.
fn run(engine: &Engine, command: Commands) -> Result<bool, CliError> {
    match command {
        Commands::Check { expression, json } => {
            let validation = cli::execute_check(engine, &expression);
            if json {
                println!("{}", serde_json::to_string_pretty(&validation)?);
            } else if let Some(normalized) = &validation.normalized {
                println!("valid: {} ({} nodes)", normalized, validation.node_count);
            } else {
                for report in &validation.errors {
                    eprintln!("{}\n", cli::render_report(&expression, report));
                }
            }
            Ok(validation.is_valid)
        }

        Commands::Eval {
            expression,
            context,
            pretty,
        } => {
            let context = read_context(context)?;
            let value = cli::execute_eval(engine, &expression, &context)?;
            let json = if pretty {
                serde_json::to_string_pretty(&value)?
            } else {
                serde_json::to_string(&value)?
            };
            println!("{}", json);
            Ok(true)
        }

        Commands::Rule {
            expression,
            context,
            name,
        } => {
            let context = read_context(context)?;
            let outcome = cli::execute_rule(engine, &name, &expression, &context)?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
            Ok(true)
        }

        Commands::Tokens { expression } => {
            let mut clean = true;
            for item in cli::list_tokens(&expression) {
                match item {
                    Ok(token) => println!(
                        "{}:{}\t{}",
                        token.position.line,
                        token.position.column,
                        token.kind.describe()
                    ),
                    Err(diagnostic) => {
                        clean = false;
                        eprintln!("{}", cli::render_diagnostic(&expression, &diagnostic));
                    }
                }
            }
            Ok(clean)
        }

        Commands::Functions => {
            for signature in cli::list_functions(engine) {
                println!("{}", signature);
            }
            Ok(true)
        }
    }
}

fn read_context(context: Option<String>) -> Result<EvalContext, CliError> {
    let input = match context {
        Some(s) => Some(s),
        None if !atty::is(atty::Stream::Stdin) => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            Some(buffer)
        }
        None => None,
    };
    cli::parse_context(input.as_deref())
}
