use clap::{Parser, Subcommand};
use console::style;
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::runtime::Runtime;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use markcheck::report;
use markcheck::{ConfigLoader, Orchestrator, ValidationRequest, ValidationStatus};

#[derive(Parser)]
#[command(name = "markcheck")]
#[command(
    version,
    about = "IC marking authenticity validation via a chain of external providers"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, short, help = "Path to a TOML config file")]
    config: Option<PathBuf>,

    #[arg(long)]
    verbose: bool,

    #[arg(long, short)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate an OCR-detected marking text
    Validate {
        #[arg(help = "Marking text as read from the chip")]
        text: String,
        #[arg(long, help = "Path to the preprocessed marking image (passed through to providers)")]
        image: Option<PathBuf>,
        #[arg(long, help = "Gemini API key (overrides config and GEMINI_API_KEY)")]
        gemini_key: Option<String>,
        #[arg(long, help = "Gemini model override")]
        gemini_model: Option<String>,
        #[arg(long, help = "DeepSeek API key (overrides config and DEEPSEEK_API_KEY)")]
        deepseek_key: Option<String>,
        #[arg(long, help = "DeepSeek model override")]
        deepseek_model: Option<String>,
        #[arg(long, help = "SerpAPI key (overrides config and SERPAPI_KEY)")]
        serpapi_key: Option<String>,
        #[arg(long, help = "Webhook workflow URL (overrides config and N8N_WEBHOOK_URL)")]
        webhook_url: Option<String>,
    },

    /// Show the provider chain the current credentials yield
    Chain,
}

/// Set up panic handler for graceful error reporting
fn setup_panic_handler() {
    let default_hook = std::panic::take_hook();

    std::panic::set_hook(Box::new(move |panic_info| {
        let message = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };

        eprintln!("\n\x1b[1;31m━━━ PANIC ━━━\x1b[0m");
        eprintln!("\x1b[31mMarkCheck encountered an unexpected error:\x1b[0m");
        eprintln!("  {}", message);

        if let Some(location) = panic_info.location() {
            eprintln!(
                "\x1b[90mLocation: {}:{}:{}\x1b[0m",
                location.file(),
                location.line(),
                location.column()
            );
        }
        eprintln!();

        default_hook(panic_info);
    }));
}

fn main() -> ExitCode {
    setup_panic_handler();

    match run_cli() {
        Ok(exit) => exit,
        Err(e) => {
            eprintln!("\x1b[31mError:\x1b[0m {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run_cli() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = match &cli.config {
        Some(path) => ConfigLoader::load_from_file(path)?,
        None => ConfigLoader::load()?,
    };

    match cli.command {
        Commands::Validate {
            text,
            image,
            gemini_key,
            gemini_model,
            deepseek_key,
            deepseek_model,
            serpapi_key,
            webhook_url,
        } => {
            // CLI flags beat every config layer
            config.gemini.api_key = gemini_key.or(config.gemini.api_key);
            config.gemini.model = gemini_model.or(config.gemini.model);
            config.deepseek.api_key = deepseek_key.or(config.deepseek.api_key);
            config.deepseek.model = deepseek_model.or(config.deepseek.model);
            config.search.api_key = serpapi_key.or(config.search.api_key);
            config.webhook.url = webhook_url.or(config.webhook.url);
            config.validate()?;

            let orchestrator = Orchestrator::from_config(&config)?;
            let mut request = ValidationRequest::new(&text);
            request.preprocessed_image_ref = image.map(|p| p.display().to_string());

            let rt = Runtime::new()?;
            let (result, chain_report) =
                rt.block_on(orchestrator.validate_with_report(&request));

            report::print_report(&result, &text);
            if cli.verbose {
                println!("\n{}", style("Chain attempts").bold());
                print!("{}", report::render_attempts(&chain_report));
                println!("Total: {}ms", chain_report.total_duration_ms);
            }

            // Verdicts map to exit codes so the binary composes in scripts:
            // PASS = 0, FAIL = 1, WARNING = 2.
            Ok(match result.status {
                ValidationStatus::Pass => ExitCode::SUCCESS,
                ValidationStatus::Fail => ExitCode::FAILURE,
                ValidationStatus::Warning => ExitCode::from(2),
            })
        }
        Commands::Chain => {
            let orchestrator = Orchestrator::from_config(&config)?;
            println!("{}", style("Provider chain").bold());
            for (index, kind) in orchestrator.chain().iter().enumerate() {
                println!("  {}. {}", index + 1, kind);
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}
