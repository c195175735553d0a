use clap::{Parser, Subcommand};
use locale_fields::{config, localize, output};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "locale-fields")]
#[command(version)]
#[command(about = "Resolve key@locale overrides in content field documents")]
#[command(long_about = "\
Resolve key@locale overrides in content field documents

Any key in a JSON or TOML document may carry a locale tag. For a target
locale, each key collapses to its most specific override:

  {
    \"title\":      \"Home\",        # base value
    \"title@fr\":   \"Accueil\",     # exact locale
    \"title@de|at\": \"Startseite\", # any of several locales
    \"title@es.*\": \"Inicio\",      # pattern (es, es_MX, ...)
    \"list@\":      [...],         # legacy override slot
    \"list@fr@\":   [...]          # legacy slot, French
  }

Precedence: exact > pattern > bare `key@` > base. Among equals, the key
declared last wins.

Content structure:

  content/
  ├── config.toml          # Locales and resolve settings (optional)
  ├── home.json            # → dist/<locale>/home.json
  └── pages/
      └── about.toml       # → dist/<locale>/pages/about.json

Run 'locale-fields gen-config' to generate a documented config.toml.")]
struct Cli {
    /// Content directory
    #[arg(long, default_value = "content", global = true)]
    source: PathBuf,

    /// Output directory
    #[arg(long, default_value = "dist", global = true)]
    output: PathBuf,

    /// Log resolution details (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve one document and print it as JSON
    Resolve {
        /// JSON or TOML document
        file: PathBuf,
        /// Target locale; omit to keep only base and bare-tag values
        #[arg(long)]
        locale: Option<String>,
        /// Print on a single line
        #[arg(long)]
        compact: bool,
    },
    /// Localize every document for every configured locale
    Build {
        /// Disable the document cache and resolve every document
        #[arg(long)]
        no_cache: bool,
    },
    /// Validate every document without writing output
    Check,
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Resolve {
            file,
            locale,
            compact,
        } => {
            let site_config = config::load_config(&cli.source)?;
            let resolved =
                localize::resolve_document(&file, locale.as_deref(), &site_config.resolve)?;
            let json = if compact {
                serde_json::to_string(&resolved)?
            } else {
                serde_json::to_string_pretty(&resolved)?
            };
            println!("{}", json);
        }
        Command::Build { no_cache } => {
            let site_config = config::load_config(&cli.source)?;
            init_thread_pool(&site_config.processing);
            println!("==> Localizing {} → {}", cli.source.display(), cli.output.display());
            let report = localize::localize(&cli.source, &cli.output, &site_config, !no_cache)?;
            output::print_build_output(&report);
        }
        Command::Check => {
            let site_config = config::load_config(&cli.source)?;
            init_thread_pool(&site_config.processing);
            println!("==> Checking {}", cli.source.display());
            let report = localize::check(&cli.source, &site_config)?;
            output::print_check_output(&report);
            if !report.is_ok() {
                std::process::exit(1);
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// `RUST_LOG` wins; otherwise warnings, or debug with `--verbose`.
fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores — user can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
