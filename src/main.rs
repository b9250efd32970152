use stackprobe::cli::commands::{CliArgs, Commands};
use stackprobe::cli::handlers::{handle_catalog, handle_detect};
use stackprobe::util::logging::{self, LoggingConfig};
use stackprobe::VERSION;

use clap::Parser;
use tracing::{debug, Level};

fn main() {
    let args = CliArgs::parse();
    init_logging_from_args(&args);

    debug!("stackprobe v{} starting", VERSION);
    debug!("Arguments: {:?}", args);

    let exit_code = match &args.command {
        Commands::Detect(detect_args) => handle_detect(detect_args),
        Commands::Catalog(catalog_args) => handle_catalog(catalog_args),
    };

    std::process::exit(exit_code);
}

/// Flags win over `STACKPROBE_LOG_LEVEL`; `RUST_LOG` wins over both
fn init_logging_from_args(args: &CliArgs) {
    let mut config = logging::config_from_env();

    if let Some(level_str) = &args.log_level {
        config.level = logging::parse_level(level_str).unwrap_or_else(|| {
            eprintln!(
                "Invalid log level '{}', defaulting to WARN. Valid levels: trace, debug, info, warn, error",
                level_str
            );
            Level::WARN
        });
    } else if args.verbose {
        config = LoggingConfig {
            use_json: config.use_json,
            ..LoggingConfig::development()
        };
    } else if args.quiet {
        config = LoggingConfig {
            use_json: config.use_json,
            ..LoggingConfig::with_level(Level::ERROR)
        };
    }

    logging::init_logging(config);
}
