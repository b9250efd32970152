use crate::manifest::MatchMode;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Detect the languages, frameworks and tools used by a source tree
#[derive(Parser, Debug)]
#[command(
    name = "stackprobe",
    about = "Detect the languages, frameworks and tools used by a source tree",
    version,
    author,
    long_about = "stackprobe walks a source tree once and reports the technologies it uses, \
                  based on file extensions, marker files, shebangs, editor modelines, \
                  content markers and manifest dependencies."
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true, value_name = "LEVEL", help = "Set logging level")]
    pub log_level: Option<String>,

    #[arg(short = 'v', long, global = true, help = "Enable debug logging")]
    pub verbose: bool,

    #[arg(
        short = 'q',
        long,
        global = true,
        conflicts_with = "verbose",
        help = "Quiet mode - only log errors"
    )]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(
        about = "Detect technologies in a directory",
        long_about = "Locates the project root under PATH, scans it once and prints the set \
                      of detected technology ids.\n\n\
                      Examples:\n  \
                      stackprobe detect\n  \
                      stackprobe detect /path/to/repo\n  \
                      stackprobe detect --format json --stats\n  \
                      stackprobe detect --catalog my-catalog.toml --match-mode token"
    )]
    Detect(DetectArgs),

    #[command(
        about = "Validate and list a detection catalog",
        long_about = "Loads the built-in catalog (or --catalog FILE), validates it and lists \
                      every technology with its signals.\n\n\
                      Examples:\n  \
                      stackprobe catalog\n  \
                      stackprobe catalog --catalog custom.yaml --format yaml"
    )]
    Catalog(CatalogArgs),
}

#[derive(Parser, Debug, Clone)]
pub struct DetectArgs {
    #[arg(
        value_name = "PATH",
        help = "Directory to scan (defaults to current directory)"
    )]
    pub path: Option<PathBuf>,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,

    #[arg(
        short = 'c',
        long,
        value_name = "FILE",
        help = "Catalog file (.toml, .json, .yaml) instead of the built-in catalog"
    )]
    pub catalog: Option<PathBuf>,

    #[arg(
        short = 'j',
        long,
        value_name = "N",
        help = "Walker threads (0 = auto, 1 = sequential)"
    )]
    pub threads: Option<usize>,

    #[arg(long, value_name = "SECONDS", help = "Stop scanning after this many seconds")]
    pub timeout: Option<u64>,

    #[arg(long, value_name = "DEPTH", help = "Maximum directory depth")]
    pub max_depth: Option<usize>,

    #[arg(long, value_enum, help = "How dependency names are matched in manifests")]
    pub match_mode: Option<MatchModeArg>,

    #[arg(long, help = "Scan PATH as given instead of locating the project root")]
    pub no_locate: bool,

    #[arg(
        short = 'x',
        long = "exclude",
        value_name = "DIR",
        help = "Additional directory name to exclude (repeatable)"
    )]
    pub exclude: Vec<String>,

    #[arg(long, help = "Honour .gitignore files")]
    pub respect_gitignore: bool,

    #[arg(long, help = "Include scan statistics in the output")]
    pub stats: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct CatalogArgs {
    #[arg(
        short = 'c',
        long,
        value_name = "FILE",
        help = "Catalog file to validate instead of the built-in catalog"
    )]
    pub catalog: Option<PathBuf>,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormatArg {
    Json,
    Yaml,
    Human,
}

impl From<OutputFormatArg> for super::output::OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Json => super::output::OutputFormat::Json,
            OutputFormatArg::Yaml => super::output::OutputFormat::Yaml,
            OutputFormatArg::Human => super::output::OutputFormat::Human,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchModeArg {
    Substring,
    Token,
}

impl From<MatchModeArg> for MatchMode {
    fn from(arg: MatchModeArg) -> Self {
        match arg {
            MatchModeArg::Substring => MatchMode::Substring,
            MatchModeArg::Token => MatchMode::Token,
        }
    }
}
