use clap::Parser;
use php_winget::{
    errors::FALLBACK_EXIT_CODE,
    generate::{self, GenerateOpts},
    help, logger, CliError, GlobalOpts,
};
use php_winget_manifest::ReleaseQuery;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "generate")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(
    about = "Generate winget manifests for a PHP for Windows release line",
    long_about = "Looks up the latest release of a PHP line on windows.php.net and \
                  renders its winget manifests, commit message and PR description."
)]
struct Cli {
    #[command(flatten)]
    global: GlobalOpts,

    /// PHP release line, e.g. 8.3
    #[arg(value_name = "VERSION")]
    release_line: Option<String>,

    /// Thread-safety variant: ts (default) or nts
    variant: Option<String>,

    #[command(flatten)]
    opts: GenerateOpts,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(logger::verbosity_to_filter()));
    if tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .compact()
        .try_init()
        .is_err()
    {
        logger::debug("Tracing subscriber already installed");
    }
}

fn run(cli: &Cli, version: &str) -> Result<(), CliError> {
    // Arguments are checked before any config is read or network touched
    let query = ReleaseQuery::parse(version, cli.variant.as_deref())?;

    if let Err(e) = logger::init_with_verbosity(cli.global.verbosity_level()) {
        logger::warn(&format!("Failed to initialize logger: {}", e));
    }
    init_tracing();

    generate::handle_generate(&query, &cli.opts)?;
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    let Some(version) = cli.release_line.as_deref() else {
        help::show_usage();
        return;
    };

    if let Err(e) = run(&cli, version) {
        logger::error(&e.to_string());
        let code = e.exit_code();
        if code == FALLBACK_EXIT_CODE {
            logger::show_log_path();
        }
        std::process::exit(code);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_release_line_and_version_flag_coexist() {
        let Ok(cli) = Cli::try_parse_from(["generate", "8.3", "nts"]) else {
            panic!("positional arguments rejected");
        };
        assert_eq!(cli.release_line.as_deref(), Some("8.3"));
        assert_eq!(cli.variant.as_deref(), Some("nts"));

        let err = Cli::try_parse_from(["generate", "--version"]).err();
        assert!(err.is_some_and(|e| e.kind() == clap::error::ErrorKind::DisplayVersion));
    }

    #[test]
    fn test_no_release_line_parses() {
        let Ok(cli) = Cli::try_parse_from(["generate"]) else {
            panic!("bare invocation rejected");
        };
        assert!(cli.release_line.is_none());
    }
}
