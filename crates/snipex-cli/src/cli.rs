use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    author = "snipex contributors",
    version = env!("CARGO_PKG_VERSION"),
    about = "snipex - A background text expander",
    long_about = "snipex watches what you type and replaces registered triggers with snippet text."
)]
pub struct Snipex {
    #[clap(long, short, global = true, help = "Enable debug logging")]
    pub verbose: bool,

    #[clap(subcommand)]
    pub commands: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start expanding triggers until interrupted
    Run {
        #[clap(long, short, help = "Snippet file (defaults to ~/.snipex/snippets.json)")]
        snippets: Option<PathBuf>,
    },
    /// Resolve placeholders in TEXT and print the result
    Resolve {
        #[clap(help = "Snippet content, e.g. \"Hi {{USER}}{{CURSOR}}\"")]
        text: String,
    },
    /// List registered triggers
    List {
        #[clap(long, short, help = "Snippet file (defaults to ~/.snipex/snippets.json)")]
        snippets: Option<PathBuf>,
    },
    /// Show or request input-monitoring permission
    Permission {
        #[clap(long, short, help = "Open the system permission request flow")]
        request: bool,
    },
    /// Print the effective engine configuration
    Config,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Snipex::command().debug_assert();
    }

    #[test]
    fn test_parse_run_with_snippet_file() {
        let args = Snipex::parse_from(["snipex", "-v", "run", "--snippets", "/tmp/s.json"]);
        assert!(args.verbose);
        match args.commands {
            Commands::Run { snippets } => {
                assert_eq!(snippets, Some(PathBuf::from("/tmp/s.json")));
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn test_parse_resolve_text() {
        let args = Snipex::parse_from(["snipex", "resolve", "Hi {{USER}}"]);
        assert!(matches!(args.commands, Commands::Resolve { text } if text == "Hi {{USER}}"));
    }
}
