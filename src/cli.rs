use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Send a single text to the translation endpoint
    Translate {
        /// Text to translate
        #[arg(short, long)]
        text: String,

        /// Target language (ar, en)
        #[arg(short = 'l', long, default_value = "en")]
        target_lang: String,

        /// Security token sent in the CSRF header
        #[arg(long)]
        csrf_token: Option<String>,
    },

    /// Bind the two name fields and type into them from stdin
    ///
    /// Each line is `<field-id> <text>`; `:show` prints both fields.
    Watch {
        /// Security token placed in the page's hidden input
        #[arg(long)]
        csrf_token: Option<String>,

        /// Override the debounce delay in milliseconds
        #[arg(long)]
        delay_ms: Option<u64>,
    },

    /// Write the default configuration to a file
    InitConfig {
        /// Output configuration file
        #[arg(short, long, default_value = "config.toml")]
        output: PathBuf,
    },
}
