use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "golosura")]
#[command(author, version, about = "Telegram bot for running a photo-contest vote", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the bot (long polling)
    Run,

    /// Apply database migrations and exit
    Migrate,

    /// Print contest statistics and exit
    Stats,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
