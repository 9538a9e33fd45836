use clap::Parser;

/// Aula — terminal client for the tutoring assistant backend.
#[derive(Parser, Debug)]
#[command(name = "aula", version, about)]
pub struct Args {
    /// Backend base URL (overrides AULA_BASE_URL).
    #[arg(short = 'u', long)]
    pub base_url: Option<String>,

    /// Log level override (debug, info, warn, error).
    #[arg(long)]
    pub log_level: Option<String>,
}

pub fn parse() -> Args {
    Args::parse()
}
