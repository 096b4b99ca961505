use super::Parser;

/// Session token service.
#[derive(Parser, Debug)]
#[command(version, about)]
pub struct Cli {
    /// Path to a TOML settings file; defaults to settings/dev.toml or
    /// settings/release.toml depending on the build profile.
    #[arg(long)]
    pub settings: Option<String>,
}
