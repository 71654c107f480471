use anyhow::Result;
use clap::{Parser, Subcommand};
use std::process::Command;

#[derive(Parser)]
#[command(name = "xtask", about = "Workspace automation for cadence")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run all checks: fmt, clippy, tests, doc
    Check,
    /// Run cargo fmt --check on all crates
    Fmt,
    /// Run clippy on all crates
    Clippy,
    /// Run all tests
    Test,
    /// Build rustdoc for the workspace
    Doc,
    /// Build the entire workspace
    Build,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check => {
            cargo("fmt --check", &["fmt", "--all", "--", "--check"])?;
            cargo(
                "clippy",
                &["clippy", "--workspace", "--all-targets", "--", "-D", "warnings"],
            )?;
            cargo("test", &["test", "--workspace"])?;
            cargo("doc", &["doc", "--workspace", "--no-deps"])?;
        }
        Commands::Fmt => cargo("fmt --check", &["fmt", "--all", "--", "--check"])?,
        Commands::Clippy => cargo(
            "clippy",
            &["clippy", "--workspace", "--all-targets", "--", "-D", "warnings"],
        )?,
        Commands::Test => cargo("test", &["test", "--workspace"])?,
        Commands::Doc => cargo("doc", &["doc", "--workspace", "--no-deps"])?,
        Commands::Build => cargo("build", &["build", "--workspace"])?,
    }

    Ok(())
}

fn cargo(label: &str, args: &[&str]) -> Result<()> {
    println!("==> Running cargo {label}");
    let status = Command::new("cargo").args(args).status()?;
    if !status.success() {
        anyhow::bail!("cargo {label} failed");
    }
    Ok(())
}
