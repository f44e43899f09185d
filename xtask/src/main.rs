use anyhow::Result;
use clap::{Parser, Subcommand};
use std::process::Command;

#[derive(Parser)]
#[command(name = "xtask", about = "Workspace automation for gridview")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run fmt, clippy, tests and docs
    Check,
    /// Run cargo fmt --check on all crates
    Fmt,
    /// Run clippy on all crates with warnings denied
    Clippy,
    /// Run all tests
    Test,
    /// Run the visibility-cull micro-benchmark
    Bench,
    /// Replay the scripted session headless as a smoke test
    Smoke,
    /// Build rustdoc for the workspace
    Doc,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check => {
            fmt()?;
            clippy()?;
            test()?;
            doc()?;
        }
        Commands::Fmt => fmt()?,
        Commands::Clippy => clippy()?,
        Commands::Test => test()?,
        Commands::Bench => cargo(
            "bench",
            &["bench", "-p", "gridview-stream", "--bench", "bench_visibility_cull"],
        )?,
        Commands::Smoke => cargo(
            "smoke",
            &[
                "run",
                "-p",
                "gridview-cli",
                "--",
                "--highlights",
                "20000",
                "scenario",
            ],
        )?,
        Commands::Doc => doc()?,
    }

    Ok(())
}

fn fmt() -> Result<()> {
    cargo("fmt", &["fmt", "--all", "--", "--check"])
}

fn clippy() -> Result<()> {
    cargo(
        "clippy",
        &["clippy", "--workspace", "--all-targets", "--", "-D", "warnings"],
    )
}

fn test() -> Result<()> {
    cargo("test", &["test", "--workspace"])
}

fn doc() -> Result<()> {
    cargo("doc", &["doc", "--workspace", "--no-deps"])
}

fn cargo(step: &str, args: &[&str]) -> Result<()> {
    println!("==> cargo {}", args.join(" "));
    let status = Command::new("cargo").args(args).status()?;
    if !status.success() {
        anyhow::bail!("{step} failed ({status})");
    }
    Ok(())
}
