use clap::Parser;
use colored::Colorize;
use dialoguer::console::Term;
use vaultscout::cmd;
use vaultscout::error::VaultScoutError;

#[derive(Parser, Debug)]
#[command(
    name = "vaultscout",
    about = "Sign in with a device code and list the key vaults of a subscription",
    version,
    long_about = "Signs in through the device code flow, discovers the account's tenant,\n\
                  lets you pick a subscription and prints the Azure Key Vaults it contains."
)]
struct Cli {
    #[command(flatten)]
    scan: cmd::scan::ScanArgs,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

/// Put the terminal back the way a half-finished picker or spinner may have
/// left it, report the interruption and return its exit code.
fn interrupted() -> i32 {
    let _ = Term::stderr().show_cursor();
    let _ = Term::stdout().show_cursor();

    let err = VaultScoutError::Cancelled;
    eprintln!("\n{} {}", "Error:".red().bold(), err);
    err.exit_code()
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if cli.verbose {
        tracing_subscriber::fmt()
            .with_env_filter("vaultscout=debug")
            .with_writer(std::io::stderr)
            .init();
    }

    // The subscription prompt blocks on stdin, so Ctrl-C is handled off the
    // main task.
    tokio::spawn(async {
        if tokio::signal::ctrl_c().await.is_ok() {
            std::process::exit(interrupted());
        }
    });

    if let Err(e) = cmd::scan::scan(cli.scan).await {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(e.exit_code());
    }
}
