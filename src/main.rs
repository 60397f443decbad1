use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use mikla::config::{MiklaPaths, Overrides, Settings};
use mikla::session::{EditSession, Outcome, TerminalPrompt};

#[derive(Parser, Debug)]
#[command(
    name = "mikla",
    version,
    about = "Edit GnuPG-encrypted files without writing plaintext to disk",
    long_about = "mikla decrypts a symmetrically-encrypted file into a memory-backed \
                  directory, opens it in your editor, re-encrypts it if you changed \
                  anything, and always deletes the decrypted copy afterwards."
)]
struct Cli {
    /// The encrypted file to edit
    encrypted_file: PathBuf,

    /// Editor to use [default: $EDITOR]
    #[arg(short, long, env = "EDITOR", hide_env_values = true)]
    editor: Option<String>,

    /// Path to a temporary (memory-backed) file system [default: /dev/shm]
    #[arg(short, long, value_name = "PATH")]
    tmpfs: Option<PathBuf>,

    /// GnuPG program name or path [default: gpg]
    #[arg(long, env = "MIKLA_GPG", value_name = "PROGRAM")]
    gpg: Option<String>,

    /// Write binary instead of ASCII-armored ciphertext
    #[arg(long)]
    no_armor: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    };
    // A second init in the same process is harmless to ignore.
    let _ = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .try_init();
}

fn run(cli: Cli) -> Result<()> {
    // Resolve configuration once; nothing below reads the environment
    let paths = MiklaPaths::new();
    let settings = Settings::load_or_default(&paths).context("Could not load settings")?;
    let config = settings
        .resolve(Overrides {
            editor: cli.editor,
            tmpfs: cli.tmpfs,
            gpg_program: cli.gpg,
            no_armor: cli.no_armor,
        })
        .context("Could not resolve configuration")?;

    let session = EditSession::from_config(&config)
        .with_context(|| format!("Invalid editor command {:?}", config.editor))?;
    let outcome = session.run(
        &cli.encrypted_file,
        &mut TerminalPrompt,
        &mut std::io::stdout(),
    )?;

    if outcome == Outcome::Unchanged {
        println!("No changes made.");
    }

    Ok(())
}
