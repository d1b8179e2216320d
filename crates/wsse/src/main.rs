#![forbid(unsafe_code)]

//! wsse CLI: sign, verify, encrypt and decrypt SOAP envelopes.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process;
use tracing_subscriber::EnvFilter;
use wsse::{Error, MessageContext, MessagePlugin, WssePlugin};

#[derive(Parser)]
#[command(
    name = "wsse",
    about = "WS-Security X.509 signing and encryption of SOAP envelopes",
    version
)]
struct Cli {
    /// Verbose output (debug logging)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign Body and Timestamp
    Sign {
        /// Input envelope
        file: PathBuf,

        /// Private key (PEM or DER)
        #[arg(short = 'k', long)]
        key: PathBuf,

        /// Certificate of the private key
        #[arg(long)]
        cert: PathBuf,

        /// Also embed the certificate in the signature
        #[arg(long)]
        embed_cert: bool,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Verify the signature of an envelope
    Verify {
        /// Input envelope
        file: PathBuf,

        /// Certificate of the signer
        #[arg(long)]
        cert: PathBuf,
    },

    /// Encrypt the first Body element for a recipient
    Encrypt {
        /// Input envelope
        file: PathBuf,

        /// Recipient certificate
        #[arg(long)]
        cert: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Decrypt an envelope
    Decrypt {
        /// Input envelope
        file: PathBuf,

        /// Private key (PEM or DER)
        #[arg(short = 'k', long)]
        key: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Sign with our key, then encrypt for the peer
    Send {
        file: PathBuf,
        #[arg(short = 'k', long)]
        key: PathBuf,
        #[arg(long)]
        cert: PathBuf,
        #[arg(long)]
        their_cert: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Decrypt with our key, then verify against the peer
    Receive {
        file: PathBuf,
        #[arg(short = 'k', long)]
        key: PathBuf,
        #[arg(long)]
        cert: PathBuf,
        #[arg(long)]
        their_cert: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Sign {
            file,
            key,
            cert,
            embed_cert,
            output,
        } => cmd_sign(&file, &key, &cert, embed_cert, output),
        Commands::Verify { file, cert } => cmd_verify(&file, &cert),
        Commands::Encrypt { file, cert, output } => {
            run(&file, output, |data| wsse::encrypt(data, &cert))
        }
        Commands::Decrypt { file, key, output } => {
            run(&file, output, |data| wsse::decrypt(data, &key))
        }
        Commands::Send {
            file,
            key,
            cert,
            their_cert,
            output,
        } => run(&file, output, |data| {
            let mut message = MessageContext::new(data.to_vec());
            WssePlugin::new(&key, &cert, &their_cert).sending(&mut message)?;
            Ok(message.envelope)
        }),
        Commands::Receive {
            file,
            key,
            cert,
            their_cert,
            output,
        } => run(&file, output, |data| {
            let mut message = MessageContext {
                envelope: Vec::new(),
                reply: Some(data.to_vec()),
            };
            WssePlugin::new(&key, &cert, &their_cert).received(&mut message)?;
            Ok(message.reply.unwrap_or_default())
        }),
    };

    if let Err(e) = result {
        if e.is_verification_failure() {
            eprintln!("INVALID: {e}");
        } else {
            eprintln!("Error: {e}");
        }
        process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn cmd_sign(file: &Path, key: &Path, cert: &Path, embed_cert: bool, output: Option<PathBuf>) -> Result<(), CliError> {
    let config = wsse::SigningConfig {
        embed_certificate: embed_cert,
        ..wsse::SigningConfig::default()
    };
    run(file, output, |data| wsse::sign_with(data, key, cert, &config))
}

fn cmd_verify(file: &Path, cert: &Path) -> Result<(), CliError> {
    let data = read_file(file)?;
    tracing::debug!(file = %file.display(), "verifying");
    wsse::verify(&data, cert)?;
    println!("OK");
    Ok(())
}

/// Read `file`, transform it, write the result.
fn run(
    file: &Path,
    output: Option<PathBuf>,
    transform: impl FnOnce(&[u8]) -> Result<Vec<u8>, Error>,
) -> Result<(), CliError> {
    let data = read_file(file)?;
    let result = transform(&data)?;
    write_output(output, &result)
}

// ── Utility functions ────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Wsse(#[from] Error),

    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CliError {
    fn is_verification_failure(&self) -> bool {
        matches!(self, CliError::Wsse(e) if e.is_verification_failure())
    }
}

fn read_file(path: &Path) -> Result<Vec<u8>, CliError> {
    std::fs::read(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn write_output(path: Option<PathBuf>, data: &[u8]) -> Result<(), CliError> {
    match path {
        Some(p) => std::fs::write(&p, data).map_err(|source| CliError::Io { path: p, source }),
        None => {
            use std::io::Write;
            std::io::stdout().write_all(data).map_err(|source| CliError::Io {
                path: PathBuf::from("<stdout>"),
                source,
            })
        }
    }
}
