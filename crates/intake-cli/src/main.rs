//! intake - contract extraction review from the terminal.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use intake_core::UploadFile;
use intake_review::{Controller, ControllerConfig, NoticeKind, Stage};
use intake_transport::HttpTransport;
use tokio::io::{AsyncBufReadExt, BufReader};

mod display;
mod repl;

#[derive(Parser, Debug)]
#[command(name = "intake")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Contract service base URL
    #[arg(long, env = "INTAKE_BASE_URL", default_value = "http://localhost:5000")]
    base_url: String,

    /// Session cookie from an existing login, sent verbatim
    #[arg(long, env = "INTAKE_SESSION_COOKIE", hide_env_values = true)]
    session_cookie: Option<String>,

    #[arg(long, default_value_t = 120)]
    upload_timeout_secs: u64,

    #[arg(long, default_value_t = 60)]
    confirm_timeout_secs: u64,

    #[arg(long, default_value_t = 30)]
    delete_timeout_secs: u64,

    /// Log debug output to stderr
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Upload a contract and print the extracted record
    Extract {
        file: PathBuf,
    },
    /// Upload a contract and review it interactively
    Review {
        file: PathBuf,
    },
    /// Delete every stored upload and extraction
    DeleteAll {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

impl Cli {
    fn controller_config(&self) -> ControllerConfig {
        ControllerConfig {
            upload_timeout: Duration::from_secs(self.upload_timeout_secs),
            confirm_timeout: Duration::from_secs(self.confirm_timeout_secs),
            delete_timeout: Duration::from_secs(self.delete_timeout_secs),
        }
    }

    fn transport(&self) -> HttpTransport {
        let transport = HttpTransport::new(self.base_url.clone());
        match &self.session_cookie {
            Some(cookie) => transport.with_session_cookie(cookie.clone()),
            None => transport,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
    tracing::debug!("intake v{}", env!("CARGO_PKG_VERSION"));

    let mut controller = Controller::new(cli.transport()).with_config(cli.controller_config());

    match &cli.command {
        Commands::Extract { file } => {
            let upload = load_upload(file).await?;
            controller.session_mut().select_file(Some(upload))?;
            controller.upload().await?;
            let session = controller.session();
            if session.stage() != Stage::Reviewing {
                display::print_notice(session.notice());
                bail!("extraction of {} failed", file.display());
            }
            display::print_review(session);
        }
        Commands::Review { file } => {
            let upload = load_upload(file).await?;
            controller.session_mut().select_file(Some(upload))?;
            controller.upload().await?;
            display::print_session(controller.session());
            repl::run(&mut controller).await?;
        }
        Commands::DeleteAll { yes } => {
            controller.session_mut().request_delete()?;
            const QUESTION: &str =
                "Delete ALL uploaded files and extracted data? This cannot be undone. [y/N] ";
            let accepted = *yes || ask(QUESTION).await?;
            if !accepted {
                controller.session_mut().decline_delete()?;
                println!("Cancelled.");
                return Ok(());
            }
            controller.confirm_delete().await?;
            let notice = controller.session().notice();
            display::print_notice(notice);
            if notice.is_some_and(|n| n.kind == NoticeKind::Error) {
                bail!("delete-all failed");
            }
        }
    }

    Ok(())
}

/// Read a contract file into an upload payload named after its file name.
pub(crate) async fn load_upload(path: &Path) -> Result<UploadFile> {
    let content = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .with_context(|| format!("{} has no file name", path.display()))?;
    Ok(UploadFile::new(name, content))
}

async fn ask(question: &str) -> Result<bool> {
    print!("{question}");
    std::io::stdout().flush()?;
    let mut line = String::new();
    BufReader::new(tokio::io::stdin())
        .read_line(&mut line)
        .await
        .context("failed to read answer")?;
    Ok(matches!(line.trim(), "y" | "Y" | "yes" | "YES"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_defaults() {
        let cli = Cli::try_parse_from(["intake", "extract", "c.pdf"]).unwrap();
        assert_eq!(cli.base_url, "http://localhost:5000");
        assert_eq!(cli.controller_config(), ControllerConfig::default());
        assert!(matches!(cli.command, Commands::Extract { .. }));
    }

    #[test]
    fn delete_all_flag() {
        let cli = Cli::try_parse_from(["intake", "delete-all", "--yes"]).unwrap();
        assert!(matches!(cli.command, Commands::DeleteAll { yes: true }));
    }

    #[test]
    fn custom_timeouts() {
        let cli = Cli::try_parse_from([
            "intake",
            "--confirm-timeout-secs",
            "5",
            "review",
            "c.pdf",
        ])
        .unwrap();
        assert_eq!(cli.controller_config().confirm_timeout, Duration::from_secs(5));
    }

    #[tokio::test]
    async fn upload_is_named_after_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("acme.pdf");
        std::fs::File::create(&path)
            .unwrap()
            .write_all(b"%PDF-1.7")
            .unwrap();
        let upload = load_upload(&path).await.unwrap();
        assert_eq!(upload.file_name, "acme.pdf");
        assert_eq!(upload.size_bytes(), 8);
    }

    #[tokio::test]
    async fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_upload(&dir.path().join("nope.pdf")).await.unwrap_err();
        assert!(err.to_string().starts_with("failed to read"));
    }
}
