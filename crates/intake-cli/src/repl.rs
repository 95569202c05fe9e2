//! Line-oriented review session over stdin.

use std::io::{IsTerminal, Write};
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow, bail};
use intake_core::{FieldKey, Pin};
use intake_review::{Controller, ViewMode};
use intake_transport::Transport;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};
use zeroize::Zeroizing;

use crate::display;

pub const HELP: &str = "\
commands:
  show                  print the current view
  form | raw            switch view (leaving raw parses pending edits)
  set <key> <value>     edit one field in the form view
  load-raw <path>       replace the raw JSON with a file's contents
  file <path>           choose a contract file (idle only)
  upload                extract the chosen file
  confirm               open the PIN prompt
  pin                   enter the PIN (not echoed) and commit to billing
  cancel                close the PIN prompt
  retry                 reopen the PIN prompt after a failure
  reset                 discard the record, keep the file
  start-over            discard everything
  delete                delete all stored files (asks yes/no)
  yes | no              answer the delete prompt
  help | quit";

#[derive(Debug)]
pub enum Command {
    Show,
    View(ViewMode),
    Set { key: FieldKey, value: String },
    LoadRaw(PathBuf),
    File(PathBuf),
    Upload,
    Confirm,
    Pin,
    Cancel,
    Retry,
    Reset,
    StartOver,
    Delete,
    Yes,
    No,
    Help,
    Quit,
}

pub fn parse(line: &str) -> Result<Command> {
    let line = line.trim();
    let (word, rest) = line.split_once(' ').unwrap_or((line, ""));
    let rest = rest.trim_start();
    let command = match word {
        "show" => Command::Show,
        "form" => Command::View(ViewMode::Form),
        "raw" => Command::View(ViewMode::Raw),
        "set" => {
            let (key, value) = rest.split_once(' ').unwrap_or((rest, ""));
            if key.is_empty() {
                bail!("usage: set <key> <value>");
            }
            let key = key.parse::<FieldKey>()?;
            Command::Set {
                key,
                value: value.trim_start().to_string(),
            }
        }
        "load-raw" => Command::LoadRaw(path_arg(rest, "load-raw")?),
        "file" => Command::File(path_arg(rest, "file")?),
        "upload" => Command::Upload,
        "confirm" => Command::Confirm,
        // The argument is never echoed back in the error.
        "pin" if !rest.is_empty() => bail!("`pin` takes no argument; the PIN is read without echo"),
        "pin" => Command::Pin,
        "cancel" => Command::Cancel,
        "retry" => Command::Retry,
        "reset" => Command::Reset,
        "start-over" => Command::StartOver,
        "delete" => Command::Delete,
        "yes" | "y" => Command::Yes,
        "no" | "n" => Command::No,
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        other => return Err(anyhow!("unknown command `{other}` (try `help`)")),
    };
    Ok(command)
}

fn path_arg(rest: &str, command: &str) -> Result<PathBuf> {
    if rest.is_empty() {
        bail!("usage: {command} <path>");
    }
    Ok(PathBuf::from(rest))
}

/// Read commands until `quit` or end of input.
pub async fn run<T: Transport>(controller: &mut Controller<T>) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    println!("type `help` for commands");
    while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
        // May hold a mistyped secret.
        let line = Zeroizing::new(line);
        if line.trim().is_empty() {
            continue;
        }
        let command = match parse(&line) {
            Ok(command) => command,
            Err(e) => {
                println!("error: {e}");
                continue;
            }
        };
        if matches!(command, Command::Quit) {
            break;
        }
        if let Err(e) = apply(controller, command, &mut lines).await {
            println!("error: {e:#}");
        }
        display::print_session(controller.session());
    }
    Ok(())
}

async fn apply<T, R>(
    controller: &mut Controller<T>,
    command: Command,
    input: &mut Lines<R>,
) -> Result<()>
where
    T: Transport,
    R: AsyncBufRead + Unpin,
{
    match command {
        Command::Show | Command::Quit => {}
        Command::Help => println!("{HELP}"),
        Command::View(mode) => controller.session_mut().switch_view(mode)?,
        Command::Set { key, value } => controller.session_mut().edit_field(key, &value)?,
        Command::LoadRaw(path) => {
            let text = tokio::fs::read_to_string(&path)
                .await
                .with_context(|| format!("failed to read {}", path.display()))?;
            controller.session_mut().edit_raw(text)?;
        }
        Command::File(path) => {
            let upload = crate::load_upload(&path).await?;
            controller.session_mut().select_file(Some(upload))?;
        }
        Command::Upload => controller.upload().await?,
        Command::Confirm => controller.session_mut().begin_confirm()?,
        Command::Pin => {
            let pin = read_pin(input).await?;
            controller.session_mut().enter_pin(pin.as_str())?;
            controller.submit_pin().await?;
        }
        Command::Cancel => controller.session_mut().cancel_pin()?,
        Command::Retry => controller.session_mut().retry()?,
        Command::Reset => controller.session_mut().reset()?,
        Command::StartOver => controller.session_mut().start_over()?,
        Command::Delete => {
            controller.session_mut().request_delete()?;
            println!(
                "Delete ALL uploaded files and extracted data? \
                 This cannot be undone. (yes/no)"
            );
        }
        Command::Yes => controller.confirm_delete().await?,
        Command::No => controller.session_mut().decline_delete()?,
    }
    Ok(())
}

/// Prompt for the PIN without echo on a terminal; otherwise take the next
/// input line. A blank PIN is passed on so the prompt can refuse it.
async fn read_pin<R: AsyncBufRead + Unpin>(input: &mut Lines<R>) -> Result<Pin> {
    if !std::io::stdin().is_terminal() {
        return read_pin_line(input).await;
    }
    let value = tokio::task::spawn_blocking(|| rpassword::prompt_password("PIN: "))
        .await
        .context("PIN prompt task failed")?
        .context("failed to read PIN")?;
    Ok(Pin::new(value))
}

async fn read_pin_line<R: AsyncBufRead + Unpin>(input: &mut Lines<R>) -> Result<Pin> {
    print!("PIN: ");
    std::io::stdout().flush().context("failed to write prompt")?;
    let line = input
        .next_line()
        .await
        .context("failed to read PIN")?
        .map(Zeroizing::new)
        .ok_or_else(|| anyhow!("input ended before a PIN was entered"))?;
    Ok(Pin::new(line.as_str()))
}
