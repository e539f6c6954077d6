//! Terminal host tasks.
//!
//! Two tasks sit beside the runtime: one turns stdin lines into session
//! commands, the other follows rendered snapshots and prints new lines to
//! stdout.

use std::io::Write;

use inkwell_app::{SessionEvent, SessionSnapshot};
use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt},
    sync::{mpsc, watch},
};

use crate::{
    Printer,
    command::{self, Command},
};

/// Forward parsed lines from `input` to the session until it quits.
///
/// End of input quits the session.
pub async fn read_commands<R>(input: R, commands: mpsc::Sender<SessionEvent>, mut out: impl Write)
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!(error = %e, "failed to read input");
                break;
            },
        };

        let event = match command::parse_line(&line) {
            Some(Command::Session(event)) => event,
            Some(Command::Help) => {
                let _ = writeln!(out, "{}", command::HELP);
                continue;
            },
            Some(Command::Unknown(name)) => {
                let _ = writeln!(out, "unknown command /{name}, try /help");
                continue;
            },
            None => continue,
        };

        let quit = event == SessionEvent::Quit;
        if commands.send(event).await.is_err() || quit {
            return;
        }
    }

    let _ = commands.send(SessionEvent::Quit).await;
}

/// Print every rendered snapshot until the driver goes away.
pub async fn print_snapshots(mut snapshots: watch::Receiver<SessionSnapshot>, mut out: impl Write) {
    let mut printer = Printer::new();

    loop {
        let lines = printer.lines(&snapshots.borrow_and_update());
        for line in lines {
            if writeln!(out, "{line}").is_err() {
                return;
            }
        }
        let _ = out.flush();

        if snapshots.changed().await.is_err() {
            return;
        }
    }
}
