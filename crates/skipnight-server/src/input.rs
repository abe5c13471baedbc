//! Stdin pump: parses input lines and queues them onto the tick loop.
//!
//! Nothing here touches the engine directly. Vote events go through
//! [`TickHandle::submit`] and their answers are forwarded to stdout once the
//! tick thread has applied them; host commands are queued as engine jobs so
//! they stay ordered with the events around them.

use std::path::{Path, PathBuf};

use skipnight_core::config::SkipConfig;
use skipnight_core::messaging::MessageCatalog;
use skipnight_core::runner::{Completion, TickHandle};
use skipnight_core::{SimWorlds, WorldHost};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, info, warn};

use crate::error::ServerError;
use crate::output::{JsonLinesMessenger, OutputSender};
use crate::protocol::{BridgeInput, HostCommand, OutputLine};

/// Handle type used by the bridge.
pub type BridgeHandle = TickHandle<SimWorlds, JsonLinesMessenger>;

/// Read lines from `reader` until EOF, queueing each onto the tick loop.
///
/// Returns the number of lines read.
///
/// # Errors
///
/// Returns [`ServerError`] if stdin fails or the tick loop has shut down.
pub async fn read_lines<R>(
    reader: R,
    handle: BridgeHandle,
    out: OutputSender,
    config_path: PathBuf,
) -> Result<u64, ServerError>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut seq: u64 = 0;

    while let Some(line) = lines.next_line().await? {
        seq = seq.saturating_add(1);
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match serde_json::from_str::<BridgeInput>(line) {
            Ok(BridgeInput::Vote(event)) => {
                debug!(seq, ?event, "event queued");
                let completion = handle.submit(event)?;
                tokio::spawn(forward_reply(seq, completion, out.clone()));
            }
            Ok(BridgeInput::Host(command)) => {
                apply_host_command(seq, command, &handle, &out, &config_path)?;
            }
            Err(e) => {
                warn!(seq, error = %e, "unreadable input line");
                send(
                    &out,
                    OutputLine::InputError {
                        seq,
                        message: e.to_string(),
                    },
                );
            }
        }
    }

    info!(lines = seq, "input closed");
    Ok(seq)
}

fn apply_host_command(
    seq: u64,
    command: HostCommand,
    handle: &BridgeHandle,
    out: &OutputSender,
    config_path: &Path,
) -> Result<(), ServerError> {
    match command {
        HostCommand::AddWorld { world, time } => {
            handle.with_engine(move |engine| engine.host_mut().add_world(world, time))?;
        }
        HostCommand::SetTime { world, time } => {
            handle.with_engine(move |engine| engine.host_mut().set_time(world, time))?;
        }
        HostCommand::SetDaylightCycle { world, enabled } => {
            handle.with_engine(move |engine| {
                engine.host_mut().set_daylight_cycle(world, enabled);
            })?;
        }
        HostCommand::Reload => match load_reload(config_path) {
            Ok((config, catalog)) => {
                handle.with_engine(move |engine| {
                    engine.messenger_mut().set_catalog(catalog);
                    engine.reload(config);
                })?;
            }
            Err(e) => {
                warn!(seq, error = %e, "reload failed, keeping current configuration");
                send(
                    out,
                    OutputLine::InputError {
                        seq,
                        message: e.to_string(),
                    },
                );
            }
        },
    }
    Ok(())
}

fn load_reload(config_path: &Path) -> Result<(SkipConfig, MessageCatalog), ServerError> {
    let config = SkipConfig::from_file(config_path)?;
    let catalog = MessageCatalog::new(&config.messages)?;
    Ok((config, catalog))
}

async fn forward_reply(seq: u64, completion: Completion, out: OutputSender) {
    let line = match completion.wait().await {
        Ok(Ok(outcome)) => OutputLine::Reply {
            seq,
            outcome: Some(outcome),
            error: None,
        },
        Ok(Err(e)) => OutputLine::Reply {
            seq,
            outcome: None,
            error: Some(e.to_string()),
        },
        Err(e) => {
            debug!(seq, error = %e, "event never applied");
            return;
        }
    };
    send(&out, line);
}

fn send(out: &OutputSender, line: OutputLine) {
    if out.send(line).is_err() {
        debug!("output writer gone, dropping line");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use skipnight_core::{SkipConfig, TickLoop, VoteEngine};
    use skipnight_types::{PlayerId, VoteState, VoteType, WorldId};
    use tokio::sync::mpsc;

    use super::*;

    fn drain(rx: &mut mpsc::UnboundedReceiver<OutputLine>) -> Vec<OutputLine> {
        std::iter::from_fn(|| rx.try_recv().ok()).collect()
    }

    #[tokio::test]
    async fn lines_reach_the_engine_on_the_next_tick() {
        let (out_tx, mut out_rx) = mpsc::unbounded_channel();
        let messenger = JsonLinesMessenger::new(MessageCatalog::with_defaults().unwrap(), out_tx.clone());
        let engine = VoteEngine::new(SkipConfig::default(), SimWorlds::new(), messenger);
        let (mut tick_loop, handle) = TickLoop::new(engine);

        let world = WorldId::new();
        let player = PlayerId::new();
        let input = format!(
            "{{\"host\":\"add_world\",\"world\":\"{world}\",\"time\":13000}}\n\
             {{\"event\":\"join\",\"player\":\"{player}\",\"name\":\"steve\",\"world\":\"{world}\"}}\n\
             \n\
             {{\"event\":\"command\",\"player\":\"{player}\",\"label\":\"skipnight\"}}\n"
        );

        let read = read_lines(input.as_bytes(), handle, out_tx, PathBuf::from("missing.yaml"))
            .await
            .unwrap();
        assert_eq!(read, 4);
        assert!(tick_loop.engine().host().time(world).is_none());

        tick_loop.perform_one_tick();
        assert!(tick_loop.engine().is_fast_forwarding(world));
        assert_eq!(tick_loop.engine().vote_state(world, VoteType::Night), VoteState::None);

        // Let the reply forwarders run.
        tokio::task::yield_now().await;
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;

        let lines = drain(&mut out_rx);
        assert!(lines.iter().any(|l| matches!(
            l,
            OutputLine::Message { key, .. } if key == "you_voted_yes"
        )));
        assert!(lines.iter().any(|l| matches!(l, OutputLine::Reply { seq: 4, outcome: Some(_), .. })));
        assert!(lines.iter().any(|l| matches!(l, OutputLine::Progress { .. })));
    }

    #[tokio::test]
    async fn bad_lines_are_reported_and_skipped() {
        let (out_tx, mut out_rx) = mpsc::unbounded_channel();
        let messenger = JsonLinesMessenger::new(MessageCatalog::with_defaults().unwrap(), out_tx.clone());
        let engine = VoteEngine::new(SkipConfig::default(), SimWorlds::new(), messenger);
        let (_tick_loop, handle) = TickLoop::new(engine);

        let input = "{\"event\":\"dance\"}\n{\"host\":\"reload\"}\n";
        let read = read_lines(
            input.as_bytes(),
            handle,
            out_tx,
            PathBuf::from("/nonexistent/skipnight-config.yaml"),
        )
        .await
        .unwrap();
        assert_eq!(read, 2);

        let lines = drain(&mut out_rx);
        assert_eq!(lines.len(), 2);
        assert!(matches!(lines.first(), Some(OutputLine::InputError { seq: 1, .. })));
        assert!(matches!(lines.get(1), Some(OutputLine::InputError { seq: 2, .. })));
    }

    #[tokio::test]
    async fn closed_loop_stops_the_reader() {
        let (out_tx, _out_rx) = mpsc::unbounded_channel();
        let messenger = JsonLinesMessenger::new(MessageCatalog::with_defaults().unwrap(), out_tx.clone());
        let engine = VoteEngine::new(SkipConfig::default(), SimWorlds::new(), messenger);
        let (tick_loop, handle) = TickLoop::new(engine);
        drop(tick_loop);

        let input = format!("{{\"event\":\"quit\",\"player\":\"{}\"}}\n", PlayerId::new());
        let err = read_lines(input.as_bytes(), handle, out_tx, PathBuf::from("x.yaml"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServerError::Runner { .. }));
    }
}
