//! Everything that leaves the bridge on stdout.
//!
//! The engine's [`Messenger`] calls and the per-tick summaries are turned
//! into [`OutputLine`]s and pushed onto a channel; a single writer task owns
//! stdout and serialises one JSON object per line.

use skipnight_core::engine::TickSummary;
use skipnight_core::messaging::{MessageCatalog, Messenger};
use skipnight_core::runner::TickCallback;
use skipnight_types::{Notice, PlayerId, ProgressBar, WorldId};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::error::ServerError;
use crate::protocol::OutputLine;

/// Sending half of the output channel.
pub type OutputSender = mpsc::UnboundedSender<OutputLine>;

fn emit(tx: &OutputSender, line: OutputLine) {
    if tx.send(line).is_err() {
        debug!("output writer gone, dropping line");
    }
}

/// [`Messenger`] that renders notices and queues them for stdout.
#[derive(Debug)]
pub struct JsonLinesMessenger {
    catalog: MessageCatalog,
    tx: OutputSender,
}

impl JsonLinesMessenger {
    /// Create a messenger rendering with `catalog`.
    pub const fn new(catalog: MessageCatalog, tx: OutputSender) -> Self {
        Self { catalog, tx }
    }

    /// Swap the templates, e.g. after a configuration reload.
    pub fn set_catalog(&mut self, catalog: MessageCatalog) {
        self.catalog = catalog;
    }

    fn render(&self, notice: &Notice) -> Option<String> {
        match self.catalog.render(notice) {
            Ok(text) => Some(text),
            Err(e) => {
                warn!(key = notice.key(), error = %e, "failed to render notice");
                None
            }
        }
    }
}

impl Messenger for JsonLinesMessenger {
    fn send(&mut self, player: PlayerId, notice: Notice) {
        if let Some(text) = self.render(&notice) {
            emit(
                &self.tx,
                OutputLine::Message {
                    player,
                    key: notice.key().to_owned(),
                    text,
                },
            );
        }
    }

    fn show_progress(&mut self, world: WorldId, bar: ProgressBar) {
        if let Some(title) = self.render(&bar.title) {
            emit(
                &self.tx,
                OutputLine::Progress {
                    world,
                    title,
                    percent: bar.percent,
                },
            );
        }
    }

    fn clear_progress(&mut self, world: WorldId) {
        emit(&self.tx, OutputLine::ProgressCleared { world });
    }
}

/// Tick callback publishing resolutions and finished skips.
#[derive(Debug)]
pub struct SummaryCallback {
    tx: OutputSender,
}

impl SummaryCallback {
    /// Create a callback writing to `tx`.
    pub const fn new(tx: OutputSender) -> Self {
        Self { tx }
    }
}

impl TickCallback for SummaryCallback {
    fn on_tick(&mut self, summary: &TickSummary) {
        for resolution in &summary.resolutions {
            emit(&self.tx, OutputLine::Resolution(*resolution));
        }
        for world in &summary.skips_completed {
            emit(&self.tx, OutputLine::SkipCompleted { world: *world });
        }
    }
}

/// Write every queued line to `out` until all senders are dropped.
///
/// # Errors
///
/// Returns [`ServerError`] if a line cannot be encoded or written.
pub async fn write_lines<W>(
    mut rx: mpsc::UnboundedReceiver<OutputLine>,
    mut out: W,
) -> Result<u64, ServerError>
where
    W: AsyncWrite + Unpin,
{
    let mut written: u64 = 0;
    while let Some(line) = rx.recv().await {
        let mut bytes = serde_json::to_vec(&line)?;
        bytes.push(b'\n');
        out.write_all(&bytes).await?;
        out.flush().await?;
        written = written.saturating_add(1);
    }
    Ok(written)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use skipnight_core::Resolution;
    use skipnight_types::{VoteState, VoteType};

    use super::*;

    #[test]
    fn notices_are_rendered() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut messenger = JsonLinesMessenger::new(MessageCatalog::with_defaults().unwrap(), tx);
        let player = PlayerId::new();

        messenger.send(player, Notice::YouVotedYes);
        assert_eq!(
            rx.try_recv().unwrap(),
            OutputLine::Message {
                player,
                key: String::from("you_voted_yes"),
                text: String::from("You voted yes."),
            }
        );
    }

    #[test]
    fn progress_title_is_rendered() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut messenger = JsonLinesMessenger::new(MessageCatalog::with_defaults().unwrap(), tx);
        let world = WorldId::new();

        let title = Notice::FastForwarding {
            vote_type: VoteType::Night,
        };
        messenger.show_progress(world, ProgressBar::from_ratio(title, 1, 2));
        messenger.clear_progress(world);

        assert_eq!(
            rx.try_recv().unwrap(),
            OutputLine::Progress {
                world,
                title: String::from("Skipping the night..."),
                percent: 50,
            }
        );
        assert_eq!(rx.try_recv().unwrap(), OutputLine::ProgressCleared { world });
    }

    #[test]
    fn callback_publishes_summary() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut callback = SummaryCallback::new(tx);
        let world = WorldId::new();
        let resolution = Resolution {
            world,
            vote_type: VoteType::Night,
            state: VoteState::Passed,
            reason: None,
            all_asleep: true,
            tick: 7,
        };
        callback.on_tick(&TickSummary {
            tick: 7,
            resolutions: vec![resolution],
            skips_completed: vec![world],
        });

        assert_eq!(rx.try_recv().unwrap(), OutputLine::Resolution(resolution));
        assert_eq!(rx.try_recv().unwrap(), OutputLine::SkipCompleted { world });
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn writer_emits_one_object_per_line() {
        let (tx, rx) = mpsc::unbounded_channel();
        let world = WorldId::new();
        tx.send(OutputLine::ProgressCleared { world }).unwrap();
        tx.send(OutputLine::SkipCompleted { world }).unwrap();
        drop(tx);

        let mut out = Vec::new();
        let written = write_lines(rx, &mut out).await.unwrap();
        assert_eq!(written, 2);

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        let first: serde_json::Value = serde_json::from_str(lines.first().unwrap()).unwrap();
        assert_eq!(first["type"], "progress_cleared");
        assert_eq!(first["world"], world.to_string());
    }
}
