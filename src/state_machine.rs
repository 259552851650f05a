use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    thread,
    time::Duration,
};

use crate::{
    clipboard::ClipboardService,
    delivery::{classify_target, plan, Delivery},
    error::PasteError,
    model::{DeliveryStep, FocusTarget, PasteState},
    scheduler::{Scheduler, TimerId},
    services::HostServices,
    settings::PasteTiming,
    store::BlockStore,
};

/// How long the injected text stays on the clipboard before the previous
/// contents come back. Targets often read the clipboard after the paste
/// command returns.
pub const RESTORE_DELAY: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasteReport {
    pub delivered_by: DeliveryStep,
    pub attempts: Vec<DeliveryStep>,
    pub restore: Option<TimerId>,
}

/// Lines joined with CRLF; blocks of two or more lines end with one CRLF.
pub fn render_content(lines: &[String]) -> String {
    let mut content = lines.join("\r\n");
    if lines.len() >= 2 {
        content.push_str("\r\n");
    }
    content
}

pub struct PasteEngine {
    state: PasteState,
    services: HostServices,
    scheduler: Arc<dyn Scheduler>,
    timing: PasteTiming,
    restores_pending: Arc<AtomicUsize>,
}

impl PasteEngine {
    pub fn new(services: HostServices, scheduler: Arc<dyn Scheduler>, timing: PasteTiming) -> Self {
        Self {
            state: PasteState::Idle,
            services,
            scheduler,
            timing,
            restores_pending: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn state(&self) -> PasteState {
        if self.state == PasteState::Idle && self.restores_pending.load(Ordering::SeqCst) > 0 {
            return PasteState::RestoringClipboard;
        }
        self.state.clone()
    }

    /// Paste the current persisted content of `name`.
    pub fn paste_named(&mut self, store: &BlockStore, name: &str) -> Result<PasteReport, PasteError> {
        let lines = store.get(name)?;
        self.paste_block(&lines)
    }

    pub fn paste_block(&mut self, lines: &[String]) -> Result<PasteReport, PasteError> {
        let content = render_content(lines);

        self.state = PasteState::CapturingClipboard;
        let backup = match self.services.clipboard.read_text() {
            Ok(text) => Some(text),
            Err(err) => {
                let err = PasteError::ClipboardReadFailed(format!("{err:#}"));
                log::warn!("{err}; previous clipboard will not be restored");
                None
            }
        };

        if let Err(err) = self.services.clipboard.write_text(&content) {
            self.state = PasteState::Idle;
            let err = PasteError::ClipboardWriteFailed(format!("{err:#}"));
            log::error!("{err}");
            return Err(err);
        }

        thread::sleep(self.timing.settle(backup.is_some()));
        self.services.events.process_pending_events();

        self.state = PasteState::Injecting;
        let target = self.services.focus.current_focus_target().unwrap_or_else(|err| {
            log::warn!("could not inspect focused control: {err:#}");
            FocusTarget::default()
        });
        let class = classify_target(&target);
        let steps = plan(class, target.window_handle.is_some());
        log::debug!(
            "focus target {:?} classified as {class:?}",
            target.window_class_name
        );

        let outcome = Delivery {
            keyboard: self.services.keyboard.as_ref(),
            messenger: self.services.messenger.as_ref(),
            focus: self.services.focus.as_ref(),
            focus_settle: self.timing.focus_settle(),
        }
        .run(&steps, &target);

        let restore = backup.map(|text| self.schedule_restore(text));
        self.state = PasteState::Idle;

        match outcome.delivered_by {
            Some(step) => {
                log::info!("pasted {} bytes via {}", content.len(), step.label());
                Ok(PasteReport {
                    delivered_by: step,
                    attempts: outcome.attempts,
                    restore,
                })
            }
            None => {
                let err = PasteError::PasteDeliveryFailed {
                    attempts: outcome.attempts,
                    restore_scheduled: restore.is_some(),
                };
                log::error!("{err}");
                Err(err)
            }
        }
    }

    fn schedule_restore(&self, backup: String) -> TimerId {
        let clipboard: Arc<dyn ClipboardService> = self.services.clipboard.clone();
        let pending = self.restores_pending.clone();
        pending.fetch_add(1, Ordering::SeqCst);

        let id = self.scheduler.call_later(
            RESTORE_DELAY,
            Box::new(move || {
                match clipboard.write_text(&backup) {
                    Ok(()) => log::debug!("clipboard restored"),
                    Err(err) => log::warn!("failed restoring clipboard: {err:#}"),
                }
                pending.fetch_sub(1, Ordering::SeqCst);
            }),
        );
        log::debug!("clipboard restore scheduled in {}ms", RESTORE_DELAY.as_millis());
        id
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{
        delivery::CONSOLE_WINDOW_CLASS,
        fakes::{FakeClipboard, FakeFocus, FakeKeyboard, FakeMessenger, FakePump, Journal},
        model::{Chord, WindowHandle},
        scheduler::TimerQueue,
    };

    struct Rig {
        journal: Journal,
        clipboard: Arc<FakeClipboard>,
        queue: Arc<TimerQueue>,
        engine: PasteEngine,
    }

    fn rig(
        clipboard: impl FnOnce(&Journal) -> FakeClipboard,
        keyboard: impl FnOnce(&Journal) -> FakeKeyboard,
        messenger: impl FnOnce(&Journal) -> FakeMessenger,
        target: FocusTarget,
    ) -> Rig {
        timed_rig(clipboard, keyboard, messenger, target, PasteTiming::immediate())
    }

    fn timed_rig(
        clipboard: impl FnOnce(&Journal) -> FakeClipboard,
        keyboard: impl FnOnce(&Journal) -> FakeKeyboard,
        messenger: impl FnOnce(&Journal) -> FakeMessenger,
        target: FocusTarget,
        timing: PasteTiming,
    ) -> Rig {
        let journal = Journal::default();
        let clipboard = Arc::new(clipboard(&journal));
        let queue = Arc::new(TimerQueue::new());
        let services = HostServices {
            clipboard: clipboard.clone(),
            focus: Box::new(FakeFocus::new(&journal, target)),
            keyboard: Box::new(keyboard(&journal)),
            messenger: Box::new(messenger(&journal)),
            events: Box::new(FakePump::new(&journal)),
        };
        let engine = PasteEngine::new(services, queue.clone(), timing);
        Rig {
            journal,
            clipboard,
            queue,
            engine,
        }
    }

    fn lines(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn fire_timers(queue: &TimerQueue) -> usize {
        queue.run_due(Instant::now() + Duration::from_secs(5))
    }

    #[test]
    fn multi_line_block_ends_with_one_terminator() {
        assert_eq!(render_content(&lines(&["Best,", "Alice"])), "Best,\r\nAlice\r\n");
        assert_eq!(render_content(&lines(&["a", "", "c"])), "a\r\n\r\nc\r\n");
    }

    #[test]
    fn single_line_block_has_no_terminator() {
        assert_eq!(render_content(&lines(&["hello"])), "hello");
        assert_eq!(render_content(&[]), "");
    }

    #[test]
    fn protocol_runs_in_order_and_restores() {
        let mut rig = rig(
            |j| FakeClipboard::new(j, "original"),
            FakeKeyboard::new,
            FakeMessenger::new,
            FocusTarget::new(Some("Edit"), Some(WindowHandle(7))),
        );

        let report = rig.engine.paste_block(&lines(&["hello"])).expect("paste");
        assert_eq!(report.delivered_by, DeliveryStep::KeyChord(Chord::Paste));
        assert!(report.restore.is_some());
        assert_eq!(
            rig.journal.entries(),
            vec!["read", "write \"hello\"", "pump", "chord control+v"]
        );
        assert_eq!(rig.engine.state(), PasteState::RestoringClipboard);

        assert_eq!(fire_timers(&rig.queue), 1);
        assert_eq!(rig.clipboard.contents().as_deref(), Some("original"));
        assert_eq!(rig.engine.state(), PasteState::Idle);
    }

    #[test]
    fn cold_clipboard_settles_longer_than_warm() {
        let timing = PasteTiming {
            cold_settle_ms: 150,
            warm_settle_ms: 0,
            focus_settle_ms: 0,
        };
        let settle = Duration::from_millis(timing.cold_settle_ms);

        let mut cold = timed_rig(
            |j| FakeClipboard::new(j, "original").unreadable(),
            FakeKeyboard::new,
            FakeMessenger::new,
            FocusTarget::default(),
            timing.clone(),
        );
        let started = Instant::now();
        cold.engine.paste_block(&lines(&["x"])).expect("cold paste");
        let cold_elapsed = started.elapsed();

        let mut warm = timed_rig(
            |j| FakeClipboard::new(j, "original"),
            FakeKeyboard::new,
            FakeMessenger::new,
            FocusTarget::default(),
            timing,
        );
        let started = Instant::now();
        warm.engine.paste_block(&lines(&["x"])).expect("warm paste");
        let warm_elapsed = started.elapsed();

        assert!(cold_elapsed >= settle, "cold paste took {cold_elapsed:?}");
        assert!(warm_elapsed < settle, "warm paste took {warm_elapsed:?}");
    }

    #[test]
    fn write_failure_aborts_before_delivery() {
        let mut rig = rig(
            |j| FakeClipboard::new(j, "original").unwritable(),
            FakeKeyboard::new,
            FakeMessenger::new,
            FocusTarget::default(),
        );

        let err = rig.engine.paste_block(&lines(&["x"])).unwrap_err();
        assert!(matches!(err, PasteError::ClipboardWriteFailed(_)));
        assert_eq!(rig.journal.entries(), vec!["read", "write failed"]);
        assert_eq!(rig.queue.pending(), 0);
        assert_eq!(rig.engine.state(), PasteState::Idle);
    }

    #[test]
    fn read_failure_skips_restore_on_success() {
        let mut rig = rig(
            |j| FakeClipboard::new(j, "original").unreadable(),
            FakeKeyboard::new,
            FakeMessenger::new,
            FocusTarget::default(),
        );

        let report = rig.engine.paste_block(&lines(&["a", "b"])).expect("paste");
        assert_eq!(report.restore, None);
        assert_eq!(rig.queue.pending(), 0);
        assert_eq!(rig.clipboard.contents().as_deref(), Some("a\r\nb\r\n"));
    }

    #[test]
    fn read_failure_skips_restore_on_delivery_failure() {
        let mut rig = rig(
            |j| FakeClipboard::new(j, "original").unreadable(),
            |j| FakeKeyboard::new(j).failing_always(),
            |j| FakeMessenger::new(j).failing(),
            FocusTarget::new(Some("Edit"), Some(WindowHandle(1))),
        );

        let err = rig.engine.paste_block(&lines(&["a"])).unwrap_err();
        assert!(matches!(
            err,
            PasteError::PasteDeliveryFailed { restore_scheduled: false, .. }
        ));
        assert_eq!(rig.queue.pending(), 0);
    }

    #[test]
    fn delivery_failure_still_restores_once() {
        let mut rig = rig(
            |j| FakeClipboard::new(j, "original"),
            |j| FakeKeyboard::new(j).failing_always(),
            |j| FakeMessenger::new(j).failing(),
            FocusTarget::new(Some("Edit"), Some(WindowHandle(1))),
        );

        let err = rig.engine.paste_block(&lines(&["a"])).unwrap_err();
        match err {
            PasteError::PasteDeliveryFailed {
                attempts,
                restore_scheduled,
            } => {
                assert!(restore_scheduled);
                assert_eq!(attempts.len(), 3);
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert_eq!(rig.queue.pending(), 1);
        assert_eq!(fire_timers(&rig.queue), 1);
        assert_eq!(rig.clipboard.contents().as_deref(), Some("original"));
    }

    #[test]
    fn console_target_never_uses_key_chords() {
        let mut rig = rig(
            |j| FakeClipboard::new(j, "original"),
            FakeKeyboard::new,
            |j| FakeMessenger::new(j).failing(),
            FocusTarget::new(Some(CONSOLE_WINDOW_CLASS), Some(WindowHandle(0x10))),
        );

        let err = rig.engine.paste_block(&lines(&["dir"])).unwrap_err();
        assert!(matches!(err, PasteError::PasteDeliveryFailed { .. }));
        assert!(!rig
            .journal
            .entries()
            .iter()
            .any(|entry| entry.starts_with("chord")));
    }

    #[test]
    fn rich_text_target_gets_paste_message() {
        let mut rig = rig(
            |j| FakeClipboard::new(j, ""),
            FakeKeyboard::new,
            FakeMessenger::new,
            FocusTarget::new(Some("RichTextWndClass"), Some(WindowHandle(0x20))),
        );

        let report = rig.engine.paste_block(&lines(&["x"])).expect("paste");
        assert_eq!(report.attempts, vec![DeliveryStep::PasteMessage]);
        assert_eq!(
            rig.journal.entries().last().map(String::as_str),
            Some("send 0x20 0x302 0x0 0")
        );
    }

    #[test]
    fn named_paste_reads_current_store_content() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = BlockStore::new(dir.path().join("blocks.json"));
        store.put("sig", lines(&["Best,", "Bob"])).expect("put");
        store.put("sig", lines(&["Best,", "Alice"])).expect("put");

        let mut rig = rig(
            |j| FakeClipboard::new(j, "before"),
            FakeKeyboard::new,
            FakeMessenger::new,
            FocusTarget::default(),
        );
        rig.engine.paste_named(&store, "sig").expect("paste");
        assert!(rig
            .journal
            .entries()
            .contains(&"write \"Best,\\r\\nAlice\\r\\n\"".to_string()));

        let err = rig.engine.paste_named(&store, "missing").unwrap_err();
        assert!(matches!(err, PasteError::Store(_)));
    }
}
