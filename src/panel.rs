use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::warn;

use crate::controller::Controller;
use crate::duration::Interval;
use crate::error::NudgeError;
use crate::reminder::Reminder;
use crate::render::Renderer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Task,
    Interval,
}

#[derive(Debug, PartialEq)]
pub enum PanelAction {
    None,
    Start(Reminder),
    Stop,
    Quit,
}

/// Form state for the interactive panel. Key handling is kept free of I/O.
#[derive(Debug)]
pub struct PanelState {
    pub task: String,
    pub interval: String,
    pub focus: Field,
    pub active: Option<Reminder>,
    pub fires: u64,
    pub warning: Option<String>,
    min_interval_secs: u64,
}

impl PanelState {
    pub fn new(min_interval_secs: u64) -> Self {
        PanelState {
            task: "Take a break".to_string(),
            interval: "60".to_string(),
            focus: Field::Task,
            active: None,
            fires: 0,
            warning: None,
            min_interval_secs,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Status text and whether it reads as active.
    pub fn status_line(&self) -> (String, bool) {
        match &self.active {
            Some(r) => (format!("ACTIVE: Reminding you about '{}'", r.task), true),
            None => ("No reminder running.".to_string(), false),
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> PanelAction {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return PanelAction::Quit;
        }

        if self.is_active() {
            // fields are locked while a reminder runs
            return match key.code {
                KeyCode::Esc => PanelAction::Stop,
                _ => PanelAction::None,
            };
        }

        match key.code {
            KeyCode::Esc => PanelAction::Quit,
            KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => {
                self.focus = match self.focus {
                    Field::Task => Field::Interval,
                    Field::Interval => Field::Task,
                };
                PanelAction::None
            }
            KeyCode::Backspace => {
                self.focused_mut().pop();
                PanelAction::None
            }
            KeyCode::Char(c)
                if !key
                    .modifiers
                    .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
            {
                self.focused_mut().push(c);
                PanelAction::None
            }
            KeyCode::Enter => self.submit(),
            _ => PanelAction::None,
        }
    }

    fn focused_mut(&mut self) -> &mut String {
        match self.focus {
            Field::Task => &mut self.task,
            Field::Interval => &mut self.interval,
        }
    }

    fn submit(&mut self) -> PanelAction {
        let secs = match self.interval.trim().parse::<i64>() {
            Ok(secs) => u64::try_from(secs).unwrap_or(0),
            Err(_) => {
                self.warning = Some("Interval must be a number.".to_string());
                return PanelAction::None;
            }
        };
        match Reminder::new(&self.task, Interval::from_secs(secs), self.min_interval_secs) {
            Ok(reminder) => {
                self.warning = None;
                PanelAction::Start(reminder)
            }
            Err(NudgeError::IntervalTooShort { min_secs }) => {
                self.warning = Some(format!("Interval must be at least {min_secs} seconds."));
                PanelAction::None
            }
            Err(e) => {
                self.warning = Some(format!("{e}."));
                PanelAction::None
            }
        }
    }

    pub fn on_started(&mut self, reminder: Reminder) {
        self.active = Some(reminder);
        self.fires = 0;
    }

    pub fn on_stopped(&mut self) {
        self.active = None;
    }
}

fn next_event() -> std::io::Result<Option<Event>> {
    if event::poll(Duration::from_millis(50))? {
        event::read().map(Some)
    } else {
        Ok(None)
    }
}

/// Sends key presses on until the receiver goes away or the terminal errors.
/// Returning drops the sender, which ends the panel.
fn forward_keys(
    mut next: impl FnMut() -> std::io::Result<Option<Event>>,
    key_tx: mpsc::UnboundedSender<KeyEvent>,
) {
    loop {
        match next() {
            Ok(Some(Event::Key(key))) => {
                if key.kind == KeyEventKind::Press && key_tx.send(key).is_err() {
                    break;
                }
            }
            Ok(_) => {}
            Err(e) => {
                warn!(error = %e, "terminal input unavailable");
                break;
            }
        }
        if key_tx.is_closed() {
            break;
        }
    }
}

/// Runs the interactive form until the user quits. Any active reminder is stopped on exit.
pub async fn run(controller: &Controller, min_interval_secs: u64) -> std::io::Result<()> {
    let renderer = Renderer::new();
    renderer.setup()?;

    // crossterm reads block, so keys come in on their own thread
    let (key_tx, mut key_rx) = mpsc::unbounded_channel::<KeyEvent>();
    std::thread::spawn(move || forward_keys(next_event, key_tx));

    let mut state = PanelState::new(min_interval_secs);
    let mut tick = tokio::time::interval(Duration::from_millis(250));

    let result = loop {
        if let Err(e) = renderer.draw(&state) {
            break Err(e);
        }

        tokio::select! {
            key = key_rx.recv() => {
                let Some(key) = key else { break Ok(()) };
                match state.handle_key(key) {
                    PanelAction::None => {}
                    PanelAction::Start(reminder) => {
                        controller.start(reminder.clone(), None).await;
                        state.on_started(reminder);
                    }
                    PanelAction::Stop => {
                        controller.stop().await;
                        state.on_stopped();
                    }
                    PanelAction::Quit => break Ok(()),
                }
            }
            _ = tick.tick() => {
                let status = controller.status().await;
                if status.active {
                    state.fires = status.fires;
                } else if state.is_active() {
                    state.on_stopped();
                }
            }
        }
    };

    controller.stop().await;
    if let Err(e) = renderer.teardown() {
        warn!(error = %e, "failed to restore terminal");
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_str(state: &mut PanelState, s: &str) {
        for c in s.chars() {
            state.handle_key(press(KeyCode::Char(c)));
        }
    }

    fn clear_field(state: &mut PanelState) {
        for _ in 0..64 {
            state.handle_key(press(KeyCode::Backspace));
        }
    }

    #[test]
    fn starts_with_defaults() {
        let state = PanelState::new(5);
        assert_eq!(state.task, "Take a break");
        assert_eq!(state.interval, "60");
        assert_eq!(state.focus, Field::Task);
        assert_eq!(state.status_line(), ("No reminder running.".to_string(), false));
    }

    #[test]
    fn enter_with_defaults_starts() {
        let mut state = PanelState::new(5);
        match state.handle_key(press(KeyCode::Enter)) {
            PanelAction::Start(r) => {
                assert_eq!(r.task, "Take a break");
                assert_eq!(r.interval.total_secs, 60);
            }
            other => panic!("expected Start, got {other:?}"),
        }
    }

    #[test]
    fn typing_edits_focused_field() {
        let mut state = PanelState::new(5);
        clear_field(&mut state);
        type_str(&mut state, "stretch");
        state.handle_key(press(KeyCode::Tab));
        clear_field(&mut state);
        type_str(&mut state, "90");
        assert_eq!(state.task, "stretch");
        assert_eq!(state.interval, "90");
    }

    #[test]
    fn non_numeric_interval_warns() {
        let mut state = PanelState::new(5);
        state.handle_key(press(KeyCode::Down));
        type_str(&mut state, "x");
        assert_eq!(state.handle_key(press(KeyCode::Enter)), PanelAction::None);
        assert_eq!(state.warning.as_deref(), Some("Interval must be a number."));
    }

    #[test]
    fn short_interval_warns() {
        let mut state = PanelState::new(5);
        state.handle_key(press(KeyCode::Tab));
        clear_field(&mut state);
        type_str(&mut state, "3");
        assert_eq!(state.handle_key(press(KeyCode::Enter)), PanelAction::None);
        assert_eq!(
            state.warning.as_deref(),
            Some("Interval must be at least 5 seconds.")
        );
    }

    #[test]
    fn negative_interval_is_too_short() {
        let mut state = PanelState::new(5);
        state.handle_key(press(KeyCode::Tab));
        clear_field(&mut state);
        type_str(&mut state, "-3");
        assert_eq!(state.handle_key(press(KeyCode::Enter)), PanelAction::None);
        assert_eq!(
            state.warning.as_deref(),
            Some("Interval must be at least 5 seconds.")
        );
    }

    #[test]
    fn modified_chars_do_not_type() {
        let mut state = PanelState::new(5);
        state.handle_key(KeyEvent::new(KeyCode::Char('a'), KeyModifiers::CONTROL));
        state.handle_key(KeyEvent::new(KeyCode::Char('x'), KeyModifiers::ALT));
        assert_eq!(state.task, "Take a break");

        state.handle_key(KeyEvent::new(KeyCode::Char('S'), KeyModifiers::SHIFT));
        assert_eq!(state.task, "Take a breakS");
    }

    #[test]
    fn input_error_ends_forwarding() {
        let (key_tx, mut key_rx) = mpsc::unbounded_channel();
        let mut calls = 0;
        let mut events = vec![
            Err(std::io::Error::other("tty gone")),
            Ok(Some(Event::Key(press(KeyCode::Enter)))),
            Ok(None),
        ];
        forward_keys(
            || {
                calls += 1;
                events.pop().unwrap_or(Ok(None))
            },
            key_tx,
        );

        assert_eq!(calls, 3);
        assert_eq!(key_rx.try_recv().unwrap().code, KeyCode::Enter);
        // sender dropped, so the panel's recv() sees the end
        assert!(matches!(
            key_rx.try_recv(),
            Err(mpsc::error::TryRecvError::Disconnected)
        ));
    }

    #[test]
    fn closed_receiver_ends_forwarding() {
        let (key_tx, key_rx) = mpsc::unbounded_channel();
        drop(key_rx);
        let mut calls = 0;
        forward_keys(
            || {
                calls += 1;
                Ok(None)
            },
            key_tx,
        );
        assert_eq!(calls, 1);
    }

    #[test]
    fn empty_task_warns() {
        let mut state = PanelState::new(5);
        clear_field(&mut state);
        assert_eq!(state.handle_key(press(KeyCode::Enter)), PanelAction::None);
        assert_eq!(state.warning.as_deref(), Some("Task cannot be empty."));
    }

    #[test]
    fn active_locks_fields_and_esc_stops() {
        let mut state = PanelState::new(5);
        let PanelAction::Start(r) = state.handle_key(press(KeyCode::Enter)) else {
            panic!("expected Start");
        };
        state.on_started(r);
        assert_eq!(
            state.status_line(),
            ("ACTIVE: Reminding you about 'Take a break'".to_string(), true)
        );

        type_str(&mut state, "zzz");
        assert_eq!(state.task, "Take a break");
        assert_eq!(state.handle_key(press(KeyCode::Esc)), PanelAction::Stop);

        state.on_stopped();
        assert!(!state.is_active());
    }

    #[test]
    fn esc_when_idle_quits() {
        let mut state = PanelState::new(5);
        assert_eq!(state.handle_key(press(KeyCode::Esc)), PanelAction::Quit);
    }

    #[test]
    fn ctrl_c_always_quits() {
        let mut state = PanelState::new(5);
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(state.handle_key(ctrl_c), PanelAction::Quit);
        let PanelAction::Start(r) = state.handle_key(press(KeyCode::Enter)) else {
            panic!("expected Start");
        };
        state.on_started(r);
        assert_eq!(state.handle_key(ctrl_c), PanelAction::Quit);
    }

    #[test]
    fn successful_start_clears_warning() {
        let mut state = PanelState::new(5);
        state.warning = Some("old".to_string());
        state.handle_key(press(KeyCode::Enter));
        assert!(state.warning.is_none());
    }
}
