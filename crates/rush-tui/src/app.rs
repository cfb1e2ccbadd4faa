use crate::storage::Profile;
use crate::theme::Theme;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use rush_core::{
    Category, ChoiceResult, Dice, GameConfig, HapticFeedback, HapticKind, LeaderboardError, LeaderboardStatus,
    LeaderboardStore, Period, PersistenceProvider, RankingView, RoundController, RoundOutcome, ScoreEntry,
    Submission, MAX_NAME_CHARS,
};
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, warn};

/// Result of handling a key press
pub enum AppAction {
    Continue,
    Quit,
}

/// Current screen state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenState {
    /// Name entry and category choice
    Setup,
    /// Countdown and recall stages
    Playing,
    /// Score of the finished round with the short ranking
    Result,
    /// Full ranking with period filter
    Leaderboard,
}

/// A finished leaderboard call, delivered back to the UI thread
#[derive(Debug)]
pub enum StoreEvent {
    Submitted(Result<Submission, LeaderboardError>),
    Ranking(Result<RankingView, LeaderboardError>),
}

/// Rings the terminal bell while haptics are switched on
pub struct TerminalBell {
    enabled: Arc<AtomicBool>,
}

impl HapticFeedback for TerminalBell {
    fn trigger(&self, kind: HapticKind) {
        if !self.enabled.load(Ordering::Relaxed) {
            return;
        }
        if matches!(kind, HapticKind::Incorrect | HapticKind::Rare | HapticKind::RoundOver) {
            let mut out = std::io::stdout();
            let _ = out.write_all(b"\x07").and_then(|_| out.flush());
        }
    }
}

/// Leaderboard access shared with the background tasks
pub struct StoreHandle {
    pub store: Arc<LeaderboardStore>,
    /// Where the profile is kept
    pub local: Arc<dyn PersistenceProvider>,
    pub runtime: Handle,
}

/// The main application state
pub struct App {
    pub controller: RoundController,
    store: StoreHandle,
    events_tx: UnboundedSender<StoreEvent>,
    events_rx: UnboundedReceiver<StoreEvent>,
    bell: Arc<AtomicBool>,
    /// Color theme
    pub theme: Theme,
    pub profile: Profile,
    pub name_input: String,
    pub category: Category,
    /// Current screen state
    pub screen_state: ScreenState,
    /// Last finished round
    pub outcome: Option<RoundOutcome>,
    /// Entry stored for the last round, once the store answered
    pub submitted: Option<ScoreEntry>,
    pub ranking: Option<RankingView>,
    pub period: Period,
    /// Leaderboard calls still running
    pending: usize,
    /// Sticky error banner, dismissed with `x`
    pub error: Option<String>,
    /// Message to display
    pub message: Option<String>,
    /// Message timer
    message_timer: u32,
}

impl App {
    pub fn new(config: GameConfig, dice: Box<dyn Dice>, store: StoreHandle, profile: Profile) -> Self {
        let bell = Arc::new(AtomicBool::new(profile.haptics_enabled));
        let controller = RoundController::new(config)
            .with_dice(dice)
            .with_haptics(Arc::new(TerminalBell {
                enabled: Arc::clone(&bell),
            }));
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        Self {
            controller,
            store,
            events_tx,
            events_rx,
            bell,
            theme: Theme::for_mode(profile.dark_mode),
            name_input: profile.player_name.clone(),
            category: profile.category,
            profile,
            screen_state: ScreenState::Setup,
            outcome: None,
            submitted: None,
            ranking: None,
            period: Period::All,
            pending: 0,
            error: None,
            message: None,
            message_timer: 0,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.pending > 0
    }

    pub fn status(&self) -> LeaderboardStatus {
        self.store.store.status()
    }

    /// Rows shown under a finished round
    pub fn compact_limit(&self) -> usize {
        self.store.store.config().compact_limit
    }

    /// Called every 100ms
    pub fn tick(&mut self) {
        if self.message_timer > 0 {
            self.message_timer -= 1;
            if self.message_timer == 0 {
                self.message = None;
            }
        }

        self.poll_store();

        if self.screen_state == ScreenState::Playing {
            if let Some(outcome) = self.controller.tick() {
                self.round_over(outcome);
            }
        }
    }

    /// Apply every leaderboard answer that has arrived
    pub fn poll_store(&mut self) {
        while let Ok(event) = self.events_rx.try_recv() {
            self.pending = self.pending.saturating_sub(1);
            match event {
                StoreEvent::Submitted(Ok(submission)) => {
                    self.show_message(&format!("Score saved ({})", submission.backend));
                    self.submitted = Some(submission.entry);
                }
                StoreEvent::Submitted(Err(e)) => {
                    warn!(error = %e, "score not saved");
                    self.error = Some(format!("Score not saved: {}", e));
                }
                StoreEvent::Ranking(Ok(view)) => {
                    // The user may have switched away while this was loading
                    if view.category == self.category && view.period == self.period {
                        self.ranking = Some(view);
                    } else {
                        debug!(category = %view.category, period = ?view.period, "stale ranking dropped");
                    }
                }
                StoreEvent::Ranking(Err(e)) => {
                    warn!(error = %e, "ranking unavailable");
                    // A failed submit is the more useful banner
                    self.error
                        .get_or_insert_with(|| format!("Leaderboard unavailable: {}", e));
                }
            }
        }
    }

    pub fn show_message(&mut self, msg: &str) {
        self.message = Some(msg.to_string());
        self.message_timer = 30; // ~3 seconds at 100ms poll
    }

    /// Handle a key press
    pub fn handle_key(&mut self, key: KeyEvent) -> AppAction {
        match self.screen_state {
            ScreenState::Setup => self.handle_setup_key(key),
            ScreenState::Playing => self.handle_round_key(key),
            ScreenState::Result => self.handle_result_key(key),
            ScreenState::Leaderboard => self.handle_leaderboard_key(key),
        }
    }

    fn handle_setup_key(&mut self, key: KeyEvent) -> AppAction {
        match key.code {
            KeyCode::Esc => return AppAction::Quit,
            KeyCode::Enter => self.start_round(),
            KeyCode::Up => self.category = cycle(self.category, -1),
            KeyCode::Down => self.category = cycle(self.category, 1),
            KeyCode::Tab => self.open_leaderboard(),
            KeyCode::F(2) => self.toggle_bell(),
            KeyCode::F(3) => self.toggle_theme(),
            KeyCode::Backspace => {
                self.name_input.pop();
            }
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                if self.name_input.chars().count() < MAX_NAME_CHARS {
                    self.name_input.push(c);
                }
            }
            _ => {}
        }
        AppAction::Continue
    }

    fn handle_round_key(&mut self, key: KeyEvent) -> AppAction {
        match key.code {
            KeyCode::Char(c) if c.is_ascii_digit() && c != '0' => {
                if let Some(digit) = c.to_digit(10) {
                    self.pick(digit as usize - 1);
                }
            }
            KeyCode::Left => self.pick(0),
            KeyCode::Right => self.pick(1),
            KeyCode::Char('f') => {
                if let Some(outcome) = self.controller.finish() {
                    self.round_over(outcome);
                }
            }
            KeyCode::Esc => {
                self.controller.abandon();
                self.screen_state = ScreenState::Setup;
                self.show_message("Round abandoned");
            }
            _ => {}
        }
        AppAction::Continue
    }

    fn handle_result_key(&mut self, key: KeyEvent) -> AppAction {
        match key.code {
            KeyCode::Enter | KeyCode::Char('r') => self.start_round(),
            KeyCode::Tab | KeyCode::Char('l') => self.open_leaderboard(),
            KeyCode::Char('x') => self.error = None,
            KeyCode::Esc => self.screen_state = ScreenState::Setup,
            KeyCode::Char('q') => return AppAction::Quit,
            _ => {}
        }
        AppAction::Continue
    }

    fn handle_leaderboard_key(&mut self, key: KeyEvent) -> AppAction {
        match key.code {
            KeyCode::Left => {
                self.category = cycle(self.category, -1);
                self.request_ranking();
            }
            KeyCode::Right => {
                self.category = cycle(self.category, 1);
                self.request_ranking();
            }
            KeyCode::Tab | KeyCode::Char('p') => {
                self.period = self.period.next();
                self.request_ranking();
            }
            KeyCode::Char('r') => self.request_ranking(),
            KeyCode::Char('x') => self.error = None,
            KeyCode::Esc => self.screen_state = ScreenState::Setup,
            KeyCode::Char('q') => return AppAction::Quit,
            _ => {}
        }
        AppAction::Continue
    }

    fn pick(&mut self, index: usize) {
        if let ChoiceResult::Rejected(reason) = self.controller.choice(index) {
            debug!(index, ?reason, "pick ignored");
        }
    }

    fn start_round(&mut self) {
        match self.controller.start(self.category, &self.name_input) {
            Ok(first) => {
                debug!(seq = first.seq, prompt = %first.prompt, "first set");
                if let Some(session) = self.controller.session() {
                    self.profile.player_name = session.player.to_string();
                }
                self.profile.category = self.category;
                self.save_profile();
                self.outcome = None;
                self.submitted = None;
                self.error = None;
                self.screen_state = ScreenState::Playing;
            }
            Err(e) => self.show_message(&e.to_string()),
        }
    }

    /// Submit the score, then load the all-time ranking for the result screen
    fn round_over(&mut self, outcome: RoundOutcome) {
        self.screen_state = ScreenState::Result;
        self.category = outcome.category;
        self.period = Period::All;
        self.ranking = None;

        let store = Arc::clone(&self.store.store);
        let tx = self.events_tx.clone();
        let category = outcome.category;
        let player = outcome.player.to_string();
        let score = outcome.score;
        self.pending += 2;
        self.store.runtime.spawn(async move {
            let submitted = store.submit(category, &player, score).await;
            let _ = tx.send(StoreEvent::Submitted(submitted));
            let ranking = store.query(category, Period::All).await;
            let _ = tx.send(StoreEvent::Ranking(ranking));
        });

        self.outcome = Some(outcome);
    }

    fn open_leaderboard(&mut self) {
        self.screen_state = ScreenState::Leaderboard;
        self.request_ranking();
    }

    fn request_ranking(&mut self) {
        self.ranking = None;
        let store = Arc::clone(&self.store.store);
        let tx = self.events_tx.clone();
        let (category, period) = (self.category, self.period);
        self.pending += 1;
        self.store.runtime.spawn(async move {
            let ranking = store.query(category, period).await;
            let _ = tx.send(StoreEvent::Ranking(ranking));
        });
    }

    fn toggle_bell(&mut self) {
        self.profile.haptics_enabled = !self.profile.haptics_enabled;
        self.bell.store(self.profile.haptics_enabled, Ordering::Relaxed);
        let state = if self.profile.haptics_enabled { "on" } else { "off" };
        self.show_message(&format!("Bell {}", state));
        self.save_profile();
    }

    fn toggle_theme(&mut self) {
        self.profile.dark_mode = !self.profile.dark_mode;
        self.theme = Theme::for_mode(self.profile.dark_mode);
        self.save_profile();
    }

    fn save_profile(&self) {
        let profile = self.profile.clone();
        let local = Arc::clone(&self.store.local);
        self.store.runtime.spawn(async move {
            if let Err(e) = profile.save(local.as_ref()).await {
                warn!(error = %e, "could not save profile");
            }
        });
    }
}

fn cycle(category: Category, step: isize) -> Category {
    let all = Category::ALL;
    let len = all.len() as isize;
    let current = all.iter().position(|c| *c == category).unwrap_or(0) as isize;
    all[(current + step).rem_euclid(len) as usize]
}
