//! Round state machine: Idle -> Active -> Bonus* -> Ended

use crate::bonus::{DistractorLog, RecallStage};
use crate::category::Category;
use crate::clock::ClockSignal;
use crate::config::{BonusStageSpec, CategoryConfig, GameConfig};
use crate::dice::{Dice, RngDice};
use crate::error::NameError;
use crate::generator::ItemGenerator;
use crate::haptics::{HapticFeedback, HapticKind, NoHaptics};
use crate::item::ChoiceSet;
use crate::name::NameValidator;
use crate::scoring::{ChoiceResult, RejectReason, ScoringEngine};
use crate::session::{RoundOutcome, RoundSession, SessionStatus};
use crate::timer::TimerSlot;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundPhase {
    Idle,
    Active,
    /// Recall stages after the countdown
    Bonus,
    Ended,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StartError {
    #[error(transparent)]
    InvalidName(#[from] NameError),
    #[error("a round is already in progress")]
    RoundInProgress,
}

/// Everything that lives exactly as long as one round
struct Round {
    session: RoundSession,
    config: CategoryConfig,
    generator: ItemGenerator,
    scoring: ScoringEngine,
    current: Option<ChoiceSet>,
    feedback: Option<ChoiceResult>,
    feedback_timer: TimerSlot,
    reveal_timer: TimerSlot,
    distractors: DistractorLog,
    pending_stages: VecDeque<BonusStageSpec>,
    stage: Option<RecallStage>,
    finalized: bool,
}

impl Round {
    fn new(session: RoundSession, config: CategoryConfig) -> Self {
        let category = session.category;
        Self {
            generator: ItemGenerator::new(category, &config),
            scoring: ScoringEngine::new(&config),
            session,
            config,
            current: None,
            feedback: None,
            feedback_timer: TimerSlot::new("feedback"),
            reveal_timer: TimerSlot::new("reveal"),
            distractors: DistractorLog::default(),
            pending_stages: VecDeque::new(),
            stage: None,
            finalized: false,
        }
    }

    fn in_fever(&self) -> bool {
        self.session.clock.within_last(self.config.fever.window)
    }

    fn spawn_set(&mut self, dice: &mut dyn Dice) -> ChoiceSet {
        let set = self.generator.next_set(dice, self.in_fever());
        for decoy in set.decoys() {
            self.distractors.record(&decoy.display_value);
        }
        self.current = Some(set.clone());
        self.feedback = None;
        set
    }

    fn cancel_timers(&mut self) {
        self.feedback_timer.cancel();
        self.reveal_timer.cancel();
    }
}

/// Owns the single authoritative [`RoundSession`].
///
/// The front end feeds it one [`tick`](Self::tick) per 100ms and forwards
/// picks through [`choice`](Self::choice). Every scheduled callback is a
/// [`TimerSlot`] owned by the round, so transitions cancel them and nothing
/// can fire into a round that has moved on.
pub struct RoundController {
    config: GameConfig,
    dice: Box<dyn Dice>,
    haptics: Arc<dyn HapticFeedback>,
    phase: RoundPhase,
    round: Option<Round>,
}

impl RoundController {
    pub fn new(config: GameConfig) -> Self {
        Self {
            config,
            dice: Box::new(RngDice::from_entropy()),
            haptics: Arc::new(NoHaptics),
            phase: RoundPhase::Idle,
            round: None,
        }
    }

    pub fn with_dice(mut self, dice: Box<dyn Dice>) -> Self {
        self.dice = dice;
        self
    }

    pub fn with_haptics(mut self, haptics: Arc<dyn HapticFeedback>) -> Self {
        self.haptics = haptics;
        self
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn phase(&self) -> RoundPhase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        matches!(self.phase, RoundPhase::Active | RoundPhase::Bonus)
    }

    /// Session of the current or just-finished round
    pub fn session(&self) -> Option<&RoundSession> {
        self.round.as_ref().map(|r| &r.session)
    }

    pub fn current_set(&self) -> Option<&ChoiceSet> {
        self.round.as_ref().and_then(|r| r.current.as_ref())
    }

    /// Result of the last pick while its feedback is showing
    pub fn feedback(&self) -> Option<ChoiceResult> {
        self.round.as_ref().and_then(|r| r.feedback)
    }

    pub fn recall_stage(&self) -> Option<&RecallStage> {
        self.round.as_ref().and_then(|r| r.stage.as_ref())
    }

    pub fn in_fever(&self) -> bool {
        self.phase == RoundPhase::Active && self.round.as_ref().is_some_and(Round::in_fever)
    }

    pub fn time_remaining(&self) -> u32 {
        self.session().map_or(0, RoundSession::time_remaining)
    }

    pub fn start(&mut self, category: Category, raw_name: &str) -> Result<ChoiceSet, StartError> {
        if self.is_running() {
            return Err(StartError::RoundInProgress);
        }
        let player = NameValidator::validate(raw_name)?;
        let config = self.config.category(category);

        let session = RoundSession::new(category, player, config.initial_time);
        let mut round = Round::new(session, config);
        let first = round.spawn_set(self.dice.as_mut());

        info!(
            %category,
            player = %round.session.player,
            time = round.session.time_remaining(),
            "round started"
        );
        self.round = Some(round);
        self.phase = RoundPhase::Active;
        Ok(first)
    }

    /// Resolve a pick. During recall stages `index` selects a recall option.
    pub fn choice(&mut self, index: usize) -> ChoiceResult {
        match self.phase {
            RoundPhase::Active => self.pick(index),
            RoundPhase::Bonus => self.recall(index),
            RoundPhase::Idle | RoundPhase::Ended => ChoiceResult::Rejected(RejectReason::RoundOver),
        }
    }

    fn pick(&mut self, index: usize) -> ChoiceResult {
        let Some(round) = self.round.as_mut() else {
            return ChoiceResult::Rejected(RejectReason::RoundOver);
        };
        let Some(set) = round.current.as_ref() else {
            return ChoiceResult::Rejected(RejectReason::RoundOver);
        };

        let pending = round.feedback_timer.is_armed();
        let result = round.scoring.resolve(&mut round.session, set, index, pending);
        match result {
            ChoiceResult::Rejected(reason) => {
                debug!(?reason, index, "pick dropped");
                return result;
            }
            ChoiceResult::Correct { tier, .. } => {
                let kind = if tier.is_rare() {
                    HapticKind::Rare
                } else {
                    HapticKind::Correct
                };
                self.haptics.trigger(kind);
            }
            ChoiceResult::Incorrect { .. } => self.haptics.trigger(HapticKind::Incorrect),
            ChoiceResult::Recall { .. } => {}
        }

        round.feedback = Some(result);
        round.feedback_timer.arm(round.config.feedback_ticks);
        result
    }

    fn recall(&mut self, index: usize) -> ChoiceResult {
        let Some(round) = self.round.as_mut() else {
            return ChoiceResult::Rejected(RejectReason::RoundOver);
        };
        let Some(stage) = round.stage.as_mut() else {
            return ChoiceResult::Rejected(RejectReason::RoundOver);
        };
        if stage.is_answered() {
            return ChoiceResult::Rejected(RejectReason::FeedbackPending);
        }
        if index >= stage.options.len() {
            return ChoiceResult::Rejected(RejectReason::OutOfRange);
        }

        let correct = index == stage.answer;
        let bonus = if correct { stage.bonus } else { 0 };
        stage.result = Some(correct);
        round.session.score += bonus;
        round.session.bonus_awarded += bonus;
        round.reveal_timer.arm(stage.reveal_ticks);

        debug!(kind = ?stage.kind, correct, bonus, "recall answered");
        self.haptics.trigger(if correct {
            HapticKind::Correct
        } else {
            HapticKind::Incorrect
        });

        let result = ChoiceResult::Recall { correct, bonus };
        round.feedback = Some(result);
        result
    }

    /// Advance one timer signal. Returns the outcome on the tick that ends the round.
    pub fn tick(&mut self) -> Option<RoundOutcome> {
        match self.phase {
            RoundPhase::Active => {
                let round = self.round.as_mut()?;
                if round.session.clock.tick() == ClockSignal::Expired {
                    return self.expire();
                }
                if round.feedback_timer.advance() {
                    round.spawn_set(self.dice.as_mut());
                }
                None
            }
            RoundPhase::Bonus => {
                let round = self.round.as_mut()?;
                if round.reveal_timer.advance() {
                    return self.next_stage();
                }
                None
            }
            RoundPhase::Idle | RoundPhase::Ended => None,
        }
    }

    /// Manual end trigger.
    ///
    /// During the countdown this behaves like clock expiry. During recall
    /// stages the remaining stages are skipped. Safe to call at any time.
    pub fn finish(&mut self) -> Option<RoundOutcome> {
        match self.phase {
            RoundPhase::Active => self.expire(),
            RoundPhase::Bonus => self.finalize(),
            RoundPhase::Idle | RoundPhase::Ended => None,
        }
    }

    /// Drop the round without producing a score
    pub fn abandon(&mut self) {
        if let Some(mut round) = self.round.take() {
            round.cancel_timers();
            info!(category = %round.session.category, "round abandoned");
        }
        self.phase = RoundPhase::Idle;
    }

    /// Countdown is over: stop input, roll the chained recall stages
    fn expire(&mut self) -> Option<RoundOutcome> {
        let round = self.round.as_mut()?;
        if round.finalized {
            return None;
        }
        round.session.clock.expire();
        round.cancel_timers();
        round.current = None;
        round.feedback = None;

        let stages = round.config.bonus_stages.clone();
        let dice = self.dice.as_mut();
        round.pending_stages = stages
            .into_iter()
            .filter(|spec| dice.chance(spec.probability))
            .collect();

        debug!(
            score = round.session.score,
            stages = round.pending_stages.len(),
            "countdown expired"
        );
        self.next_stage()
    }

    fn next_stage(&mut self) -> Option<RoundOutcome> {
        let round = self.round.as_mut()?;
        round.stage = None;
        round.feedback = None;

        while let Some(spec) = round.pending_stages.pop_front() {
            let pool = round.generator.recall_pool();
            if let Some(stage) = RecallStage::build(&spec, &round.distractors, &pool, self.dice.as_mut()) {
                debug!(kind = ?stage.kind, options = stage.options.len(), "recall stage");
                round.stage = Some(stage);
                round.session.status = SessionStatus::Bonus;
                self.phase = RoundPhase::Bonus;
                return None;
            }
        }
        self.finalize()
    }

    /// Yields the outcome exactly once per round
    fn finalize(&mut self) -> Option<RoundOutcome> {
        let round = self.round.as_mut()?;
        if round.finalized {
            return None;
        }
        round.finalized = true;
        round.cancel_timers();
        round.pending_stages.clear();
        round.stage = None;
        round.current = None;
        round.feedback = None;
        round.session.status = SessionStatus::Ended;
        self.phase = RoundPhase::Ended;

        let outcome = RoundOutcome::from(round.session.clone());
        info!(
            category = %outcome.category,
            player = %outcome.player,
            score = outcome.score,
            correct = outcome.correct,
            incorrect = outcome.incorrect,
            bonus = outcome.bonus_awarded,
            "round finished"
        );
        self.haptics.trigger(HapticKind::RoundOver);
        Some(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RecallKind;
    use crate::dice::scripted::ScriptedDice;
    use crate::item::Tier;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingHaptics(Mutex<Vec<HapticKind>>);

    impl HapticFeedback for RecordingHaptics {
        fn trigger(&self, kind: HapticKind) {
            self.0.lock().unwrap().push(kind);
        }
    }

    fn controller(dice: ScriptedDice) -> RoundController {
        RoundController::new(GameConfig::default()).with_dice(Box::new(dice))
    }

    fn correct_index(ctrl: &RoundController) -> usize {
        ctrl.current_set().unwrap().correct_index()
    }

    fn wrong_index(ctrl: &RoundController) -> usize {
        (correct_index(ctrl) + 1) % ctrl.current_set().unwrap().len()
    }

    fn ticks(ctrl: &mut RoundController, n: usize) -> Vec<RoundOutcome> {
        (0..n).filter_map(|_| ctrl.tick()).collect()
    }

    #[test]
    fn test_start_validates_name() {
        let mut ctrl = controller(ScriptedDice::new());
        assert_eq!(
            ctrl.start(Category::Flag, "   ").unwrap_err(),
            StartError::InvalidName(NameError::Empty)
        );
        assert!(matches!(
            ctrl.start(Category::Flag, "abcdefghijklm"),
            Err(StartError::InvalidName(NameError::TooLong { len: 13, max: 12 }))
        ));
        assert_eq!(ctrl.phase(), RoundPhase::Idle);

        let first = ctrl.start(Category::Flag, "  Aki ").unwrap();
        assert_eq!(first.seq, 1);
        assert_eq!(ctrl.session().unwrap().player.as_str(), "Aki");
        assert_eq!(ctrl.time_remaining(), 300);
    }

    #[test]
    fn test_start_rejected_while_running() {
        let mut ctrl = controller(ScriptedDice::new());
        ctrl.start(Category::Island, "Aki").unwrap();
        assert_eq!(
            ctrl.start(Category::Island, "Aki").unwrap_err(),
            StartError::RoundInProgress
        );
    }

    #[test]
    fn test_input_dropped_during_feedback() {
        let mut ctrl = controller(ScriptedDice::new());
        ctrl.start(Category::Flag, "Aki").unwrap();
        let index = correct_index(&ctrl);
        assert!(matches!(ctrl.choice(index), ChoiceResult::Correct { .. }));
        assert_eq!(
            ctrl.choice(index),
            ChoiceResult::Rejected(RejectReason::FeedbackPending)
        );
        assert_eq!(ctrl.session().unwrap().score, 1);

        // Next set appears after the debounce
        ticks(&mut ctrl, 3);
        assert_eq!(ctrl.current_set().unwrap().seq, 2);
        assert!(ctrl.feedback().is_none());
        let index = correct_index(&ctrl);
        assert!(matches!(ctrl.choice(index), ChoiceResult::Correct { streak: 2, .. }));
    }

    #[test]
    fn test_streak_resets_before_next_set() {
        let mut ctrl = controller(ScriptedDice::new());
        ctrl.start(Category::Flag, "Aki").unwrap();
        for _ in 0..2 {
            let index = correct_index(&ctrl);
            ctrl.choice(index);
            ticks(&mut ctrl, 3);
        }
        assert_eq!(ctrl.session().unwrap().streak, 2);

        let seq = ctrl.current_set().unwrap().seq;
        let index = wrong_index(&ctrl);
        assert_eq!(ctrl.choice(index), ChoiceResult::Incorrect { penalty: 30 });
        assert_eq!(ctrl.session().unwrap().streak, 0);
        assert_eq!(ctrl.current_set().unwrap().seq, seq);
    }

    #[test]
    fn test_ultra_rare_in_fever_applies_once() {
        let mut game = GameConfig::default();
        let mut config = CategoryConfig::strawberry();
        config.initial_time = 50;
        game.set_category(Category::Strawberry, config);

        // 0.04 only beats the 1% UltraRare chance under the 5x fever boost
        let dice = ScriptedDice::new().with_rolls(&[0.04]);
        let mut ctrl = RoundController::new(game).with_dice(Box::new(dice));
        let first = ctrl.start(Category::Strawberry, "Aki").unwrap();
        assert_eq!(first.tier(), Tier::UltraRare);
        assert!(ctrl.in_fever());

        let result = ctrl.choice(first.correct_index());
        assert_eq!(
            result,
            ChoiceResult::Correct {
                tier: Tier::UltraRare,
                points: 5,
                time_bonus: 50,
                streak: 1
            }
        );
        assert_eq!(ctrl.time_remaining(), 100);

        ticks(&mut ctrl, 3);
        assert_eq!(ctrl.session().unwrap().score, 5);
        assert_eq!(ctrl.time_remaining(), 97);
        assert_eq!(ctrl.current_set().unwrap().tier(), Tier::Normal);
    }

    #[test]
    fn test_expiry_yields_outcome_once() {
        let mut ctrl = controller(ScriptedDice::new());
        ctrl.start(Category::Flag, "Aki").unwrap();
        let outcomes = ticks(&mut ctrl, 400);
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].score, 0);
        assert_eq!(ctrl.phase(), RoundPhase::Ended);
        assert!(ctrl.finish().is_none());
        assert!(ctrl.tick().is_none());
        assert_eq!(ctrl.choice(0), ChoiceResult::Rejected(RejectReason::RoundOver));
    }

    #[test]
    fn test_manual_finish_races_with_expiry() {
        let mut ctrl = controller(ScriptedDice::new());
        ctrl.start(Category::Island, "Aki").unwrap();
        let index = correct_index(&ctrl);
        ctrl.choice(index);

        let outcome = ctrl.finish().unwrap();
        assert_eq!(outcome.score, 1);
        assert!(ctrl.finish().is_none());
        assert!(ticks(&mut ctrl, 400).is_empty());
        // Feedback timer was cancelled, no set spawned after the end
        assert!(ctrl.current_set().is_none());
    }

    #[test]
    fn test_penalty_to_zero_ends_on_next_tick() {
        let mut game = GameConfig::default();
        let mut config = CategoryConfig::defaults(Category::Flag);
        config.initial_time = 20;
        game.set_category(Category::Flag, config);
        let mut ctrl = RoundController::new(game).with_dice(Box::new(ScriptedDice::new()));
        ctrl.start(Category::Flag, "Aki").unwrap();

        let index = wrong_index(&ctrl);
        ctrl.choice(index);
        assert_eq!(ctrl.time_remaining(), 0);
        assert!(ctrl.tick().is_some());
    }

    #[test]
    fn test_chained_recall_stages() {
        // Two rolls for the first set, then one per recall stage
        let dice = ScriptedDice::new().with_rolls(&[0.99, 0.99, 0.0, 0.0]);
        let mut ctrl = controller(dice);
        ctrl.start(Category::Strawberry, "Aki").unwrap();

        assert!(ctrl.finish().is_none());
        assert_eq!(ctrl.phase(), RoundPhase::Bonus);
        let stage = ctrl.recall_stage().unwrap().clone();
        assert_eq!(stage.kind, RecallKind::LastDistractor);
        assert!(stage.options.len() >= 2);

        assert_eq!(
            ctrl.choice(stage.answer),
            ChoiceResult::Recall {
                correct: true,
                bonus: 2
            }
        );
        assert_eq!(
            ctrl.choice(stage.answer),
            ChoiceResult::Rejected(RejectReason::FeedbackPending)
        );
        assert!(ticks(&mut ctrl, 20).is_empty());

        let stage = ctrl.recall_stage().unwrap().clone();
        assert_eq!(stage.kind, RecallKind::FirstDistractor);
        let wrong = (stage.answer + 1) % stage.options.len();
        assert_eq!(
            ctrl.choice(wrong),
            ChoiceResult::Recall {
                correct: false,
                bonus: 0
            }
        );

        let outcomes = ticks(&mut ctrl, 40);
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].score, 2);
        assert_eq!(outcomes[0].bonus_awarded, 2);
        assert_eq!(ctrl.phase(), RoundPhase::Ended);
    }

    #[test]
    fn test_skipped_stage_rolls() {
        // Default rolls of 0.99 pass the 100% stage and miss the 50% one
        let mut ctrl = controller(ScriptedDice::new());
        ctrl.start(Category::Strawberry, "Aki").unwrap();
        ctrl.finish();
        let stage = ctrl.recall_stage().unwrap().clone();
        ctrl.choice(stage.answer);
        let outcomes = ticks(&mut ctrl, 20);
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].bonus_awarded, 2);
    }

    #[test]
    fn test_finish_during_bonus_skips_stages() {
        let mut ctrl = controller(ScriptedDice::new());
        ctrl.start(Category::Strawberry, "Aki").unwrap();
        ctrl.finish();
        assert_eq!(ctrl.phase(), RoundPhase::Bonus);
        let outcome = ctrl.finish().unwrap();
        assert_eq!(outcome.bonus_awarded, 0);
        assert!(ctrl.recall_stage().is_none());
        assert!(ctrl.finish().is_none());
    }

    #[test]
    fn test_abandon_discards_round() {
        let mut ctrl = controller(ScriptedDice::new());
        ctrl.start(Category::Color, "Aki").unwrap();
        let index = correct_index(&ctrl);
        ctrl.choice(index);
        ctrl.abandon();
        assert_eq!(ctrl.phase(), RoundPhase::Idle);
        assert!(ctrl.session().is_none());
        assert!(ticks(&mut ctrl, 400).is_empty());
        assert!(ctrl.start(Category::Color, "Aki").is_ok());
    }

    #[test]
    fn test_haptics_fired() {
        let haptics = Arc::new(RecordingHaptics::default());
        let mut ctrl = controller(ScriptedDice::new()).with_haptics(haptics.clone());
        ctrl.start(Category::Flag, "Aki").unwrap();
        let index = correct_index(&ctrl);
        ctrl.choice(index);
        ticks(&mut ctrl, 3);
        let index = wrong_index(&ctrl);
        ctrl.choice(index);
        ctrl.finish();
        ctrl.finish();

        let kinds = haptics.0.lock().unwrap().clone();
        assert_eq!(
            kinds,
            vec![HapticKind::Correct, HapticKind::Incorrect, HapticKind::RoundOver]
        );
    }

    #[test]
    fn test_new_round_after_end() {
        let mut ctrl = controller(ScriptedDice::new());
        ctrl.start(Category::Square, "Aki").unwrap();
        ctrl.finish().unwrap();
        ctrl.start(Category::Square, "Ren").unwrap();
        assert_eq!(ctrl.phase(), RoundPhase::Active);
        assert_eq!(ctrl.session().unwrap().score, 0);
    }
}
