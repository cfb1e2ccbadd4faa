//! Chained recall stages played after the countdown

use crate::config::{BonusStageSpec, RecallKind};
use crate::dice::{shuffle, Dice};
use serde::{Deserialize, Serialize};

/// Decoys shown during the round, in order of appearance
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DistractorLog {
    seen: Vec<String>,
}

impl DistractorLog {
    pub fn record(&mut self, glyph: &str) {
        self.seen.push(glyph.to_string());
    }

    pub fn first(&self) -> Option<&str> {
        self.seen.first().map(String::as_str)
    }

    pub fn last(&self) -> Option<&str> {
        self.seen.last().map(String::as_str)
    }

    pub fn answer_for(&self, kind: RecallKind) -> Option<&str> {
        match kind {
            RecallKind::LastDistractor => self.last(),
            RecallKind::FirstDistractor => self.first(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    fn distinct(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for glyph in &self.seen {
            if !out.contains(glyph) {
                out.push(glyph.clone());
            }
        }
        out
    }
}

/// A recall question: pick which decoy appeared first or last
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecallStage {
    pub kind: RecallKind,
    pub question: String,
    pub options: Vec<String>,
    pub answer: usize,
    pub bonus: u32,
    pub reveal_ticks: u32,
    /// Set once answered
    pub result: Option<bool>,
}

impl RecallStage {
    /// Build the stage, or None when nothing was shown to recall
    pub fn build(
        spec: &BonusStageSpec,
        log: &DistractorLog,
        pool: &[String],
        dice: &mut dyn Dice,
    ) -> Option<Self> {
        let answer = log.answer_for(spec.kind)?.to_string();

        let mut wrong: Vec<String> = Vec::new();
        for glyph in pool.iter().cloned().chain(log.distinct()) {
            if glyph != answer && !wrong.contains(&glyph) {
                wrong.push(glyph);
            }
        }
        shuffle(dice, &mut wrong);
        wrong.truncate(spec.option_count.saturating_sub(1));

        let mut options = wrong;
        options.push(answer.clone());
        shuffle(dice, &mut options);
        let answer_index = options.iter().position(|o| *o == answer)?;

        let question = match spec.kind {
            RecallKind::LastDistractor => "Which decoy appeared last?",
            RecallKind::FirstDistractor => "Which decoy appeared first?",
        };

        Some(Self {
            kind: spec.kind,
            question: question.to_string(),
            options,
            answer: answer_index,
            bonus: spec.bonus,
            reveal_ticks: spec.reveal_ticks,
            result: None,
        })
    }

    pub fn is_answered(&self) -> bool {
        self.result.is_some()
    }

    pub fn correct_option(&self) -> &str {
        &self.options[self.answer]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dice::RngDice;

    fn log(glyphs: &[&str]) -> DistractorLog {
        let mut log = DistractorLog::default();
        for g in glyphs {
            log.record(g);
        }
        log
    }

    fn pool() -> Vec<String> {
        ["🍎", "🍊", "🍇", "🍉", "🍍"].iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_first_and_last() {
        let log = log(&["🍎", "🍇", "🍉"]);
        assert_eq!(log.answer_for(RecallKind::FirstDistractor), Some("🍎"));
        assert_eq!(log.answer_for(RecallKind::LastDistractor), Some("🍉"));
    }

    #[test]
    fn test_stage_has_answer_among_distinct_options() {
        let mut dice = RngDice::seeded(4);
        let spec = BonusStageSpec::new(RecallKind::LastDistractor, 1.0);
        let stage = RecallStage::build(&spec, &log(&["🍎", "🍇"]), &pool(), &mut dice).unwrap();
        assert_eq!(stage.options.len(), 4);
        assert_eq!(stage.correct_option(), "🍇");
        let mut sorted = stage.options.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted.len(), 4);
    }

    #[test]
    fn test_small_pool_uses_seen_decoys() {
        let mut dice = RngDice::seeded(4);
        let spec = BonusStageSpec::new(RecallKind::FirstDistractor, 1.0);
        let stage = RecallStage::build(&spec, &log(&["12", "30", "12"]), &[], &mut dice).unwrap();
        assert_eq!(stage.options.len(), 2);
        assert_eq!(stage.correct_option(), "12");
    }

    #[test]
    fn test_no_stage_without_decoys() {
        let mut dice = RngDice::seeded(4);
        let spec = BonusStageSpec::new(RecallKind::LastDistractor, 1.0);
        assert!(RecallStage::build(&spec, &DistractorLog::default(), &pool(), &mut dice).is_none());
    }
}
