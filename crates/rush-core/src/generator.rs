use crate::catalog::{ItemSource, PoolItem};
use crate::category::Category;
use crate::config::{CategoryConfig, FeverConfig, TierTable};
use crate::dice::{shuffle, Dice};
use crate::item::{ChoiceSet, Item, Tier};
use tracing::debug;

/// Builds the choice sets of a round.
///
/// Each set rolls its tier first (UltraRare, then Rare, then Normal), then
/// draws the target and its decoys, then places the answer uniformly among
/// the choices.
pub struct ItemGenerator {
    category: Category,
    source: ItemSource,
    tiers: TierTable,
    fever: FeverConfig,
    choice_count: usize,
    seq: u64,
}

impl ItemGenerator {
    pub fn new(category: Category, config: &CategoryConfig) -> Self {
        Self {
            category,
            source: ItemSource::for_category(category),
            tiers: config.tiers.clone(),
            fever: config.fever.clone(),
            choice_count: config.choice_count.max(2),
            seq: 0,
        }
    }

    /// Sets generated so far
    pub fn generated(&self) -> u64 {
        self.seq
    }

    /// Probability of `tier` for the next set.
    ///
    /// The fever multiplier is applied to the configured base value on every
    /// call, so it holds only while inside the window and never accumulates.
    pub fn tier_probability(&self, tier: Tier, in_fever: bool) -> f64 {
        let base = self.tiers.probability(tier);
        if in_fever && tier.is_rare() {
            (base * self.fever.multiplier).clamp(0.0, 1.0)
        } else {
            base
        }
    }

    pub fn roll_tier(&self, dice: &mut dyn Dice, in_fever: bool) -> Tier {
        Tier::PRIORITY
            .into_iter()
            .find(|&tier| tier == Tier::Normal || dice.chance(self.tier_probability(tier, in_fever)))
            .unwrap_or(Tier::Normal)
    }

    pub fn next_set(&mut self, dice: &mut dyn Dice, in_fever: bool) -> ChoiceSet {
        self.seq += 1;
        let tier = self.roll_tier(dice, in_fever);
        let decoy_count = self.choice_count - 1;

        let (prompt, answer, decoys) = match self.source {
            ItemSource::FixedTarget {
                target,
                distractors,
            } => self.fixed_target(dice, tier, target, distractors, decoy_count),
            ItemSource::Named { pool } => Self::named(dice, tier, pool, decoy_count),
            ItemSource::Squares {
                max_base,
                max_offset,
            } => Self::squares(dice, tier, max_base, max_offset, decoy_count),
        };

        let position = dice.below(self.choice_count);
        debug!(
            category = %self.category,
            seq = self.seq,
            ?tier,
            in_fever,
            position,
            "choice set generated"
        );
        ChoiceSet::new(self.seq, prompt, answer, decoys, position)
    }

    /// Glyphs a recall question may use as wrong options
    pub fn recall_pool(&self) -> Vec<String> {
        self.source.decoy_glyphs()
    }

    fn fixed_target(
        &self,
        dice: &mut dyn Dice,
        tier: Tier,
        target: PoolItem,
        distractors: &'static [PoolItem],
        decoy_count: usize,
    ) -> (String, Item, Vec<Item>) {
        let spec = self.tiers.get(tier);
        let glyph = spec
            .and_then(|s| s.glyph.clone())
            .unwrap_or_else(|| target.glyph.to_string());
        let label = spec
            .and_then(|s| s.label.clone())
            .unwrap_or_else(|| target.name.to_string());

        let mut pool: Vec<PoolItem> = distractors.to_vec();
        shuffle(dice, &mut pool);
        let decoys = pool.into_iter().take(decoy_count).map(decoy).collect();

        let answer = Item {
            id: target.id.to_string(),
            display_value: glyph,
            tier,
        };
        (format!("Which one is the {}?", label), answer, decoys)
    }

    fn named(
        dice: &mut dyn Dice,
        tier: Tier,
        pool: &'static [PoolItem],
        decoy_count: usize,
    ) -> (String, Item, Vec<Item>) {
        let target = pool[dice.below(pool.len())];

        // Same-family decoys first so the pick stays hard
        let (mut related, mut others): (Vec<PoolItem>, Vec<PoolItem>) = pool
            .iter()
            .copied()
            .filter(|p| p.id != target.id)
            .partition(|p| target.family.is_some() && p.family == target.family);
        shuffle(dice, &mut related);
        shuffle(dice, &mut others);

        let decoys = related
            .into_iter()
            .chain(others)
            .take(decoy_count)
            .map(decoy)
            .collect();

        let answer = Item {
            id: target.id.to_string(),
            display_value: target.glyph.to_string(),
            tier,
        };
        (format!("Which one is {}?", target.name), answer, decoys)
    }

    fn squares(
        dice: &mut dyn Dice,
        tier: Tier,
        max_base: u32,
        max_offset: u32,
        decoy_count: usize,
    ) -> (String, Item, Vec<Item>) {
        let base = dice.below(max_base.max(1) as usize) as u32 + 1;
        let answer = base * base;

        let mut values: Vec<u32> = Vec::with_capacity(decoy_count);
        let mut attempts = 0;
        while values.len() < decoy_count && attempts < 64 {
            attempts += 1;
            let offset = dice.below(max_offset.max(1) as usize) as u32 + 1;
            let value = if dice.below(2) == 0 {
                answer + offset
            } else {
                answer.saturating_sub(offset).max(1)
            };
            if value != answer && !values.contains(&value) {
                values.push(value);
            }
        }
        // Unlucky draws: fill upwards with unused values
        let mut next = answer + 1;
        while values.len() < decoy_count {
            if !values.contains(&next) {
                values.push(next);
            }
            next += 1;
        }

        let decoys = values
            .into_iter()
            .map(|v| Item {
                id: v.to_string(),
                display_value: v.to_string(),
                tier: Tier::Normal,
            })
            .collect();
        let answer_item = Item {
            id: answer.to_string(),
            display_value: answer.to_string(),
            tier,
        };
        (format!("What is {}²?", base), answer_item, decoys)
    }
}

fn decoy(item: PoolItem) -> Item {
    Item {
        id: item.id.to_string(),
        display_value: item.glyph.to_string(),
        tier: Tier::Normal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{COLORS, COUNTRIES};
    use crate::dice::scripted::ScriptedDice;
    use crate::dice::RngDice;
    use std::collections::HashSet;

    fn generator(category: Category) -> ItemGenerator {
        ItemGenerator::new(category, &CategoryConfig::defaults(category))
    }

    #[test]
    fn test_every_set_has_one_answer() {
        let mut dice = RngDice::seeded(42);
        for category in Category::ALL {
            let mut generator = generator(category);
            for _ in 0..200 {
                let set = generator.next_set(&mut dice, false);
                assert_eq!(set.len(), 2);
                assert!(set.correct_index() < set.len());
                let ids: HashSet<_> = set.items().iter().map(|i| i.id.as_str()).collect();
                assert_eq!(ids.len(), set.len(), "duplicate item in {:?}", set);
                assert!(set.decoys().all(|d| d.tier == Tier::Normal));
            }
        }
    }

    #[test]
    fn test_wider_sets() {
        let mut config = CategoryConfig::defaults(Category::Flag);
        config.choice_count = 4;
        let mut generator = ItemGenerator::new(Category::Flag, &config);
        let mut dice = RngDice::seeded(5);
        for _ in 0..50 {
            let set = generator.next_set(&mut dice, false);
            assert_eq!(set.len(), 4);
            assert_eq!(set.decoys().count(), 3);
        }
    }

    #[test]
    fn test_tier_priority() {
        let generator = generator(Category::Strawberry);

        // UltraRare wins without consuming the Rare roll
        let mut dice = ScriptedDice::new().with_rolls(&[0.0, 0.0]);
        assert_eq!(generator.roll_tier(&mut dice, false), Tier::UltraRare);
        assert_eq!(dice.roll(), 0.0);

        let mut dice = ScriptedDice::new().with_rolls(&[0.5, 0.02]);
        assert_eq!(generator.roll_tier(&mut dice, false), Tier::Rare);

        let mut dice = ScriptedDice::new().with_rolls(&[0.5, 0.5]);
        assert_eq!(generator.roll_tier(&mut dice, false), Tier::Normal);
    }

    #[test]
    fn test_fever_multiplier_does_not_compound() {
        let generator = generator(Category::Strawberry);
        let base = generator.tier_probability(Tier::UltraRare, false);
        for _ in 0..50 {
            assert!((generator.tier_probability(Tier::UltraRare, true) - base * 5.0).abs() < 1e-12);
        }
        assert_eq!(generator.tier_probability(Tier::UltraRare, false), base);
        assert_eq!(generator.tier_probability(Tier::Normal, true), 1.0);
    }

    #[test]
    fn test_fever_boost_changes_outcome() {
        let generator = generator(Category::Strawberry);
        // 0.04 misses the 1% base but hits the 5% fever chance
        let mut dice = ScriptedDice::new().with_rolls(&[0.04]);
        assert_eq!(generator.roll_tier(&mut dice, true), Tier::UltraRare);
        let mut dice = ScriptedDice::new().with_rolls(&[0.04, 0.5]);
        assert_eq!(generator.roll_tier(&mut dice, false), Tier::Normal);
    }

    #[test]
    fn test_rare_glyphs() {
        let mut generator = generator(Category::Strawberry);
        let mut dice = ScriptedDice::new().with_rolls(&[0.0]);
        let set = generator.next_set(&mut dice, false);
        assert_eq!(set.tier(), Tier::UltraRare);
        assert_eq!(set.correct_item().display_value, "🎂");
        assert!(set.prompt.contains("whole cake"));
    }

    #[test]
    fn test_first_pick_chooses_the_target() {
        let mut generator = generator(Category::Flag);
        let mut dice = ScriptedDice::new().with_picks(&[2]);
        let set = generator.next_set(&mut dice, false);
        assert_eq!(set.correct_item().id, COUNTRIES[2].id);
        assert!(set.prompt.contains(COUNTRIES[2].name));
    }

    #[test]
    fn test_color_decoys_prefer_family() {
        let mut generator = generator(Category::Color);
        let mut dice = RngDice::seeded(9);
        for _ in 0..200 {
            let set = generator.next_set(&mut dice, false);
            let family_of = |id: &str| COLORS.iter().find(|c| c.id == id).and_then(|c| c.family);
            let target_family = family_of(&set.correct_item().id);
            let has_siblings = COLORS
                .iter()
                .filter(|c| c.family == target_family)
                .count()
                > 1;
            if has_siblings {
                for d in set.decoys() {
                    assert_eq!(family_of(&d.id), target_family);
                }
            }
        }
    }

    #[test]
    fn test_square_decoys_differ_from_answer() {
        let mut generator = generator(Category::Square);
        let mut dice = RngDice::seeded(1);
        for _ in 0..200 {
            let set = generator.next_set(&mut dice, false);
            let answer: u32 = set.correct_item().display_value.parse().unwrap();
            let root = (answer as f64).sqrt() as u32;
            assert_eq!(root * root, answer);
            assert!(set.decoys().all(|d| d.display_value != set.correct_item().display_value));
        }
    }

    #[test]
    fn test_sequence_numbers() {
        let mut generator = generator(Category::Island);
        let mut dice = RngDice::seeded(3);
        assert_eq!(generator.next_set(&mut dice, false).seq, 1);
        assert_eq!(generator.next_set(&mut dice, false).seq, 2);
        assert_eq!(generator.generated(), 2);
    }
}
