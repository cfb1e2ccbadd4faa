use serde::{Deserialize, Serialize};

/// Rarity class of a generated target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Normal,
    Rare,
    UltraRare,
}

impl Tier {
    /// Evaluation order when rolling a tier
    pub const PRIORITY: [Tier; 3] = [Tier::UltraRare, Tier::Rare, Tier::Normal];

    pub fn is_rare(self) -> bool {
        self != Tier::Normal
    }
}

/// One selectable choice
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    pub display_value: String,
    pub tier: Tier,
}

/// The items offered for one pick; exactly one of them is the answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceSet {
    /// Sequence number within the round, starting at 1
    pub seq: u64,
    pub prompt: String,
    items: Vec<Item>,
    correct: usize,
}

impl ChoiceSet {
    /// Place `answer` at `position` among `decoys` (clamped to the end)
    pub fn new(seq: u64, prompt: String, answer: Item, decoys: Vec<Item>, position: usize) -> Self {
        let mut items = decoys;
        let correct = position.min(items.len());
        items.insert(correct, answer);
        Self {
            seq,
            prompt,
            items,
            correct,
        }
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn correct_index(&self) -> usize {
        self.correct
    }

    pub fn correct_item(&self) -> &Item {
        &self.items[self.correct]
    }

    pub fn is_correct(&self, index: usize) -> bool {
        index == self.correct
    }

    /// Tier of the answer; decoys are always Normal
    pub fn tier(&self) -> Tier {
        self.correct_item().tier
    }

    pub fn decoys(&self) -> impl Iterator<Item = &Item> {
        self.items
            .iter()
            .enumerate()
            .filter(move |(i, _)| *i != self.correct)
            .map(|(_, item)| item)
    }
}
