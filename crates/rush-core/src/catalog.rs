//! Built-in item pools for each category

use crate::category::Category;

/// One entry of a category pool.
///
/// `name` is what the prompt asks for, `glyph` is what the choice shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolItem {
    pub id: &'static str,
    pub name: &'static str,
    pub glyph: &'static str,
    /// Similarity group; distractors prefer the target's family
    pub family: Option<&'static str>,
}

impl PoolItem {
    const fn new(id: &'static str, name: &'static str, glyph: &'static str) -> Self {
        Self {
            id,
            name,
            glyph,
            family: None,
        }
    }

    const fn in_family(
        id: &'static str,
        name: &'static str,
        glyph: &'static str,
        family: &'static str,
    ) -> Self {
        Self {
            id,
            name,
            glyph,
            family: Some(family),
        }
    }
}

/// Where the items of a choice set come from
#[derive(Debug, Clone, Copy)]
pub enum ItemSource {
    /// The same target every time, surrounded by decoys
    FixedTarget {
        target: PoolItem,
        distractors: &'static [PoolItem],
    },
    /// A target drawn from the pool, decoys from the rest of the pool
    Named { pool: &'static [PoolItem] },
    /// Generated arithmetic: the square of a base, decoys near the answer
    Squares { max_base: u32, max_offset: u32 },
}

impl ItemSource {
    pub fn for_category(category: Category) -> Self {
        match category {
            Category::Strawberry => ItemSource::FixedTarget {
                target: STRAWBERRY,
                distractors: FRUITS,
            },
            Category::Island => ItemSource::Named { pool: ISLANDS },
            Category::Flag => ItemSource::Named { pool: COUNTRIES },
            Category::Color => ItemSource::Named { pool: COLORS },
            Category::Square => ItemSource::Squares {
                max_base: 20,
                max_offset: 20,
            },
        }
    }

    /// Number of distinct decoys available for one set
    pub fn decoy_capacity(&self) -> usize {
        match self {
            ItemSource::FixedTarget { distractors, .. } => distractors.len(),
            ItemSource::Named { pool } => pool.len().saturating_sub(1),
            ItemSource::Squares { max_offset, .. } => (*max_offset as usize) * 2,
        }
    }

    /// Glyphs a recall question may offer as wrong options
    pub fn decoy_glyphs(&self) -> Vec<String> {
        match self {
            ItemSource::FixedTarget { distractors, .. } => {
                distractors.iter().map(|d| d.glyph.to_string()).collect()
            }
            ItemSource::Named { pool } => pool.iter().map(|d| d.glyph.to_string()).collect(),
            ItemSource::Squares { .. } => Vec::new(),
        }
    }
}

pub const STRAWBERRY: PoolItem = PoolItem::new("strawberry", "strawberry", "🍓");

pub const FRUITS: &[PoolItem] = &[
    PoolItem::new("apple", "apple", "🍎"),
    PoolItem::new("tangerine", "tangerine", "🍊"),
    PoolItem::new("grapes", "grapes", "🍇"),
    PoolItem::new("watermelon", "watermelon", "🍉"),
    PoolItem::new("pineapple", "pineapple", "🍍"),
    PoolItem::new("peach", "peach", "🍑"),
    PoolItem::new("kiwi", "kiwi", "🥝"),
    PoolItem::new("blueberries", "blueberries", "🫐"),
    PoolItem::new("cherries", "cherries", "🍒"),
    PoolItem::new("melon", "melon", "🍈"),
];

pub const ISLANDS: &[PoolItem] = &[
    PoolItem::new("aogashima", "青ヶ島", "Aogashima"),
    PoolItem::new("hachijojima", "八丈島", "Hachijojima"),
    PoolItem::new("hachijokojima", "八丈小島", "Hachijo-kojima"),
    PoolItem::new("hatsushima", "初島", "Hatsushima"),
    PoolItem::new("kozushima", "神津島", "Kozushima"),
    PoolItem::new("miyakejima", "三宅島", "Miyakejima"),
    PoolItem::new("oshima", "大島", "Oshima"),
];

pub const COUNTRIES: &[PoolItem] = &[
    PoolItem::new("jp", "Japan", "🇯🇵"),
    PoolItem::new("us", "United States", "🇺🇸"),
    PoolItem::new("gb", "United Kingdom", "🇬🇧"),
    PoolItem::new("fr", "France", "🇫🇷"),
    PoolItem::new("de", "Germany", "🇩🇪"),
    PoolItem::new("it", "Italy", "🇮🇹"),
    PoolItem::new("es", "Spain", "🇪🇸"),
    PoolItem::new("ca", "Canada", "🇨🇦"),
    PoolItem::new("br", "Brazil", "🇧🇷"),
    PoolItem::new("ar", "Argentina", "🇦🇷"),
    PoolItem::new("au", "Australia", "🇦🇺"),
    PoolItem::new("nz", "New Zealand", "🇳🇿"),
    PoolItem::new("kr", "South Korea", "🇰🇷"),
    PoolItem::new("cn", "China", "🇨🇳"),
    PoolItem::new("in", "India", "🇮🇳"),
    PoolItem::new("eg", "Egypt", "🇪🇬"),
    PoolItem::new("ke", "Kenya", "🇰🇪"),
    PoolItem::new("za", "South Africa", "🇿🇦"),
    PoolItem::new("se", "Sweden", "🇸🇪"),
    PoolItem::new("no", "Norway", "🇳🇴"),
    PoolItem::new("fi", "Finland", "🇫🇮"),
    PoolItem::new("mx", "Mexico", "🇲🇽"),
    PoolItem::new("tr", "Turkey", "🇹🇷"),
    PoolItem::new("th", "Thailand", "🇹🇭"),
];

/// Traditional colour names; the glyph is the hex value the front end paints
pub const COLORS: &[PoolItem] = &[
    PoolItem::in_family("beni", "Beni (crimson)", "#D7003A", "red"),
    PoolItem::in_family("akane", "Akane (madder red)", "#B7282E", "red"),
    PoolItem::in_family("shu", "Shu (vermilion)", "#EB6101", "red"),
    PoolItem::in_family("sakura", "Sakura (cherry blossom)", "#FEF4F4", "red"),
    PoolItem::in_family("kaki", "Kaki (persimmon)", "#ED6D3D", "yellow-red"),
    PoolItem::in_family("daidai", "Daidai (bitter orange)", "#EE7800", "yellow-red"),
    PoolItem::in_family("yamabuki", "Yamabuki (kerria)", "#F8B500", "yellow"),
    PoolItem::in_family("kuchinashi", "Kuchinashi (gardenia)", "#FFD900", "yellow"),
    PoolItem::in_family("moegi", "Moegi (fresh onion)", "#AACF53", "yellow-green"),
    PoolItem::in_family("uguisu", "Uguisu (bush warbler)", "#928C36", "yellow-green"),
    PoolItem::in_family("tokiwa", "Tokiwa (evergreen)", "#007B43", "green"),
    PoolItem::in_family("wakatake", "Wakatake (young bamboo)", "#68BE8D", "green"),
    PoolItem::in_family("asagi", "Asagi (pale blue-green)", "#00A3AF", "blue-green"),
    PoolItem::in_family("ai", "Ai (indigo)", "#165E83", "blue"),
    PoolItem::in_family("ruri", "Ruri (lapis lazuli)", "#1E50A2", "blue"),
    PoolItem::in_family("sora", "Sora (sky)", "#A0D8EF", "blue"),
    PoolItem::in_family("kikyo", "Kikyo (bellflower)", "#5654A2", "blue-violet"),
    PoolItem::in_family("fuji", "Fuji (wisteria)", "#BBBCDE", "violet"),
    PoolItem::in_family("murasaki", "Murasaki (purple)", "#884898", "violet"),
    PoolItem::in_family("botan", "Botan (peony)", "#E7609E", "red-violet"),
    PoolItem::in_family("kogecha", "Kogecha (burnt tea)", "#6F4B3E", "brown"),
    PoolItem::in_family("kuri", "Kuri (chestnut)", "#762F07", "brown"),
    PoolItem::in_family("rikyu", "Rikyu-nezumi (Rikyu grey)", "#888E7E", "grayish"),
    PoolItem::in_family("sumi", "Sumi (ink)", "#595857", "achromatic"),
    PoolItem::in_family("shironeri", "Shironeri (silk white)", "#F3F3F2", "achromatic"),
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_pool_ids_are_unique() {
        for pool in [FRUITS, ISLANDS, COUNTRIES, COLORS] {
            let ids: HashSet<_> = pool.iter().map(|p| p.id).collect();
            assert_eq!(ids.len(), pool.len());
        }
    }

    #[test]
    fn test_every_category_has_decoys() {
        for category in Category::ALL {
            assert!(ItemSource::for_category(category).decoy_capacity() >= 1);
        }
    }

    #[test]
    fn test_fixed_target_is_not_a_decoy() {
        assert!(FRUITS.iter().all(|f| f.glyph != STRAWBERRY.glyph));
    }
}
