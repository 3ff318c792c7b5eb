//! Keyword-based category classification
//!
//! Fallback used when the model supplies no category (or an unrecognized
//! one); a valid model-provided category always takes precedence. Keyword
//! tables cover the three receipt languages. Matching walks categories in
//! declaration order and the first hit wins, so a keyword living in two
//! tables resolves to the earlier category.

use crate::models::Category;

/// Ordered keyword tables. English keywords are stored lowercase and the
/// item name is lowercased before matching; CJK keywords match as-is.
static CATEGORY_KEYWORDS: &[(Category, &[&str])] = &[
    (
        Category::Food,
        &[
            // Japanese
            "おにぎり", "弁当", "パン", "サンドイッチ", "ラーメン", "寿司", "うどん", "そば",
            "カレー", "定食", "丼", "ハンバーガー", "ピザ", "菓子", "スナック", "チョコ",
            // English
            "rice", "bread", "sandwich", "noodle", "sushi", "curry", "burger", "pizza",
            "snack", "chocolate", "candy", "meal", "food", "lunch", "dinner", "breakfast",
            // Chinese
            "飯", "麵", "便當", "餐", "小吃", "零食",
        ],
    ),
    (
        Category::Beverage,
        &[
            // Japanese
            "お茶", "コーヒー", "ジュース", "水", "ビール", "酒", "ワイン", "ミルク",
            "ドリンク", "飲料",
            // English
            "tea", "coffee", "juice", "water", "beer", "wine", "milk", "drink", "beverage",
            "soda", "coke", "cola",
            // Chinese
            "茶", "咖啡", "果汁", "飲料", "啤酒", "酒",
        ],
    ),
    (
        Category::Transport,
        &[
            // Japanese
            "切符", "乗車券", "特急", "新幹線", "バス", "タクシー", "地下鉄", "電車",
            "ガソリン", "駐車", "航空", "フライト",
            // English
            "ticket", "train", "bus", "taxi", "subway", "metro", "gas", "fuel", "parking",
            "flight", "airline", "uber", "grab",
            // Chinese
            "車票", "機票", "計程車", "公車", "捷運", "高鐵", "油資", "停車",
        ],
    ),
    (
        Category::Lodging,
        &[
            // Japanese
            "ホテル", "旅館", "民宿", "宿泊",
            // English
            "hotel", "hostel", "airbnb", "inn", "lodge", "accommodation", "room", "stay",
            // Chinese
            "飯店", "旅館", "民宿", "住宿",
        ],
    ),
    (
        Category::Shopping,
        &[
            // Japanese
            "服", "靴", "バッグ", "アクセサリー", "お土産", "雑貨", "化粧品", "電子",
            // English
            "clothing", "clothes", "shoes", "bag", "souvenir", "gift", "cosmetic",
            "electronics", "phone", "accessory",
            // Chinese
            "衣服", "鞋", "包", "紀念品", "禮物", "化妝品", "電子",
        ],
    ),
    (
        Category::Entertainment,
        &[
            // Japanese
            "入場", "チケット", "映画", "遊園地", "博物館", "美術館", "観光",
            // English
            "ticket", "admission", "movie", "cinema", "museum", "park", "attraction",
            "tour", "show", "concert", "game",
            // Chinese
            "門票", "電影", "遊樂園", "博物館", "美術館", "觀光",
        ],
    ),
    (
        Category::Health,
        &[
            // Japanese
            "薬", "医療", "病院", "クリニック", "ドラッグ",
            // English
            "medicine", "pharmacy", "drug", "medical", "clinic", "hospital", "health",
            // Chinese
            "藥", "醫療", "診所", "醫院",
        ],
    ),
];

fn subcategory_table(category: Category) -> &'static [(&'static str, &'static [&'static str])] {
    match category {
        Category::Food => &[
            ("meal", &["定食", "弁当", "ランチ", "lunch", "dinner", "breakfast", "餐"]),
            ("snack", &["おにぎり", "パン", "菓子", "snack", "candy", "chocolate", "零食"]),
            ("groceries", &["grocery", "食材", "野菜", "fruit"]),
        ],
        Category::Beverage => &[
            ("coffee", &["コーヒー", "coffee", "咖啡", "カフェ", "latte", "espresso"]),
            ("alcohol", &["ビール", "酒", "ワイン", "beer", "wine", "sake", "啤酒"]),
            ("soft_drink", &["ジュース", "juice", "soda", "cola", "coke", "果汁"]),
        ],
        Category::Transport => &[
            ("train", &["電車", "新幹線", "特急", "train", "railway", "火車", "高鐵"]),
            ("taxi", &["タクシー", "taxi", "uber", "grab", "計程車"]),
            ("flight", &["航空", "flight", "airline", "機票", "飛機"]),
            ("fuel", &["ガソリン", "gas", "fuel", "油資"]),
        ],
        Category::Lodging => &[
            ("hotel", &["ホテル", "hotel", "飯店"]),
            ("hostel", &["ホステル", "hostel", "青旅"]),
            ("airbnb", &["airbnb", "民泊", "民宿"]),
        ],
        Category::Shopping => &[
            ("clothing", &["服", "clothes", "clothing", "衣服", "shirt", "pants"]),
            ("souvenir", &["お土産", "souvenir", "gift", "紀念品", "禮物"]),
            ("electronics", &["電子", "electronics", "phone", "電器"]),
        ],
        Category::Entertainment => &[
            ("ticket", &["チケット", "ticket", "入場", "門票"]),
            ("activity", &["体験", "experience", "tour", "活動"]),
            ("attraction", &["遊園地", "park", "museum", "遊樂園", "博物館"]),
        ],
        Category::Health => &[
            ("pharmacy", &["薬局", "ドラッグ", "pharmacy", "drug", "藥局"]),
            ("medical", &["医療", "病院", "clinic", "醫療", "診所"]),
        ],
        Category::Other => &[],
    }
}

/// Classifies item names into spending categories
#[derive(Debug, Default, Clone, Copy)]
pub struct CategoryClassifier;

impl CategoryClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Classify an item name. Categories are tried in declaration order
    /// and the first keyword hit wins; no hit means `Category::Other`.
    pub fn classify(&self, item_name: &str) -> Category {
        let item_lower = item_name.to_lowercase();
        for (category, keywords) in CATEGORY_KEYWORDS {
            if keywords.iter().any(|k| item_lower.contains(k)) {
                return *category;
            }
        }
        Category::Other
    }

    /// Finer-grained tag within a category, when a keyword suggests one
    pub fn subcategory(&self, item_name: &str, category: Category) -> Option<&'static str> {
        let item_lower = item_name.to_lowercase();
        for (subcategory, keywords) in subcategory_table(category) {
            if keywords.iter().any(|k| item_lower.contains(k)) {
                return Some(*subcategory);
            }
        }
        None
    }
}
