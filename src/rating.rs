/// Star rating as displayed on the catalog: one word per star count.
///
/// Both the extractor and the UI filter go through this table, so the
/// word-to-integer association exists in exactly one place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rating {
    One,
    Two,
    Three,
    Four,
    Five,
}

impl Rating {
    pub const ALL: [Rating; 5] = [
        Rating::One,
        Rating::Two,
        Rating::Three,
        Rating::Four,
        Rating::Five,
    ];

    pub fn from_word(word: &str) -> Option<Rating> {
        match word {
            "One" => Some(Rating::One),
            "Two" => Some(Rating::Two),
            "Three" => Some(Rating::Three),
            "Four" => Some(Rating::Four),
            "Five" => Some(Rating::Five),
            _ => None,
        }
    }

    pub fn from_int(n: i32) -> Option<Rating> {
        match n {
            1 => Some(Rating::One),
            2 => Some(Rating::Two),
            3 => Some(Rating::Three),
            4 => Some(Rating::Four),
            5 => Some(Rating::Five),
            _ => None,
        }
    }

    pub fn as_int(self) -> i32 {
        match self {
            Rating::One => 1,
            Rating::Two => 2,
            Rating::Three => 3,
            Rating::Four => 4,
            Rating::Five => 5,
        }
    }

    pub fn word(self) -> &'static str {
        match self {
            Rating::One => "One",
            Rating::Two => "Two",
            Rating::Three => "Three",
            Rating::Four => "Four",
            Rating::Five => "Five",
        }
    }
}

// ── Tests ──
