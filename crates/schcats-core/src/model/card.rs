use core::fmt;
use core::str::FromStr;
use serde::{Deserialize, Serialize};

/// Physical card. `Hup` is the wildcard: it supports every claim but can never be claimed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Card {
    Alive = 0,
    Dead = 1,
    Empty = 2,
    Hup = 3,
}

impl Card {
    pub const ALL: [Card; 4] = [Card::Alive, Card::Dead, Card::Empty, Card::Hup];

    pub const fn is_wildcard(self) -> bool {
        matches!(self, Card::Hup)
    }

    /// The claimable category this card is, or `None` for the wildcard.
    pub const fn category(self) -> Option<Category> {
        match self {
            Card::Alive => Some(Category::Alive),
            Card::Dead => Some(Category::Dead),
            Card::Empty => Some(Category::Empty),
            Card::Hup => None,
        }
    }

    pub fn supports(self, category: Category) -> bool {
        self.is_wildcard() || self.category() == Some(category)
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Card::Alive => "alive",
            Card::Dead => "dead",
            Card::Empty => "empty",
            Card::Hup => "hup",
        };
        f.write_str(label)
    }
}

/// Claimable categories, in tie-break order (weakest first).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Category {
    Dead = 0,
    Alive = 1,
    Empty = 2,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Dead, Category::Alive, Category::Empty];

    pub const fn card(self) -> Card {
        match self {
            Category::Alive => Card::Alive,
            Category::Dead => Card::Dead,
            Category::Empty => Card::Empty,
        }
    }

    /// Empty quantities count double when claims are compared.
    pub const fn multiplier(self) -> u16 {
        match self {
            Category::Empty => 2,
            Category::Alive | Category::Dead => 1,
        }
    }

    pub const fn tier(self) -> u8 {
        self as u8
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Category::Alive => "alive",
            Category::Dead => "dead",
            Category::Empty => "empty",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ParseCategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "alive" => Ok(Category::Alive),
            "dead" => Ok(Category::Dead),
            "empty" => Ok(Category::Empty),
            other => Err(ParseCategoryError(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown claim category '{0}'")]
pub struct ParseCategoryError(pub String);
