use crate::model::card::{Category, ParseCategoryError};
use core::cmp::Ordering;
use core::fmt;
use core::str::FromStr;
use serde::{Deserialize, Serialize};

/// "At least `quantity` cards supporting `category` exist across both hands."
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Claim {
    pub quantity: u8,
    pub category: Category,
}

/// Comparison key: effective quantity first, category tier second.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClaimStrength {
    pub effective: u16,
    pub tier: u8,
}

impl Claim {
    pub const fn new(quantity: u8, category: Category) -> Self {
        Self { quantity, category }
    }

    pub const fn strength(self) -> ClaimStrength {
        ClaimStrength {
            effective: self.quantity as u16 * self.category.multiplier(),
            tier: self.category.tier(),
        }
    }
}

// Strength keys are unique per (quantity, category), so this order agrees with `Eq`.
impl Ord for Claim {
    fn cmp(&self, other: &Self) -> Ordering {
        self.strength().cmp(&other.strength())
    }
}

impl PartialOrd for Claim {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Claim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.quantity, self.category)
    }
}

impl FromStr for Claim {
    type Err = ParseClaimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split_whitespace();
        let (Some(quantity), Some(category), None) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(ParseClaimError::Shape(s.to_string()));
        };
        let quantity = quantity
            .parse::<u8>()
            .map_err(|_| ParseClaimError::Quantity(quantity.to_string()))?;
        let category = category.parse::<Category>()?;
        Ok(Claim::new(quantity, category))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseClaimError {
    #[error("expected '<quantity> <category>', got '{0}'")]
    Shape(String),
    #[error("invalid claim quantity '{0}'")]
    Quantity(String),
    #[error(transparent)]
    Category(#[from] ParseCategoryError),
}

#[cfg(test)]
mod tests {
    use super::Claim;
    use crate::model::card::Category;

    #[test]
    fn empty_counts_double() {
        let two_empty = Claim::new(2, Category::Empty);
        assert!(two_empty > Claim::new(4, Category::Alive));
        assert!(two_empty < Claim::new(5, Category::Dead));
        assert_eq!(two_empty.strength().effective, 4);
    }

    #[test]
    fn same_quantity_breaks_ties_by_tier() {
        assert!(Claim::new(3, Category::Alive) > Claim::new(3, Category::Dead));
        assert!(Claim::new(3, Category::Dead) > Claim::new(2, Category::Alive));
    }

    #[test]
    fn parses_and_displays() {
        let claim: Claim = "4 empty".parse().unwrap();
        assert_eq!(claim, Claim::new(4, Category::Empty));
        assert_eq!(claim.to_string(), "4 empty");
        assert!("four empty".parse::<Claim>().is_err());
        assert!("4 hup".parse::<Claim>().is_err());
        assert!("4 empty extra".parse::<Claim>().is_err());
    }
}
