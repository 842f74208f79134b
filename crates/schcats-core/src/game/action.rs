use crate::game::error::GameError;
use crate::model::claim::Claim;
use core::fmt;
use core::str::FromStr;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Action {
    Doubt,
    MakeClaim {
        claim: Claim,
        /// Hand positions disclosed as evidence.
        #[serde(default)]
        reveal: Vec<usize>,
    },
}

impl Action {
    pub fn claim(claim: Claim) -> Self {
        Action::MakeClaim {
            claim,
            reveal: Vec::new(),
        }
    }

    pub fn claim_with_reveal(claim: Claim, reveal: Vec<usize>) -> Self {
        Action::MakeClaim { claim, reveal }
    }

    pub fn is_doubt(&self) -> bool {
        matches!(self, Action::Doubt)
    }

    pub fn claimed(&self) -> Option<Claim> {
        match self {
            Action::MakeClaim { claim, .. } => Some(*claim),
            Action::Doubt => None,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Doubt => f.write_str("doubt"),
            Action::MakeClaim { claim, reveal } if reveal.is_empty() => write!(f, "claim {claim}"),
            Action::MakeClaim { claim, reveal } => {
                let positions = reveal
                    .iter()
                    .map(|idx| idx.to_string())
                    .collect::<Vec<_>>()
                    .join(",");
                write!(f, "claim {claim} reveal {positions}")
            }
        }
    }
}

/// Text form: `doubt` or `claim <quantity> <category> [reveal i,j,...]`.
impl FromStr for Action {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tokens: Vec<&str> = s.split_whitespace().collect();
        let malformed = |reason: &str| GameError::MalformedAction {
            input: s.trim().to_string(),
            reason: reason.to_string(),
        };

        match tokens.first().map(|t| t.to_ascii_lowercase()).as_deref() {
            Some("doubt") if tokens.len() == 1 => Ok(Action::Doubt),
            Some("doubt") => Err(malformed("doubt takes no arguments")),
            Some("claim") => {
                let (Some(quantity), Some(category)) = (tokens.get(1), tokens.get(2)) else {
                    return Err(malformed("expected a quantity and a category"));
                };
                let claim: Claim = format!("{quantity} {category}")
                    .parse()
                    .map_err(|err: crate::model::claim::ParseClaimError| {
                        malformed(&err.to_string())
                    })?;
                let reveal = match &tokens[3..] {
                    [] => Vec::new(),
                    [keyword, list] if keyword.eq_ignore_ascii_case("reveal") => list
                        .split(',')
                        .filter(|part| !part.is_empty())
                        .map(|part| {
                            part.parse::<usize>()
                                .map_err(|_| malformed("reveal positions must be integers"))
                        })
                        .collect::<Result<Vec<_>, _>>()?,
                    _ => return Err(malformed("expected 'reveal <positions>'")),
                };
                Ok(Action::MakeClaim { claim, reveal })
            }
            Some(other) => Err(GameError::UnrecognizedAction(other.to_string())),
            None => Err(GameError::UnrecognizedAction(String::new())),
        }
    }
}
