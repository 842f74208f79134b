use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AgentError {
    #[error("parameter '{field}' must be {expectation}, got {value}")]
    InvalidParam {
        field: &'static str,
        expectation: &'static str,
        value: f64,
    },
}

fn check_unit(field: &'static str, value: f64) -> Result<(), AgentError> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(AgentError::InvalidParam {
            field,
            expectation: "within [0, 1]",
            value,
        })
    }
}

fn check_non_negative(field: &'static str, value: f64) -> Result<(), AgentError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(AgentError::InvalidParam {
            field,
            expectation: "finite and non-negative",
            value,
        })
    }
}

/// Tuning for the zero-order agent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ZeroOrderParams {
    /// Doubt when the standing claim's truth probability falls below this.
    pub doubt_threshold: f64,
    /// Threshold used after the opponent doubted last round; higher means doubting sooner.
    pub risk_averse_doubt_threshold: f64,
    pub size_penalty: f64,
    pub jump_penalty: f64,
    pub min_raise_score: f64,
}

impl Default for ZeroOrderParams {
    fn default() -> Self {
        Self {
            doubt_threshold: 0.35,
            risk_averse_doubt_threshold: 0.5,
            size_penalty: 0.01,
            jump_penalty: 0.05,
            min_raise_score: 0.25,
        }
    }
}

impl ZeroOrderParams {
    pub fn validate(&self) -> Result<(), AgentError> {
        check_unit("doubt_threshold", self.doubt_threshold)?;
        check_unit("risk_averse_doubt_threshold", self.risk_averse_doubt_threshold)?;
        check_non_negative("size_penalty", self.size_penalty)?;
        check_non_negative("jump_penalty", self.jump_penalty)?;
        if !self.min_raise_score.is_finite() {
            return Err(AgentError::InvalidParam {
                field: "min_raise_score",
                expectation: "finite",
                value: self.min_raise_score,
            });
        }
        Ok(())
    }
}

/// Tuning for the first-order agent. The predicted-doubt model is
/// `sigmoid(doubt_bias + truth_weight*(0.5 - p) + conservative_weight*(c - 0.5) - bluff_weight*(b - 0.5))`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FirstOrderParams {
    pub doubt_threshold: f64,
    /// Share of the remaining doubt about a standing claim that is forgiven for an honest opponent.
    pub claim_credence: f64,
    pub min_raise_score: f64,
    pub jump_penalty: f64,
    pub continuation_weight: f64,
    pub doubt_bias: f64,
    pub truth_weight: f64,
    pub conservative_weight: f64,
    pub bluff_weight: f64,
    /// EMA rate for conservativeness.
    pub trait_smoothing: f64,
    /// Revealed cards per round at which the opponent counts as fully forthcoming.
    pub evidence_saturation: f64,
    pub bluff_step: f64,
    /// Consecutive rounds the opponent must doubt before one zero-order round.
    pub fallback_after_doubts: u32,
    pub fallback: ZeroOrderParams,
}

impl Default for FirstOrderParams {
    fn default() -> Self {
        Self {
            doubt_threshold: 0.35,
            claim_credence: 0.25,
            min_raise_score: 0.3,
            jump_penalty: 0.1,
            continuation_weight: 0.6,
            doubt_bias: 0.0,
            truth_weight: 6.0,
            conservative_weight: 2.0,
            bluff_weight: 1.5,
            trait_smoothing: 0.3,
            evidence_saturation: 4.0,
            bluff_step: 0.1,
            fallback_after_doubts: 2,
            fallback: ZeroOrderParams::default(),
        }
    }
}

impl FirstOrderParams {
    pub fn validate(&self) -> Result<(), AgentError> {
        check_unit("doubt_threshold", self.doubt_threshold)?;
        check_unit("claim_credence", self.claim_credence)?;
        check_non_negative("jump_penalty", self.jump_penalty)?;
        check_non_negative("continuation_weight", self.continuation_weight)?;
        check_non_negative("truth_weight", self.truth_weight)?;
        check_non_negative("conservative_weight", self.conservative_weight)?;
        check_non_negative("bluff_weight", self.bluff_weight)?;
        check_unit("trait_smoothing", self.trait_smoothing)?;
        check_unit("bluff_step", self.bluff_step)?;
        if !(self.evidence_saturation.is_finite() && self.evidence_saturation > 0.0) {
            return Err(AgentError::InvalidParam {
                field: "evidence_saturation",
                expectation: "positive",
                value: self.evidence_saturation,
            });
        }
        if self.fallback_after_doubts == 0 {
            return Err(AgentError::InvalidParam {
                field: "fallback_after_doubts",
                expectation: "at least 1",
                value: 0.0,
            });
        }
        for (field, value) in [
            ("min_raise_score", self.min_raise_score),
            ("doubt_bias", self.doubt_bias),
        ] {
            if !value.is_finite() {
                return Err(AgentError::InvalidParam {
                    field,
                    expectation: "finite",
                    value,
                });
            }
        }
        self.fallback.validate()
    }
}
