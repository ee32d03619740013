//! Strategy parameters. Both values are caller-supplied; there is no `Default`.

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Extra samples required beyond the EMA period: one more point to compare against.
pub const MIN_LOOKBACK: usize = 1;

/// Validated EMA-crossover parameters.
///
/// Deserialization goes through the same validation as `SignalParams::new`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "ParamsRepr", into = "ParamsRepr")]
pub struct SignalParams {
    ema_period: usize,
    min_holding_days: u32,
}

impl SignalParams {
    /// Validate signed inputs as they arrive from config files or the command line.
    ///
    /// Fails with `InvalidParameter` when `ema_period <= 0` or `min_holding_days < 0`.
    pub fn new(ema_period: i64, min_holding_days: i64) -> Result<Self, EngineError> {
        if ema_period <= 0 {
            return Err(EngineError::invalid(format!(
                "ema_period must be positive, got {ema_period}"
            )));
        }
        if min_holding_days < 0 {
            return Err(EngineError::invalid(format!(
                "min_holding_days must be non-negative, got {min_holding_days}"
            )));
        }
        let ema_period = usize::try_from(ema_period)
            .map_err(|_| EngineError::invalid(format!("ema_period {ema_period} is too large")))?;
        let min_holding_days = u32::try_from(min_holding_days).map_err(|_| {
            EngineError::invalid(format!("min_holding_days {min_holding_days} is too large"))
        })?;
        Ok(Self {
            ema_period,
            min_holding_days,
        })
    }

    pub fn ema_period(&self) -> usize {
        self.ema_period
    }

    pub fn min_holding_days(&self) -> u32 {
        self.min_holding_days
    }

    /// Minimum number of price points a run needs.
    pub fn required_points(&self) -> usize {
        self.ema_period + MIN_LOOKBACK
    }
}

#[derive(Serialize, Deserialize)]
struct ParamsRepr {
    ema_period: i64,
    min_holding_days: i64,
}

impl TryFrom<ParamsRepr> for SignalParams {
    type Error = EngineError;

    fn try_from(repr: ParamsRepr) -> Result<Self, Self::Error> {
        SignalParams::new(repr.ema_period, repr.min_holding_days)
    }
}

impl From<SignalParams> for ParamsRepr {
    fn from(p: SignalParams) -> Self {
        Self {
            ema_period: p.ema_period as i64,
            min_holding_days: i64::from(p.min_holding_days),
        }
    }
}
