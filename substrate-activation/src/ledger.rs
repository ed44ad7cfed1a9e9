//! Energy accounting across the stages of a cycle.

use serde::{Deserialize, Serialize};

/// Total node energy before and after one stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageEnergy {
    pub stage: String,
    pub before: f64,
    pub after: f64,
}

impl StageEnergy {
    pub fn delta(&self) -> f64 {
        self.after - self.before
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnergyLedger {
    pub injected: f64,
    stages: Vec<StageEnergy>,
}

impl EnergyLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, stage: impl Into<String>, before: f64, after: f64) {
        self.stages.push(StageEnergy {
            stage: stage.into(),
            before,
            after,
        });
    }

    pub fn add_injected(&mut self, amount: f64) {
        self.injected += amount;
    }

    pub fn stages(&self) -> &[StageEnergy] {
        &self.stages
    }

    pub fn opening(&self) -> Option<f64> {
        self.stages.first().map(|s| s.before)
    }

    pub fn closing(&self) -> Option<f64> {
        self.stages.last().map(|s| s.after)
    }

    pub fn net_change(&self) -> f64 {
        match (self.opening(), self.closing()) {
            (Some(open), Some(close)) => close - open,
            _ => 0.0,
        }
    }

    /// `|ΔE| ≤ decayed + injected + tolerance` over the whole cycle.
    pub fn is_conserved(&self, decayed: f64, tolerance: f64) -> bool {
        self.net_change().abs() <= decayed + self.injected + tolerance
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn net_change_spans_first_to_last_stage() {
        let mut ledger = EnergyLedger::new();
        ledger.add_injected(2.0);
        ledger.record("ingress", 10.0, 12.0);
        ledger.record("activation", 12.0, 12.0);
        ledger.record("decay", 12.0, 11.5);
        assert_eq!(ledger.net_change(), 1.5);
        assert!(ledger.is_conserved(0.5, 1e-9));
        assert!(!EnergyLedger::new().is_conserved(0.0, -1.0));
    }
}
