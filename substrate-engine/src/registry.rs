use substrate_activation::{ActivationMechanism, DecayMechanism, EntityAggregationMechanism};
use substrate_core::traits::Mechanism;
use substrate_core::SubstrateConfig;
use substrate_learning::LearningMechanism;
use substrate_lifecycle::LifecycleMechanism;

/// Mechanisms in the order they run each cycle.
#[derive(Default)]
pub struct MechanismRegistry {
    mechanisms: Vec<Box<dyn Mechanism>>,
}

impl MechanismRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Activation, decay, entity aggregation, learning, lifecycle.
    pub fn with_defaults(config: &SubstrateConfig) -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(ActivationMechanism::new(config.activation.clone())));
        registry.register(Box::new(DecayMechanism::new(config.decay.clone())));
        registry.register(Box::new(EntityAggregationMechanism::new(config.activation.clone())));
        registry.register(Box::new(LearningMechanism::new(config.learning.clone())));
        registry.register(Box::new(LifecycleMechanism::new(config.lifecycle.clone())));
        registry
    }

    /// Append a mechanism. It runs after everything registered before it.
    pub fn register(&mut self, mechanism: Box<dyn Mechanism>) {
        self.mechanisms.push(mechanism);
    }

    pub fn names(&self) -> Vec<String> {
        self.mechanisms.iter().map(|m| m.name().to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.mechanisms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mechanisms.is_empty()
    }

    /// Mechanisms scheduled for `cycle`.
    pub fn due(&mut self, cycle: u64) -> impl Iterator<Item = &mut Box<dyn Mechanism>> {
        self.mechanisms
            .iter_mut()
            .filter(move |m| cycle % m.period().max(1) == 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_run_in_pipeline_order() {
        let registry = MechanismRegistry::with_defaults(&SubstrateConfig::default());
        assert_eq!(
            registry.names(),
            ["activation", "decay", "entity_aggregation", "learning", "lifecycle"]
        );
    }
}
