use super::super::World;

impl World {
    /// Producers wander a little. Drift is free and never kills.
    pub(in crate::world) fn step_drift_phase(&mut self) {
        let magnitude = self.config.producers.drift_magnitude;
        if magnitude <= 0.0 {
            return;
        }
        let torus = self.torus;
        for producer in self.producers.iter_mut() {
            producer.drift(&torus, magnitude, &mut self.rng);
        }
    }
}
