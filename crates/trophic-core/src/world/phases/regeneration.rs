use super::super::World;
use crate::metrics::TickReport;
use crate::organism::{Organism, TrophicTag};
use rand::Rng;

impl World {
    /// Below the floor, spawn at most one producer per tick.
    pub(in crate::world) fn step_regeneration_phase(&mut self, report: &mut TickReport) {
        let params = &self.config.producers;
        if self.producers.len() >= params.regeneration_floor {
            return;
        }
        if self.producers.len() >= crate::constants::MAX_POPULATION {
            return;
        }
        if !self.rng.random_bool(params.regeneration_probability) {
            return;
        }
        let position = self.torus.random_position(&mut self.rng);
        let id = self.next_id;
        self.next_id = self.next_id.saturating_add(1);
        self.producers.push(Organism::spawn(
            id,
            TrophicTag::Producer,
            position,
            params.base_energy,
        ));
        report.regenerated += 1;
    }
}
