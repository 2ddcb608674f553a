use super::super::World;
use crate::metrics::TickReport;
use crate::organism::TrophicTag;

impl World {
    /// Drop dead organisms and append buffered offspring to their tier.
    pub(in crate::world) fn step_commit_phase(&mut self, report: &mut TickReport) {
        for tag in TrophicTag::ALL {
            self.population_mut(tag).retain(|o| o.is_alive());
        }

        let offspring = std::mem::take(&mut self.offspring_buffer);
        for child in offspring {
            let tag = child.tag;
            *report.births.get_mut(tag) += 1;
            self.population_mut(tag).push(child);
        }

        debug_assert!(TrophicTag::ALL
            .iter()
            .all(|&tag| self.population(tag).iter().all(|o| o.is_alive())));
    }
}
