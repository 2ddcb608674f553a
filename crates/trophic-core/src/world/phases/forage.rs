use super::super::World;
use crate::metrics::TickReport;
use crate::organism::TrophicTag;
use crate::spatial::PhaseResolver;

impl World {
    /// One consumer tier moves, feeds and reproduces in insertion order.
    ///
    /// Captured food is killed in place so later consumers of the same phase
    /// cannot eat it again; removal and offspring insertion wait for commit.
    pub(in crate::world) fn step_consumer_phase(&mut self, tag: TrophicTag, report: &mut TickReport) {
        let Some(prey) = tag.prey() else {
            return;
        };
        let Some(profile) = self.profile(tag).copied() else {
            return;
        };

        let World {
            producers,
            herbivores,
            predators,
            apex,
            config,
            torus,
            mutation,
            rng,
            next_id,
            offspring_buffer,
            ..
        } = self;
        let (consumers, food) = match tag {
            TrophicTag::Herbivore => (herbivores, producers),
            TrophicTag::Predator => (predators, herbivores),
            TrophicTag::Apex => (apex, predators),
            TrophicTag::Producer => return,
        };
        if consumers.is_empty() {
            return;
        }

        let resolver = PhaseResolver::build(config.spatial_index, *torus, food);
        let step_size = config.step_size;
        let mut eaten = 0usize;
        let mut starved = 0usize;

        for consumer in consumers.iter_mut() {
            if !consumer.is_alive() {
                continue;
            }
            consumer.hunt_or_wander(&profile, food, &resolver, torus, step_size, rng);
            eaten += consumer.feed(&profile, food, &resolver);
            if let Some(child) = consumer.reproduce(&profile, mutation, next_id, rng) {
                offspring_buffer.push(child);
            }
            if !consumer.is_alive() {
                starved += 1;
            }
        }

        *report.eaten.get_mut(prey) += eaten;
        *report.starved.get_mut(tag) += starved;
    }
}
