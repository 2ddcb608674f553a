mod commit;
mod drift;
mod forage;
mod regeneration;
