//! Providers for every entity type.
//!
//! Real builds construct prefabs here. The host ships lightweight stand-ins
//! that only carry the identification header, which is all replication needs
//! to address them.

use std::any::Any;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use coop_shared::entities::{Entities, Replicated};
use coop_shared::entity_type::EntityType;
use coop_shared::net::EntityHeader;

/// Scene where the Leviathan lives.
pub const LEVIATHAN_SCENE: &str = "Level 5-4";

/// A spawned stand-in object.
#[derive(Debug)]
pub struct Puppet {
    header: EntityHeader,
}

impl Puppet {
    pub fn new(ty: EntityType) -> Self {
        Self {
            header: EntityHeader::unassigned(ty),
        }
    }
}

impl Replicated for Puppet {
    fn header(&self) -> &EntityHeader {
        &self.header
    }

    fn header_mut(&mut self) -> &mut EntityHeader {
        &mut self.header
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Scene objects some providers depend on.
#[derive(Debug, Default)]
pub struct World {
    leviathan: AtomicBool,
}

impl World {
    /// Updates scene objects after a level load.
    pub fn on_level_loaded(&self, scene: &str) {
        self.leviathan.store(scene == LEVIATHAN_SCENE, Ordering::Relaxed);
    }

    pub fn has_leviathan(&self) -> bool {
        self.leviathan.load(Ordering::Relaxed)
    }
}

fn puppet(ty: EntityType) -> Option<Box<dyn Replicated>> {
    Some(Box::new(Puppet::new(ty)))
}

/// Registers a provider for every entity type.
pub fn register_all(entities: &mut Entities, world: &Arc<World>) {
    for ty in EntityType::ALL {
        if ty == EntityType::Leviathan {
            let world = Arc::clone(world);
            // the boss is part of its level and cannot be built anywhere else
            entities.register(ty, move || {
                if world.has_leviathan() {
                    puppet(EntityType::Leviathan)
                } else {
                    None
                }
            });
        } else {
            entities.register(ty, move || puppet(ty));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_type_has_a_provider() {
        let mut entities = Entities::new();
        register_all(&mut entities, &Arc::new(World::default()));
        assert!(entities.verify_complete(EntityType::ALL).is_ok());
    }

    #[test]
    fn leviathan_only_in_its_level() {
        let world = Arc::new(World::default());
        let mut entities = Entities::new();
        register_all(&mut entities, &world);

        assert!(entities.get(5, EntityType::Leviathan).is_none());

        world.on_level_loaded(LEVIATHAN_SCENE);
        let leviathan = entities.get(5, EntityType::Leviathan).unwrap();
        assert_eq!(leviathan.id(), 5);
        assert_eq!(leviathan.entity_type(), EntityType::Leviathan);
    }

    #[test]
    fn puppet_recovers_concrete_type() {
        let mut entities = Entities::new();
        register_all(&mut entities, &Arc::new(World::default()));
        let filth = entities.get(1, EntityType::Filth).unwrap();
        assert!(filth.as_any().downcast_ref::<Puppet>().is_some());
    }
}
