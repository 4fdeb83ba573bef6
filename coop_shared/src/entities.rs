//! Entity registry: type → provider map plus the network id allocator.
//!
//! Providers are registered once at startup by the content layer. A provider
//! may decline to build an object (its asset is not loaded yet, the level has
//! no such boss, ...); that is an ordinary `None`, not an error.
//!
//! Entity ids share their number space with peer ids so that every message
//! addresses its target the same way. [`Entities::next_id`] therefore skips any
//! value that is currently the id of a connected peer.

use std::any::Any;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;

use tracing::debug;

use crate::entity_type::EntityType;
use crate::net::EntityHeader;
use crate::peer_id::PeerId;

/// An object that can be replicated between peers.
pub trait Replicated: Any + Send {
    fn header(&self) -> &EntityHeader;
    fn header_mut(&mut self) -> &mut EntityHeader;

    /// Lets the owning subsystem recover the concrete type.
    fn as_any(&self) -> &dyn Any;

    fn id(&self) -> u64 {
        self.header().id
    }

    fn entity_type(&self) -> EntityType {
        self.header().ty
    }
}

/// Zero-argument constructor for one entity type.
pub type Provider = Box<dyn Fn() -> Option<Box<dyn Replicated>> + Send + Sync>;

/// Set of peers currently connected, queried by the allocator.
pub trait PeerSet {
    fn contains_peer(&self, id: u64) -> bool;
}

impl PeerSet for [PeerId] {
    fn contains_peer(&self, id: u64) -> bool {
        self.iter().any(|p| p.as_u64() == id)
    }
}

impl PeerSet for Vec<PeerId> {
    fn contains_peer(&self, id: u64) -> bool {
        self.as_slice().contains_peer(id)
    }
}

impl PeerSet for HashSet<PeerId> {
    fn contains_peer(&self, id: u64) -> bool {
        self.contains(&PeerId::from_u64(id))
    }
}

impl PeerSet for BTreeSet<PeerId> {
    fn contains_peer(&self, id: u64) -> bool {
        self.contains(&PeerId::from_u64(id))
    }
}

/// Registry errors reported at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntitiesError {
    /// These types are expected to be instantiable but have no provider.
    MissingProviders(Vec<EntityType>),
}

impl fmt::Display for EntitiesError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntitiesError::MissingProviders(types) => {
                write!(f, "no provider registered for {} type(s): {:?}", types.len(), types)
            }
        }
    }
}

impl std::error::Error for EntitiesError {}

/// Provides entities by their type and hands out network ids.
#[derive(Default)]
pub struct Entities {
    providers: HashMap<EntityType, Provider>,
    /// Last used id; the next one is guaranteed to be greater.
    last_id: u64,
}

impl Entities {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the provider of `ty`.
    ///
    /// # Panics
    /// If `ty` already has a provider. Registration happens once at startup,
    /// so a second call is a wiring bug.
    pub fn register<F>(&mut self, ty: EntityType, provider: F)
    where
        F: Fn() -> Option<Box<dyn Replicated>> + Send + Sync + 'static,
    {
        if self.providers.insert(ty, Box::new(provider)).is_some() {
            panic!("provider for {ty:?} registered twice");
        }
    }

    pub fn is_registered(&self, ty: EntityType) -> bool {
        self.providers.contains_key(&ty)
    }

    /// Checks that every type in `expected` has a provider.
    pub fn verify_complete(
        &self,
        expected: impl IntoIterator<Item = EntityType>,
    ) -> Result<(), EntitiesError> {
        let mut missing: Vec<EntityType> = expected
            .into_iter()
            .filter(|ty| !self.is_registered(*ty))
            .collect();
        if missing.is_empty() {
            return Ok(());
        }
        missing.sort();
        missing.dedup();
        Err(EntitiesError::MissingProviders(missing))
    }

    /// Builds an entity of the given type and stamps it with `id`.
    ///
    /// Returns `None` when the provider cannot build the object right now.
    ///
    /// # Panics
    /// If `ty` has no provider; [`Entities::verify_complete`] rules this out at startup.
    pub fn get(&self, id: u64, ty: EntityType) -> Option<Box<dyn Replicated>> {
        let Some(provider) = self.providers.get(&ty) else {
            unreachable!("no provider registered for {ty:?}");
        };

        let Some(mut entity) = provider() else {
            debug!(id, ?ty, "Provider produced nothing");
            return None;
        };

        *entity.header_mut() = EntityHeader::new(id, ty);
        Some(entity)
    }

    /// Returns the next available id, skipping the ids of all connected peers.
    pub fn next_id<P: PeerSet + ?Sized>(&mut self, peers: &P) -> u64 {
        loop {
            self.last_id += 1;
            if !peers.contains_peer(self.last_id) {
                return self.last_id;
            }
            debug!(id = self.last_id, "Skipping id taken by a peer");
        }
    }

    pub fn last_id(&self) -> u64 {
        self.last_id
    }

    /// Forgets issued ids; called when the session they belonged to ends.
    pub fn reset_ids(&mut self) {
        self.last_id = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    struct Dummy {
        header: EntityHeader,
    }

    impl Replicated for Dummy {
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

    fn dummy() -> Option<Box<dyn Replicated>> {
        Some(Box::new(Dummy {
            header: EntityHeader::unassigned(EntityType::Player),
        }))
    }

    fn peers(ids: &[u64]) -> Vec<PeerId> {
        ids.iter().copied().map(PeerId::from_u64).collect()
    }

    // =============================================================================
    // Providers
    // =============================================================================

    #[test]
    fn get_stamps_id_and_type() {
        let mut entities = Entities::new();
        entities.register(EntityType::Filth, dummy);

        let entity = entities.get(42, EntityType::Filth).unwrap();
        assert_eq!(entity.id(), 42);
        assert_eq!(entity.entity_type(), EntityType::Filth);
        assert!(entity.as_any().downcast_ref::<Dummy>().is_some());
    }

    #[test]
    fn absent_provider_result_is_none() {
        let mut entities = Entities::new();
        let ready = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&ready);
        entities.register(EntityType::Leviathan, move || {
            if flag.load(Ordering::SeqCst) {
                dummy()
            } else {
                None
            }
        });

        assert!(entities.get(1, EntityType::Leviathan).is_none());
        ready.store(true, Ordering::SeqCst);
        assert_eq!(entities.get(1, EntityType::Leviathan).unwrap().id(), 1);
    }

    #[test]
    #[should_panic(expected = "registered twice")]
    fn double_registration_panics() {
        let mut entities = Entities::new();
        entities.register(EntityType::Coin, dummy);
        entities.register(EntityType::Coin, dummy);
    }

    #[test]
    #[should_panic(expected = "no provider registered")]
    fn unregistered_type_panics() {
        let entities = Entities::new();
        let _ = entities.get(7, EntityType::Rocket);
    }

    #[test]
    fn completeness_check_lists_missing_types() {
        let mut entities = Entities::new();
        entities.register(EntityType::Coin, dummy);

        let result = entities.verify_complete([EntityType::Ball, EntityType::Coin, EntityType::Rocket]);
        assert_eq!(
            result,
            Err(EntitiesError::MissingProviders(vec![EntityType::Rocket, EntityType::Ball]))
        );

        entities.register(EntityType::Rocket, dummy);
        entities.register(EntityType::Ball, dummy);
        assert!(entities.verify_complete(EntityType::ALL[88..].iter().copied()).is_ok());
    }

    // =============================================================================
    // Id allocation
    // =============================================================================

    #[test]
    fn next_id_is_strictly_increasing() {
        let mut entities = Entities::new();
        let members = peers(&[2, 3, 5]);

        let ids: Vec<u64> = (0..5).map(|_| entities.next_id(&members)).collect();
        assert_eq!(ids, vec![1, 4, 6, 7, 8]);
    }

    #[test]
    fn next_id_skips_consecutive_collisions() {
        let mut entities = Entities::new();
        let members = peers(&[1, 2, 3, 4]);
        assert_eq!(entities.next_id(&members), 5);
        assert_eq!(entities.last_id(), 5);
    }

    #[test]
    fn next_id_never_hits_live_peer_as_membership_changes() {
        let mut entities = Entities::new();
        let mut members: HashSet<PeerId> = HashSet::new();
        let mut previous = 0;

        for round in 0..200u64 {
            // Park peers just ahead of the counter, drop old ones.
            members.insert(PeerId::from_u64(entities.last_id() + 1 + round % 3));
            members.insert(PeerId::from_u64(entities.last_id() + 2));
            members.retain(|p| p.as_u64() > entities.last_id());

            let id = entities.next_id(&members);
            assert!(id > previous);
            assert!(!members.contains_peer(id), "round {round}: {id} collides");
            previous = id;
        }
    }

    #[test]
    fn reset_restarts_numbering() {
        let mut entities = Entities::new();
        let none: Vec<PeerId> = Vec::new();
        entities.next_id(&none);
        entities.next_id(&none);
        entities.reset_ids();
        assert_eq!(entities.next_id(&none), 1);
    }
}
