//! Session lifecycle notifications.
//!
//! The session queues an event for every externally visible transition. The
//! host drains the queue once per step and fans each event out to its
//! subscribers (feedback log, UI, gameplay systems).

use std::collections::VecDeque;

use crate::peer_id::PeerId;
use crate::session::{LobbyId, LobbyInfo};
use crate::transport::TransportError;

/// Something that happened to the session.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// A lobby we asked for was created and we own it.
    Created { lobby: LobbyId },
    /// We entered someone else's lobby.
    Joined { lobby: LobbyId, owner: PeerId },
    CreateFailed { error: TransportError },
    JoinFailed { lobby: LobbyId, error: TransportError },
    /// Join was requested for the lobby we are already in.
    AlreadyInLobby { lobby: LobbyId },
    /// The session went offline. `lobby` is `None` when only a pending operation was dropped.
    Left {
        lobby: Option<LobbyId>,
        return_to_menu: bool,
    },
    /// The owner left, which ends the session for everyone else.
    OwnerLeft { lobby: LobbyId, owner: PeerId },
    /// The entered lobby belongs to an incompatible build.
    ForeignLobby { lobby: LobbyId },
    MemberJoined { lobby: LobbyId, peer: PeerId },
    MemberLeft { lobby: LobbyId, peer: PeerId },
    /// Public lobbies, already filtered to our marker key.
    LobbyList { lobbies: Vec<LobbyInfo> },
}

/// FIFO of pending events.
#[derive(Debug)]
pub struct EventQueue<E> {
    queue: VecDeque<E>,
}

impl<E> Default for EventQueue<E> {
    fn default() -> Self {
        Self {
            queue: VecDeque::new(),
        }
    }
}

impl<E> EventQueue<E> {
    pub fn push(&mut self, e: E) {
        self.queue.push_back(e);
    }

    /// Takes all queued events in the order they were pushed.
    pub fn drain(&mut self) -> Vec<E> {
        self.queue.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

/// Callback invoked for every fired event.
pub type Subscriber<E> = Box<dyn FnMut(&E) + Send>;

/// Subscribers notified in registration order.
pub struct Subscribers<E> {
    subscribers: Vec<Subscriber<E>>,
}

impl<E> Default for Subscribers<E> {
    fn default() -> Self {
        Self {
            subscribers: Vec::new(),
        }
    }
}

impl<E> Subscribers<E> {
    pub fn subscribe<F>(&mut self, f: F)
    where
        F: FnMut(&E) + Send + 'static,
    {
        self.subscribers.push(Box::new(f));
    }

    pub fn fire(&mut self, e: &E) {
        for s in &mut self.subscribers {
            s(e);
        }
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn queue_drains_in_order() {
        let mut q = EventQueue::default();
        q.push(1);
        q.push(2);
        assert_eq!(q.len(), 2);
        assert_eq!(q.drain(), vec![1, 2]);
        assert!(q.is_empty());
    }

    #[test]
    fn subscribers_see_every_event() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut subs = Subscribers::default();
        let sink = Arc::clone(&seen);
        subs.subscribe(move |e: &u32| sink.lock().unwrap().push(*e));

        subs.fire(&3);
        subs.fire(&4);
        assert_eq!(*seen.lock().unwrap(), vec![3, 4]);
    }
}
