//! Reachability between rooms as doors open during play.
//!
//! We only care *whether* rooms are connected, not how, so groups are kept as
//! plain sets of room ids rather than a graph. Groups only ever merge.
//!
//! Storage is a `Vec` of sets with a "valid count" boundary: merging moves the
//! emptied set past the boundary by swapping it with the last valid one, so
//! the backing storage never shrinks or reallocates while a level is live.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

use crate::layout::RoomId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectivityError {
    #[error("room {0} is not registered with the connectivity tracker")]
    UnknownRoom(RoomId),
    #[error("room {0} is already registered with the connectivity tracker")]
    AlreadyRegistered(RoomId),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConnectivityTracker {
    groups: Vec<BTreeSet<RoomId>>,
    valid_count: usize,
    primary_rooms: BTreeSet<RoomId>,
}

impl ConnectivityTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `id` as a group of its own.
    ///
    /// `is_primary` marks rooms that may be returned by [`connected_to`];
    /// corridors take part in connectivity but are never a destination.
    ///
    /// [`connected_to`]: ConnectivityTracker::connected_to
    pub fn add_room(&mut self, id: RoomId, is_primary: bool) -> Result<(), ConnectivityError> {
        if self.group_index(id).is_some() {
            log::error!("Ignoring duplicate registration of room {}", id);
            return Err(ConnectivityError::AlreadyRegistered(id));
        }
        if is_primary {
            self.primary_rooms.insert(id);
        }

        let group = BTreeSet::from([id]);
        if self.valid_count < self.groups.len() {
            // Reuse a retired slot; it was emptied when it was merged away.
            self.groups[self.valid_count] = group;
        } else {
            self.groups.push(group);
        }
        self.valid_count += 1;
        Ok(())
    }

    /// Merge the groups containing `a` and `b`. No-op if already merged.
    pub fn connect(&mut self, a: RoomId, b: RoomId) -> Result<(), ConnectivityError> {
        let mut a_index = None;
        let mut b_index = None;
        for (i, group) in self.valid_groups().iter().enumerate() {
            if a_index.is_none() && group.contains(&a) {
                a_index = Some(i);
            }
            if b_index.is_none() && group.contains(&b) {
                b_index = Some(i);
            }
            if a_index.is_some() && b_index.is_some() {
                break;
            }
        }

        let (a_index, b_index) = match (a_index, b_index) {
            (Some(ai), Some(bi)) => (ai, bi),
            (None, _) => {
                log::error!("Cannot connect rooms {} and {}: {} is unknown", a, b, a);
                return Err(ConnectivityError::UnknownRoom(a));
            }
            (_, None) => {
                log::error!("Cannot connect rooms {} and {}: {} is unknown", a, b, b);
                return Err(ConnectivityError::UnknownRoom(b));
            }
        };
        if a_index == b_index {
            return Ok(());
        }

        let low = a_index.min(b_index);
        let high = a_index.max(b_index);
        let merged = std::mem::take(&mut self.groups[high]);
        self.groups[low].extend(merged);
        self.groups.swap(high, self.valid_count - 1);
        self.valid_count -= 1;
        Ok(())
    }

    /// Primary rooms sharing a group with `id`, excluding `id`, ascending.
    pub fn connected_to(&self, id: RoomId) -> Result<Vec<RoomId>, ConnectivityError> {
        let index = self.group_index(id).ok_or_else(|| {
            log::error!("Cannot list connections of unknown room {}", id);
            ConnectivityError::UnknownRoom(id)
        })?;
        Ok(self.groups[index]
            .iter()
            .copied()
            .filter(|&other| other != id && self.primary_rooms.contains(&other))
            .collect())
    }

    /// Whether `a` and `b` are currently in the same group. Unknown ids are
    /// never connected.
    pub fn is_connected(&self, a: RoomId, b: RoomId) -> bool {
        match (self.group_index(a), self.group_index(b)) {
            (Some(ai), Some(bi)) => ai == bi,
            _ => false,
        }
    }

    /// The current partition of all registered rooms.
    pub fn groups(&self) -> &[BTreeSet<RoomId>] {
        self.valid_groups()
    }

    pub fn group_count(&self) -> usize {
        self.valid_count
    }

    pub fn room_count(&self) -> usize {
        self.valid_groups().iter().map(BTreeSet::len).sum()
    }

    pub fn is_primary(&self, id: RoomId) -> bool {
        self.primary_rooms.contains(&id)
    }

    fn valid_groups(&self) -> &[BTreeSet<RoomId>] {
        &self.groups[..self.valid_count]
    }

    fn group_index(&self, id: RoomId) -> Option<usize> {
        self.valid_groups().iter().position(|g| g.contains(&id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker_with(rooms: &[(RoomId, bool)]) -> ConnectivityTracker {
        let mut tracker = ConnectivityTracker::new();
        for &(id, primary) in rooms {
            tracker.add_room(id, primary).unwrap();
        }
        tracker
    }

    #[test]
    fn new_rooms_are_isolated() {
        let tracker = tracker_with(&[(1, true), (2, true), (3, false)]);
        assert_eq!(tracker.group_count(), 3);
        assert!(tracker.connected_to(1).unwrap().is_empty());
        assert!(!tracker.is_connected(1, 2));
    }

    #[test]
    fn connect_merges_groups() {
        let mut tracker = tracker_with(&[(1, true), (2, true), (3, true)]);
        tracker.connect(1, 2).unwrap();
        assert_eq!(tracker.group_count(), 2);
        assert_eq!(tracker.connected_to(1).unwrap(), vec![2]);
        assert_eq!(tracker.connected_to(2).unwrap(), vec![1]);
        assert!(tracker.connected_to(3).unwrap().is_empty());
    }

    #[test]
    fn connect_is_idempotent() {
        let mut tracker = tracker_with(&[(1, true), (2, true)]);
        tracker.connect(1, 2).unwrap();
        tracker.connect(2, 1).unwrap();
        tracker.connect(1, 2).unwrap();
        assert_eq!(tracker.group_count(), 1);
        assert_eq!(tracker.room_count(), 2);
    }

    #[test]
    fn corridors_carry_but_are_not_returned() {
        let mut tracker = tracker_with(&[(1, true), (10, false), (2, true)]);
        tracker.connect(1, 10).unwrap();
        assert!(tracker.connected_to(1).unwrap().is_empty());
        tracker.connect(10, 2).unwrap();
        assert_eq!(tracker.connected_to(1).unwrap(), vec![2]);
        assert_eq!(tracker.connected_to(10).unwrap(), vec![1, 2]);
    }

    #[test]
    fn merging_last_group_into_first_keeps_partition() {
        let mut tracker = tracker_with(&[(1, true), (2, true), (3, true), (4, true)]);
        tracker.connect(4, 1).unwrap();
        tracker.connect(3, 2).unwrap();
        assert_eq!(tracker.group_count(), 2);
        assert_eq!(tracker.room_count(), 4);
        assert!(tracker.is_connected(1, 4));
        assert!(tracker.is_connected(2, 3));
        assert!(!tracker.is_connected(1, 2));
    }

    #[test]
    fn unknown_room_is_reported_and_skipped() {
        let mut tracker = tracker_with(&[(1, true), (2, true)]);
        assert_eq!(
            tracker.connect(1, 99),
            Err(ConnectivityError::UnknownRoom(99))
        );
        assert_eq!(
            tracker.connect(98, 1),
            Err(ConnectivityError::UnknownRoom(98))
        );
        assert_eq!(
            tracker.connected_to(97),
            Err(ConnectivityError::UnknownRoom(97))
        );
        assert_eq!(tracker.group_count(), 2);
        assert_eq!(tracker.room_count(), 2);
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut tracker = tracker_with(&[(1, false)]);
        assert_eq!(
            tracker.add_room(1, true),
            Err(ConnectivityError::AlreadyRegistered(1))
        );
        assert!(!tracker.is_primary(1));
        assert_eq!(tracker.room_count(), 1);
    }

    #[test]
    fn rooms_added_after_merges_reuse_storage() {
        let mut tracker = tracker_with(&[(1, true), (2, true), (3, true)]);
        tracker.connect(1, 2).unwrap();
        tracker.connect(2, 3).unwrap();
        tracker.add_room(4, true).unwrap();
        assert_eq!(tracker.group_count(), 2);
        assert_eq!(tracker.room_count(), 4);
        assert!(tracker.connected_to(4).unwrap().is_empty());
        tracker.connect(4, 3).unwrap();
        assert_eq!(tracker.connected_to(4).unwrap(), vec![1, 2, 3]);
    }
}
