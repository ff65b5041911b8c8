//! Scoped storage for pipeline intermediates.
//!
//! A [`SliceArena`] owns every temporary workspace created while reducing one
//! slice. Stages hand intermediates to the arena and receive a [`Slot`]
//! handle; later stages borrow or take them by handle. When the arena goes
//! out of scope (normal return, early `?` return or unwinding) everything
//! still held is dropped, so no intermediate outlives the request.
use crate::workspace::matrix::Workspace;

/// Handle to a workspace held by a [`SliceArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Slot(usize);

/// Owner of the intermediates of a single reduction request.
#[derive(Debug, Default)]
pub struct SliceArena {
    label: String,
    slots: Vec<Option<Workspace>>,
}

impl SliceArena {
    pub fn new(label: impl Into<String>) -> Self {
        SliceArena { label: label.into(), slots: Vec::new() }
    }

    /// Store `ws` and return its handle.
    pub fn insert(&mut self, ws: Workspace) -> Slot {
        self.slots.push(Some(ws));
        Slot(self.slots.len() - 1)
    }

    /// Borrow the workspace behind `slot`, if it is still held.
    pub fn get(&self, slot: Slot) -> Option<&Workspace> {
        self.slots.get(slot.0).and_then(Option::as_ref)
    }

    /// Move the workspace behind `slot` out of the arena.
    pub fn take(&mut self, slot: Slot) -> Option<Workspace> {
        self.slots.get_mut(slot.0).and_then(Option::take)
    }

    /// Number of workspaces still held.
    pub fn live(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Drop everything still held. Handles issued earlier become empty.
    pub fn release(&mut self) {
        let released = self.live();
        if released > 0 {
            tracing::trace!(arena = %self.label, released, "releasing slice intermediates");
        }
        for slot in &mut self.slots {
            *slot = None;
        }
    }
}

impl Drop for SliceArena {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workspace::units::XUnit;

    #[test]
    // Purpose
    // -------
    // Verify handle semantics: get borrows, take moves out, release empties.
    //
    // Given
    // -----
    // - An arena with two empty workspaces.
    //
    // Expect
    // ------
    // - `take` leaves one live entry; a second `take` of the same slot yields
    //   `None`; `release` leaves zero live entries.
    fn arena_insert_take_release() {
        let mut arena = SliceArena::new("test");
        let a = arena.insert(Workspace::new(XUnit::TimeOfFlight, 1.0, Vec::new()));
        let b = arena.insert(Workspace::new(XUnit::Wavelength, 2.0, Vec::new()));
        assert_eq!(arena.live(), 2);
        assert_eq!(arena.get(b).map(|w| w.l1), Some(2.0));

        let taken = arena.take(a).unwrap();
        assert_eq!(taken.unit, XUnit::TimeOfFlight);
        assert!(arena.take(a).is_none());
        assert_eq!(arena.live(), 1);

        arena.release();
        assert_eq!(arena.live(), 0);
        assert!(arena.get(b).is_none());
    }
}
