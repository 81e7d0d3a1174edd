//! Positional digit table and diff engine
//!
//! Each position joins the field it belongs to, the digit rendered by the previous
//! update, and the rotor faces currently on screen. Positions never move, so comparing
//! a fresh digit sequence slot by slot tells exactly which rotors have to flip.

use crate::config::FieldWidths;
use crate::decompose::Field;
use crate::error::FlipError;
use crate::format::DigitSequence;
use crate::render::Face;

/// Faces of one rotor as last written to the renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotorState {
    pub front: char,
    pub rear: char,
    pub top: char,
    pub bottom: char,

    /// The transient "flipped" marker is on
    pub flipped: bool,

    /// Reveals or settles still queued for this rotor
    pub in_flight: u32,
}

impl Default for RotorState {
    fn default() -> Self {
        Self { front: '0', rear: '0', top: '0', bottom: '0', flipped: false, in_flight: 0 }
    }
}

impl RotorState {
    pub fn face(&self, face: Face) -> char {
        match face {
            Face::Front => self.front,
            Face::Rear => self.rear,
            Face::Top => self.top,
            Face::Bottom => self.bottom,
        }
    }

    /// Store a face, returning false when it already showed `digit`
    pub fn set_face(&mut self, face: Face, digit: char) -> bool {
        let slot = match face {
            Face::Front => &mut self.front,
            Face::Rear => &mut self.rear,
            Face::Top => &mut self.top,
            Face::Bottom => &mut self.bottom,
        };
        if *slot == digit {
            return false;
        }
        *slot = digit;
        true
    }

    /// Between a scheduled reveal and its settle
    pub fn is_flipping(&self) -> bool {
        self.in_flight > 0
    }
}

/// One position of the display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DigitSlot {
    pub field: Field,
    pub previous: char,
    pub rotor: RotorState,
}

/// Result of comparing one position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DigitChange {
    pub position: usize,
    pub previous: char,
    pub next: char,
}

impl DigitChange {
    pub fn changed(&self) -> bool {
        self.previous != self.next
    }
}

/// Per-position comparison of two digit sequences
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeSet {
    entries: Vec<DigitChange>,
}

impl ChangeSet {
    /// Every position, changed or not
    pub fn entries(&self) -> &[DigitChange] {
        &self.entries
    }

    pub fn is_changed(&self, position: usize) -> bool {
        self.entries.get(position).is_some_and(DigitChange::changed)
    }

    /// Positions whose digit differs
    pub fn changed_positions(&self) -> impl Iterator<Item = usize> + '_ {
        self.entries.iter().filter(|c| c.changed()).map(|c| c.position)
    }

    pub fn changed_count(&self) -> usize {
        self.entries.iter().filter(|c| c.changed()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.changed_count() == 0
    }
}

/// Fixed-size table of digit slots
#[derive(Debug, Clone)]
pub struct DigitTable {
    slots: Vec<DigitSlot>,
}

impl DigitTable {
    /// One slot per digit, grouped by field, everything showing `0`
    pub fn new(widths: &FieldWidths) -> Self {
        let slots = Field::ALL
            .iter()
            .flat_map(|&field| {
                std::iter::repeat(DigitSlot { field, previous: '0', rotor: RotorState::default() })
                    .take(widths.width(field))
            })
            .collect();
        Self { slots }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn slots(&self) -> &[DigitSlot] {
        &self.slots
    }

    pub fn slot(&self, position: usize) -> Option<&DigitSlot> {
        self.slots.get(position)
    }

    pub fn slot_mut(&mut self, position: usize) -> Option<&mut DigitSlot> {
        self.slots.get_mut(position)
    }

    /// Digits rendered by the last update
    pub fn previous(&self) -> DigitSequence {
        let digits: String = self.slots.iter().map(|s| s.previous).collect();
        DigitSequence::from_digits(&digits).unwrap_or_else(|| DigitSequence::zeros(self.len()))
    }

    /// Compare `next` against the previous digits, then make `next` the previous digits.
    ///
    /// The previous digits are replaced at every position, changed or not.
    pub fn diff(&mut self, next: &DigitSequence) -> Result<ChangeSet, FlipError> {
        if next.len() != self.slots.len() {
            return Err(FlipError::Internal(format!(
                "digit sequence has {} digits, table has {} positions",
                next.len(),
                self.slots.len()
            )));
        }

        let entries = self
            .slots
            .iter_mut()
            .zip(next.iter())
            .enumerate()
            .map(|(position, (slot, digit))| {
                let change = DigitChange { position, previous: slot.previous, next: digit };
                slot.previous = digit;
                change
            })
            .collect();

        Ok(ChangeSet { entries })
    }

    /// Rotors with a reveal or settle outstanding
    pub fn flipping_positions(&self) -> Vec<usize> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.rotor.is_flipping())
            .map(|(i, _)| i)
            .collect()
    }
}
