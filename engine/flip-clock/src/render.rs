//! Renderer collaborator interface and an in-memory implementation

use crate::config::{DisplayOptions, FieldWidths};
use crate::decompose::Field;
use crate::error::FlipError;
use std::ops::Range;

/// One of the four faces of a rotor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Face {
    /// Leaf front, shows the outgoing digit while the leaf falls
    Front,
    /// Leaf back, shows the incoming digit once the leaf has fallen
    Rear,
    /// Upper half of the static card
    Top,
    /// Lower half of the static card
    Bottom,
}

impl Face {
    pub const ALL: [Face; 4] = [Face::Front, Face::Rear, Face::Top, Face::Bottom];

    fn slot(self) -> usize {
        self as usize
    }
}

/// A labelled run of rotors displaying one field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotorGroup {
    pub field: Field,
    pub heading: String,
    pub positions: Range<usize>,
}

/// Everything a renderer needs to build the display container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    pub target: String,
    pub theme: String,
    pub groups: Vec<RotorGroup>,
}

impl Layout {
    /// Lay fields out left to right, one group per field
    pub fn build(widths: &FieldWidths, display: &DisplayOptions) -> Self {
        let mut start = 0;
        let groups = Field::ALL
            .iter()
            .map(|&field| {
                let end = start + widths.width(field);
                let group = RotorGroup {
                    field,
                    heading: display.headings.get(field.index()).cloned().unwrap_or_default(),
                    positions: start..end,
                };
                start = end;
                group
            })
            .collect();

        Self { target: display.target.clone(), theme: display.theme.clone(), groups }
    }

    /// Total number of rotors
    pub fn rotor_count(&self) -> usize {
        self.groups.last().map(|g| g.positions.end).unwrap_or(0)
    }
}

/// Display surface for a grid of rotors.
///
/// Mutations may be buffered; [`Renderer::present`] is called once after each batch.
pub trait Renderer: Send {
    /// Create the container, theme, headings and one rotor per position, all showing `0`
    fn mount(&mut self, layout: &Layout) -> Result<(), FlipError>;

    /// Set the text of one face
    fn set_face(&mut self, position: usize, face: Face, digit: char);

    /// Add or remove the transient "flipped" marker on a rotor's leaf
    fn set_flipped(&mut self, position: usize, flipped: bool);

    /// Flush buffered mutations
    fn present(&mut self) -> Result<(), FlipError> {
        Ok(())
    }

    /// Release the display surface
    fn unmount(&mut self) {}
}

/// Mutation recorded by [`MemoryRenderer`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderOp {
    SetFace { position: usize, face: Face, digit: char },
    SetFlipped { position: usize, flipped: bool },
}

/// Renderer that keeps the grid in memory and records every mutation
#[derive(Debug, Default)]
pub struct MemoryRenderer {
    layout: Option<Layout>,
    faces: Vec<[char; 4]>,
    flipped: Vec<bool>,
    ops: Vec<RenderOp>,
    presents: u64,
    mounted: bool,
}

impl MemoryRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn layout(&self) -> Option<&Layout> {
        self.layout.as_ref()
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// Text of one face
    pub fn face(&self, position: usize, face: Face) -> Option<char> {
        self.faces.get(position).map(|f| f[face.slot()])
    }

    /// One face across all rotors, left to right
    pub fn row(&self, face: Face) -> String {
        self.faces.iter().map(|f| f[face.slot()]).collect()
    }

    pub fn is_flipped(&self, position: usize) -> bool {
        self.flipped.get(position).copied().unwrap_or(false)
    }

    /// Positions currently carrying the flipped marker
    pub fn flipped_positions(&self) -> Vec<usize> {
        self.flipped.iter().enumerate().filter(|(_, &f)| f).map(|(i, _)| i).collect()
    }

    pub fn ops(&self) -> &[RenderOp] {
        &self.ops
    }

    /// Drain the mutation log
    pub fn take_ops(&mut self) -> Vec<RenderOp> {
        std::mem::take(&mut self.ops)
    }

    pub fn presents(&self) -> u64 {
        self.presents
    }
}

impl Renderer for MemoryRenderer {
    fn mount(&mut self, layout: &Layout) -> Result<(), FlipError> {
        let count = layout.rotor_count();
        self.faces = vec![['0'; 4]; count];
        self.flipped = vec![false; count];
        self.layout = Some(layout.clone());
        self.mounted = true;
        Ok(())
    }

    fn set_face(&mut self, position: usize, face: Face, digit: char) {
        if let Some(faces) = self.faces.get_mut(position) {
            faces[face.slot()] = digit;
            self.ops.push(RenderOp::SetFace { position, face, digit });
        }
    }

    fn set_flipped(&mut self, position: usize, flipped: bool) {
        if let Some(marker) = self.flipped.get_mut(position) {
            *marker = flipped;
            self.ops.push(RenderOp::SetFlipped { position, flipped });
        }
    }

    fn present(&mut self) -> Result<(), FlipError> {
        self.presents += 1;
        Ok(())
    }

    fn unmount(&mut self) {
        self.mounted = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_groups_cover_all_positions() {
        let layout = Layout::build(&FieldWidths::default(), &DisplayOptions::default());
        let ranges: Vec<_> = layout.groups.iter().map(|g| g.positions.clone()).collect();
        assert_eq!(ranges, vec![0..1, 1..4, 4..6, 6..8, 8..10]);
        assert_eq!(layout.groups[1].heading, "Days");
        assert_eq!(layout.rotor_count(), 10);
        assert_eq!(layout.target, "flipdown");
        assert_eq!(layout.theme, "dark");
    }

    #[test]
    fn test_memory_renderer_mounts_zeros() {
        let layout = Layout::build(&FieldWidths::default(), &DisplayOptions::default());
        let mut renderer = MemoryRenderer::new();
        renderer.mount(&layout).unwrap();
        for face in Face::ALL {
            assert_eq!(renderer.row(face), "0000000000");
        }
        assert!(renderer.flipped_positions().is_empty());
    }

    #[test]
    fn test_out_of_range_position_ignored() {
        let layout = Layout::build(&FieldWidths::default(), &DisplayOptions::default());
        let mut renderer = MemoryRenderer::new();
        renderer.mount(&layout).unwrap();
        renderer.set_face(99, Face::Top, '5');
        renderer.set_flipped(99, true);
        assert!(renderer.ops().is_empty());
    }
}
