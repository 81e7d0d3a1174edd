//! Line-oriented renderer for terminals without full-screen support

use chrono::Local;
use colored::*;
use flip_clock::{Face, FlipError, Layout, Renderer};

/// Prints the digit row whenever it changes, plus one line per revealed flip
#[derive(Debug, Default)]
pub struct PlainRenderer {
    layout: Option<Layout>,
    rear: Vec<char>,
    flipped: Vec<bool>,
    revealed: Vec<(usize, char)>,
    last_row: Option<String>,
}

impl PlainRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Digits per group, e.g. `["0", "001", "01", "01", "01"]`
    pub fn digit_groups(&self) -> Vec<String> {
        let Some(layout) = &self.layout else { return Vec::new() };
        layout
            .groups
            .iter()
            .map(|g| g.positions.clone().filter_map(|p| self.rear.get(p)).collect())
            .collect()
    }

    fn colored_row(&self) -> String {
        let Some(layout) = &self.layout else { return String::new() };
        layout
            .groups
            .iter()
            .map(|g| {
                g.positions
                    .clone()
                    .map(|p| {
                        let digit = self.rear.get(p).copied().unwrap_or('0').to_string();
                        if self.flipped.get(p).copied().unwrap_or(false) {
                            digit.yellow().bold().to_string()
                        } else {
                            digit.white().bold().to_string()
                        }
                    })
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl Renderer for PlainRenderer {
    fn mount(&mut self, layout: &Layout) -> Result<(), FlipError> {
        let count = layout.rotor_count();
        self.rear = vec!['0'; count];
        self.flipped = vec![false; count];
        self.layout = Some(layout.clone());

        let headings: Vec<String> = layout.groups.iter().map(|g| g.heading.clone()).collect();
        println!("{}", format!("⏱  {} ({})", layout.target, layout.theme).cyan().bold());
        println!("  {}", headings.join(" / ").dimmed());
        Ok(())
    }

    fn set_face(&mut self, position: usize, face: Face, digit: char) {
        if face != Face::Rear {
            return;
        }
        if let Some(slot) = self.rear.get_mut(position) {
            *slot = digit;
        }
    }

    fn set_flipped(&mut self, position: usize, flipped: bool) {
        if let Some(marker) = self.flipped.get_mut(position) {
            *marker = flipped;
        }
        if flipped {
            if let Some(&digit) = self.rear.get(position) {
                self.revealed.push((position, digit));
            }
        }
    }

    fn present(&mut self) -> Result<(), FlipError> {
        for (position, digit) in self.revealed.drain(..) {
            println!("  {} rotor {} -> {}", "↻".yellow(), position, digit);
        }

        let row = self.digit_groups().join(" ");
        if self.last_row.as_deref() != Some(row.as_str()) {
            println!("[{}] {}", Local::now().format("%H:%M:%S"), self.colored_row());
            self.last_row = Some(row);
        }
        Ok(())
    }

    fn unmount(&mut self) {
        if self.layout.take().is_some() {
            println!("{}", "Clock stopped".yellow());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flip_clock::{DisplayOptions, FieldWidths};

    fn mounted() -> PlainRenderer {
        let mut renderer = PlainRenderer::new();
        renderer
            .mount(&Layout::build(&FieldWidths::default(), &DisplayOptions::default()))
            .unwrap();
        renderer
    }

    #[test]
    fn test_groups_follow_layout() {
        let mut renderer = mounted();
        renderer.set_face(3, Face::Rear, '7');
        renderer.set_face(9, Face::Top, '5');
        assert_eq!(renderer.digit_groups(), vec!["0", "007", "00", "00", "00"]);
    }

    #[test]
    fn test_reveals_flushed_on_present() {
        let mut renderer = mounted();
        renderer.set_face(9, Face::Rear, '1');
        renderer.set_flipped(9, true);
        assert_eq!(renderer.revealed, vec![(9, '1')]);

        renderer.present().unwrap();
        assert!(renderer.revealed.is_empty());
        assert_eq!(renderer.last_row.as_deref(), Some("0 000 00 00 01"));
    }
}
