//! Color assignment engine
//!
//! Subjects get the next unused color from a fixed 10-color palette, cycled
//! by index. Topics get lightness variations of their subject's base color,
//! and empty topics are greyed out until their first card arrives.

use cardbox_core::domain::color_map::{ColorMapping, SubjectColors, NEUTRAL_PLACEHOLDER};
use cardbox_core::domain::newtypes::ColorHex;
use tracing::debug;

use crate::hsl::{hex_to_hsl, hex_to_rgb, hsl_to_hex, rgb_to_hex, Hsl};

/// The fixed subject palette, assigned in order and cycled by index
pub const PALETTE: [&str; 10] = [
    "#e6194b", "#3cb44b", "#ffe119", "#4363d8", "#f58231", "#911eb4", "#46f0f0", "#f032e6",
    "#bcf60c", "#008080",
];

/// Lightness band half-width for topic shades
const SHADE_BAND: f64 = 0.15;

/// Clamp bounds keeping shades legible on light and dark backgrounds
const SHADE_MIN_L: f64 = 0.2;
const SHADE_MAX_L: f64 = 0.85;

/// How far an empty topic's color is pulled toward grey
const GREY_BLEND: f64 = 0.7;

/// The grey that empty topics blend toward
const GREY_TARGET: (u8, u8, u8) = (0xb0, 0xb0, 0xb0);

/// Assigns palette colors and derives topic shades
///
/// Stateless; all inputs and outputs go through [`ColorMapping`].
#[derive(Debug, Default, Clone, Copy)]
pub struct ColorAssignmentEngine;

impl ColorAssignmentEngine {
    pub fn new() -> Self {
        Self
    }

    /// Ensures every listed subject has a real palette color
    ///
    /// Subjects without an entry receive the next palette color, cycled by
    /// assignment index. Subjects whose stored base is still the neutral
    /// placeholder are reassigned the same way. Existing real colors are
    /// never changed, so a subject's color is stable across regenerations.
    pub fn assign_subject_colors(
        &self,
        mut mapping: ColorMapping,
        subjects: &[String],
    ) -> ColorMapping {
        let mut next_index = mapping
            .subjects
            .values()
            .filter(|c| !c.is_placeholder())
            .count();

        for subject in subjects {
            let needs_color = match mapping.get(subject) {
                None => true,
                Some(entry) => entry.is_placeholder(),
            };
            if !needs_color {
                continue;
            }

            let color = ColorHex::new(PALETTE[next_index % PALETTE.len()])
                .unwrap_or_else(|_| unreachable!("palette entries are valid hex"));
            debug!(subject = %subject, color = %color, "Assigning palette color");

            match mapping.subjects.get_mut(subject) {
                Some(entry) => entry.base = color,
                None => mapping.insert(subject.clone(), SubjectColors::new(color)),
            }
            next_index += 1;
        }

        mapping
    }

    /// Produces `count` evenly spaced lightness variations of a base color
    ///
    /// The shades share the base hue and saturation and span the band
    /// `[l - 0.15, l + 0.15]` clamped to `[0.2, 0.85]`. A `count` of one
    /// (or zero) returns the base color unchanged.
    pub fn generate_shade_variations(&self, base: &ColorHex, count: usize) -> Vec<ColorHex> {
        if count <= 1 {
            return vec![base.clone()];
        }

        let Some(hsl) = hex_to_hsl(base.as_str()) else {
            return vec![base.clone(); count];
        };

        let low = (hsl.l - SHADE_BAND).max(SHADE_MIN_L);
        // A very dark or very light base can invert the clamped band; pin
        // it to a single lightness in that case.
        let high = ((hsl.l + SHADE_BAND).min(SHADE_MAX_L)).max(low);
        let step = (high - low) / (count as f64 - 1.0);

        (0..count)
            .map(|i| {
                let shade = Hsl {
                    h: hsl.h,
                    s: hsl.s,
                    l: low + step * i as f64,
                };
                ColorHex::new(hsl_to_hex(shade))
                    .unwrap_or_else(|_| unreachable!("hsl_to_hex emits valid hex"))
            })
            .collect()
    }

    /// Blends a color 70% toward grey to signal an empty topic
    ///
    /// Reversed by reassigning the real shade when the topic gains its
    /// first card.
    pub fn grey_out(&self, base: &ColorHex) -> ColorHex {
        let (r, g, b) = hex_to_rgb(base.as_str()).unwrap_or(GREY_TARGET);
        let blend = |from: u8, to: u8| -> u8 {
            (f64::from(from) + (f64::from(to) - f64::from(from)) * GREY_BLEND).round() as u8
        };
        let hex = rgb_to_hex(
            blend(r, GREY_TARGET.0),
            blend(g, GREY_TARGET.1),
            blend(b, GREY_TARGET.2),
        );
        ColorHex::new(hex).unwrap_or_else(|_| unreachable!("rgb_to_hex emits valid hex"))
    }

    /// The neutral placeholder color used before real data exists
    pub fn placeholder(&self) -> ColorHex {
        ColorHex::new(NEUTRAL_PLACEHOLDER)
            .unwrap_or_else(|_| unreachable!("placeholder constant is valid hex"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> ColorAssignmentEngine {
        ColorAssignmentEngine::new()
    }

    fn color(s: &str) -> ColorHex {
        ColorHex::new(s).unwrap()
    }

    #[test]
    fn test_assign_colors_to_new_subjects() {
        let mapping = engine().assign_subject_colors(
            ColorMapping::default(),
            &["Biology".to_string(), "Chemistry".to_string()],
        );

        let bio = mapping.get("Biology").unwrap();
        let chem = mapping.get("Chemistry").unwrap();
        assert_eq!(bio.base.as_str(), PALETTE[0]);
        assert_eq!(chem.base.as_str(), PALETTE[1]);
    }

    #[test]
    fn test_existing_real_colors_are_stable() {
        let mut mapping = ColorMapping::default();
        mapping.insert("Biology", SubjectColors::new(color("#008080")));

        let mapping =
            engine().assign_subject_colors(mapping, &["Biology".to_string()]);
        assert_eq!(mapping.get("Biology").unwrap().base.as_str(), "#008080");
    }

    #[test]
    fn test_placeholder_subjects_are_reassigned() {
        let mut mapping = ColorMapping::default();
        mapping.insert(
            "Biology",
            SubjectColors::new(color(NEUTRAL_PLACEHOLDER)),
        );

        let mapping =
            engine().assign_subject_colors(mapping, &["Biology".to_string()]);
        let bio = mapping.get("Biology").unwrap();
        assert!(!bio.is_placeholder());
    }

    #[test]
    fn test_palette_cycles_past_ten_subjects() {
        let subjects: Vec<String> = (0..12).map(|i| format!("Subject{i}")).collect();
        let mapping = engine().assign_subject_colors(ColorMapping::default(), &subjects);

        assert_eq!(mapping.get("Subject10").unwrap().base.as_str(), PALETTE[0]);
        assert_eq!(mapping.get("Subject11").unwrap().base.as_str(), PALETTE[1]);
    }

    #[test]
    fn test_shade_variations_share_hue() {
        let shades = engine().generate_shade_variations(&color("#4363d8"), 5);
        assert_eq!(shades.len(), 5);

        let base_hue = hex_to_hsl("#4363d8").unwrap().h;
        for shade in &shades {
            let hue = hex_to_hsl(shade.as_str()).unwrap().h;
            assert!((hue - base_hue).abs() < 2.0, "hue drifted: {shade}");
        }

        // All five shades are distinct.
        let unique: std::collections::HashSet<&str> =
            shades.iter().map(|c| c.as_str()).collect();
        assert_eq!(unique.len(), 5);
    }

    #[test]
    fn test_shade_lightness_stays_in_band() {
        let shades = engine().generate_shade_variations(&color("#0a0a0a"), 4);
        for shade in &shades {
            let l = hex_to_hsl(shade.as_str()).unwrap().l;
            assert!((0.19..=0.86).contains(&l), "lightness out of band: {l}");
        }
    }

    #[test]
    fn test_single_shade_returns_base() {
        let base = color("#4363d8");
        assert_eq!(engine().generate_shade_variations(&base, 1), vec![base.clone()]);
        assert_eq!(engine().generate_shade_variations(&base, 0), vec![base]);
    }

    #[test]
    fn test_grey_out_moves_toward_grey() {
        let greyed = engine().grey_out(&color("#e6194b"));
        let hsl = hex_to_hsl(greyed.as_str()).unwrap();
        let original = hex_to_hsl("#e6194b").unwrap();
        assert!(hsl.s < original.s, "saturation should drop when greyed");
    }

    #[test]
    fn test_grey_out_of_grey_is_stable() {
        let grey = color("#b0b0b0");
        assert_eq!(engine().grey_out(&grey).as_str(), "#b0b0b0");
    }
}
