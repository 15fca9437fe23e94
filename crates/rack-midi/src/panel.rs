//! Panel control identifiers
//!
//! The low end of the id space addresses physical hardware: the built-in
//! panel knobs, then the pots of attached expanders, then expander buttons.

/// Knobs on the main panel
pub const MAX_PANEL_KNOBS: u32 = 12;
/// Pot slots reserved for expanders
pub const MAX_EXP_POTS: u32 = 32;
/// Button slots reserved for expanders
pub const MAX_EXP_BUTTONS: u32 = 32;

/// First expander pot (directly after the panel knobs)
pub const FIRST_EXP_KNOB: u32 = MAX_PANEL_KNOBS;
/// Last id that addresses a knob of any kind (43)
pub const LAST_POSSIBLE_KNOB: u32 = MAX_PANEL_KNOBS + MAX_EXP_POTS - 1;

/// First expander button (44)
pub const FIRST_BUTTON: u32 = LAST_POSSIBLE_KNOB + 1;
/// Last expander button (75)
pub const LAST_BUTTON: u32 = LAST_POSSIBLE_KNOB + MAX_EXP_BUTTONS;

/// Total number of addressable panel params
pub const NUM_TOTAL_PARAMS: u32 = LAST_BUTTON;

/// Id is one of the built-in panel knobs
pub fn is_panel_knob(id: u32) -> bool {
    id < MAX_PANEL_KNOBS
}

/// Id is a panel knob or an expander pot
pub fn is_any_knob(id: u32) -> bool {
    id <= LAST_POSSIBLE_KNOB
}

/// Id is an expander button
pub fn is_button(id: u32) -> bool {
    (FIRST_BUTTON..=LAST_BUTTON).contains(&id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_boundaries() {
        assert_eq!(LAST_POSSIBLE_KNOB, 43);
        assert_eq!(FIRST_BUTTON, 44);
        assert_eq!(LAST_BUTTON, 75);
    }

    #[test]
    fn test_classification() {
        assert!(is_panel_knob(0));
        assert!(is_panel_knob(11));
        assert!(!is_panel_knob(12));
        assert!(is_any_knob(12));
        assert!(is_any_knob(43));
        assert!(!is_any_knob(44));
        assert!(is_button(44));
        assert!(is_button(75));
        assert!(!is_button(76));
        assert!(!is_button(43));
    }
}
