//! Patch store
//!
//! [`PatchData`] owns every collection of one patch and is the only place
//! they are mutated, so cross references stay consistent:
//!
//! - `module_id` is a dense index into `module_slugs`. Removing a module
//!   purges everything that belongs to it, then shifts every id above it
//!   down by one.
//! - Cables and panel input mappings never keep an empty input list.
//! - `midi_poly_num` follows the per-voice MIDI ids used by panel inputs.
//!
//! Mutations that can be rejected return a [`PatchResult`] and leave the
//! patch untouched on error. Lookups return `Option`.

use super::error::{PatchError, PatchResult};
use super::types::{
    truncate_to, InternalCable, Jack, KnobSetId, MappedInputJack, MappedKnob, MappedKnobSet,
    MappedLight, MappedOutputJack, ModuleInitState, PolyMode, StaticParam, DESCRIPTION_LEN,
    MAX_KNOB_SETS,
};
use rack_midi::MidiCalibration;
use std::borrow::Cow;

/// Module every patch starts from
pub const HUB_SLUG: &str = "HubMedium";

/// Placeholder slug for a module whose references were purged
pub const BLANK_SLUG: &str = "Blank";

/// Display name of the MIDI knob set
pub const MIDI_SET_NAME: &str = "MIDI";

/// Name shown for a knob set without an explicit name
pub fn default_knob_set_name(index: u32) -> String {
    format!("Knob Set {}", index + 1)
}

/// What to do with one stored module reference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ModuleRef {
    Keep,
    Drop,
    Renumber(u16),
}

/// Apply `op` to one reference; `false` means the owning record goes away
fn retarget(module_id: &mut u16, op: &impl Fn(u16) -> ModuleRef) -> bool {
    match op(*module_id) {
        ModuleRef::Keep => true,
        ModuleRef::Drop => false,
        ModuleRef::Renumber(new_id) => {
            *module_id = new_id;
            true
        }
    }
}

/// Replace the mapping with the same destination, or append
fn upsert_mapping(set: &mut Vec<MappedKnob>, map: MappedKnob) {
    if let Some(existing) = set.iter_mut().find(|m| m.maps_to_same_as(&map)) {
        *existing = map;
    } else {
        set.push(map);
    }
}

/// Complete routing, mapping and MIDI state of one patch
#[derive(Debug, Clone, PartialEq)]
pub struct PatchData {
    pub patch_name: String,
    pub description: String,
    /// Module type slugs; the index is the module id
    pub module_slugs: Vec<String>,
    pub int_cables: Vec<InternalCable>,
    pub mapped_ins: Vec<MappedInputJack>,
    pub mapped_outs: Vec<MappedOutputJack>,
    pub static_knobs: Vec<StaticParam>,
    pub knob_sets: Vec<MappedKnobSet>,
    pub mapped_lights: Vec<MappedLight>,
    pub module_states: Vec<ModuleInitState>,
    pub midi_maps: MappedKnobSet,
    pub midi_poly_num: u32,
    pub midi_poly_mode: PolyMode,
    /// Pitch wheel range in semitones
    pub midi_pitchwheel_range: f32,
    /// 0 = no suggestion
    pub suggested_samplerate: u32,
    /// 0 = no suggestion
    pub suggested_blocksize: u32,
    pub bypassed_modules: Vec<u16>,
    /// Decides which ids count as per-voice; not saved with the patch
    pub calibration: MidiCalibration,
}

impl Default for PatchData {
    fn default() -> Self {
        Self {
            patch_name: String::new(),
            description: String::new(),
            module_slugs: Vec::new(),
            int_cables: Vec::new(),
            mapped_ins: Vec::new(),
            mapped_outs: Vec::new(),
            static_knobs: Vec::new(),
            knob_sets: Vec::new(),
            mapped_lights: Vec::new(),
            module_states: Vec::new(),
            midi_maps: MappedKnobSet::default(),
            midi_poly_num: 1,
            midi_poly_mode: PolyMode::Rotate,
            midi_pitchwheel_range: 1.0,
            suggested_samplerate: 0,
            suggested_blocksize: 0,
            bypassed_modules: Vec::new(),
            calibration: MidiCalibration::default(),
        }
    }
}

impl PatchData {
    /// Blank patch with the hub already placed as module 0
    pub fn with_hub(patch_name: &str) -> Self {
        let mut pd = Self::default();
        pd.blank_patch(patch_name);
        pd.add_module(HUB_SLUG);
        pd
    }

    /// Reset to an empty patch: no modules, one unnamed-default knob set
    ///
    /// The calibration is kept.
    pub fn blank_patch(&mut self, patch_name: &str) {
        *self = Self {
            calibration: self.calibration,
            ..Self::default()
        };
        self.patch_name = patch_name.to_string();
        self.knob_sets.push(MappedKnobSet::named(default_knob_set_name(0)));
        self.midi_maps.name = MIDI_SET_NAME.into();
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = truncate_to(description.into(), DESCRIPTION_LEN);
    }

    pub fn num_modules(&self) -> usize {
        self.module_slugs.len()
    }

    pub fn module_slug(&self, module_id: u16) -> Option<&str> {
        self.module_slugs.get(module_id as usize).map(String::as_str)
    }

    fn check_module(&self, module_id: u16) -> PatchResult<()> {
        if (module_id as usize) < self.module_slugs.len() {
            Ok(())
        } else {
            Err(PatchError::ModuleOutOfRange {
                module_id,
                count: self.module_slugs.len(),
            })
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Knob sets
    // ─────────────────────────────────────────────────────────────────────

    pub fn knob_set(&self, set_id: KnobSetId) -> Option<&MappedKnobSet> {
        match set_id {
            KnobSetId::Midi => Some(&self.midi_maps),
            KnobSetId::Index(i) => self.knob_sets.get(i as usize),
        }
    }

    fn knob_set_mut(&mut self, set_id: KnobSetId) -> Option<&mut MappedKnobSet> {
        match set_id {
            KnobSetId::Midi => Some(&mut self.midi_maps),
            KnobSetId::Index(i) => self.knob_sets.get_mut(i as usize),
        }
    }

    pub fn find_mapped_knob(
        &self,
        set_id: KnobSetId,
        module_id: u16,
        param_id: u16,
    ) -> Option<&MappedKnob> {
        self.knob_set(set_id)?
            .set
            .iter()
            .find(|m| m.module_id == module_id && m.param_id == param_id)
    }

    pub fn find_mapped_knob_by_panel_id(
        &self,
        set_id: KnobSetId,
        panel_knob_id: u16,
    ) -> Option<&MappedKnob> {
        self.knob_set(set_id)?
            .set
            .iter()
            .find(|m| m.panel_knob_id == panel_knob_id)
    }

    /// Position of a mapping within its set (insertion order)
    pub fn find_mapped_knob_idx(
        &self,
        set_id: KnobSetId,
        module_id: u16,
        param_id: u16,
    ) -> Option<usize> {
        self.knob_set(set_id)?
            .set
            .iter()
            .position(|m| m.module_id == module_id && m.param_id == param_id)
    }

    pub fn find_midi_map(&self, module_id: u16, param_id: u16) -> Option<&MappedKnob> {
        self.find_mapped_knob(KnobSetId::Midi, module_id, param_id)
    }

    pub fn find_midi_map_by_panel_id(&self, panel_knob_id: u16) -> Option<&MappedKnob> {
        self.find_mapped_knob_by_panel_id(KnobSetId::Midi, panel_knob_id)
    }

    /// Update the mapping with the same `(module_id, param_id)` in place,
    /// or add it
    ///
    /// `set_id` equal to the current number of sets appends a new set
    /// seeded with this mapping.
    pub fn add_update_mapped_knob(&mut self, set_id: KnobSetId, map: MappedKnob) -> PatchResult<()> {
        let index = match set_id {
            KnobSetId::Midi => return self.add_update_midi_map(map),
            KnobSetId::Index(i) => i,
        };

        if index >= MAX_KNOB_SETS {
            return Err(PatchError::KnobSetOutOfRange {
                set: set_id,
                max: MAX_KNOB_SETS,
            });
        }

        self.check_module(map.module_id)?;

        let count = self.knob_sets.len();
        if index as usize > count {
            return Err(PatchError::KnobSetNotContiguous { set: index, count });
        }

        if index as usize == count {
            self.knob_sets.push(MappedKnobSet {
                set: vec![map],
                ..Default::default()
            });
        } else {
            upsert_mapping(&mut self.knob_sets[index as usize].set, map);
        }

        Ok(())
    }

    /// Like [`add_update_mapped_knob`](Self::add_update_mapped_knob) for the
    /// MIDI set, which only takes CC and gate-note sources
    pub fn add_update_midi_map(&mut self, map: MappedKnob) -> PatchResult<()> {
        if !map.is_midi() {
            return Err(PatchError::NotMidiMappable {
                panel_knob_id: map.panel_knob_id,
            });
        }

        self.check_module(map.module_id)?;

        upsert_mapping(&mut self.midi_maps.set, map);
        Ok(())
    }

    /// Remove every mapping in the set that targets the same parameter as `map`
    ///
    /// Returns whether anything was removed.
    pub fn remove_mapping(&mut self, set_id: KnobSetId, map: &MappedKnob) -> PatchResult<bool> {
        if let KnobSetId::Index(i) = set_id {
            if i as usize >= self.knob_sets.len() {
                return Err(PatchError::KnobSetOutOfRange {
                    set: set_id,
                    max: self.knob_sets.len() as u32,
                });
            }
        }

        self.check_module(map.module_id)?;

        let Some(knob_set) = self.knob_set_mut(set_id) else {
            return Ok(false);
        };
        let before = knob_set.set.len();
        knob_set.set.retain(|m| !m.maps_to_same_as(map));
        Ok(knob_set.set.len() < before)
    }

    /// Display name of a knob set; empty for a set that doesn't exist
    pub fn valid_knob_set_name(&self, set_id: KnobSetId) -> Cow<'_, str> {
        match set_id {
            KnobSetId::Midi => Cow::Borrowed(MIDI_SET_NAME),
            KnobSetId::Index(i) => match self.knob_sets.get(i as usize) {
                None => Cow::Borrowed(""),
                Some(ks) if !ks.name.is_empty() => Cow::Borrowed(ks.name.as_str()),
                Some(_) => Cow::Owned(default_knob_set_name(i)),
            },
        }
    }

    /// Drop empty knob sets, keeping set 0 even when empty
    ///
    /// An empty list is re-seeded with one default set.
    pub fn trim_empty_knobsets(&mut self) {
        if self.knob_sets.is_empty() {
            self.knob_sets.push(MappedKnobSet::named(default_knob_set_name(0)));
            return;
        }

        let before = self.knob_sets.len();
        let mut index = 0;
        self.knob_sets.retain(|ks| {
            let keep = index == 0 || !ks.set.is_empty();
            index += 1;
            keep
        });

        if self.knob_sets.len() < before {
            log::debug!(
                "trim_empty_knobsets: Removed {} empty knob set(s)",
                before - self.knob_sets.len()
            );
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Static knobs
    // ─────────────────────────────────────────────────────────────────────

    pub fn find_static_knob(&self, module_id: u16, param_id: u16) -> Option<&StaticParam> {
        self.static_knobs
            .iter()
            .find(|k| k.module_id == module_id && k.param_id == param_id)
    }

    pub fn get_static_knob_value(&self, module_id: u16, param_id: u16) -> Option<f32> {
        self.find_static_knob(module_id, param_id).map(|k| k.value)
    }

    pub fn set_or_add_static_knob_value(&mut self, module_id: u16, param_id: u16, value: f32) {
        match self
            .static_knobs
            .iter_mut()
            .find(|k| k.module_id == module_id && k.param_id == param_id)
        {
            Some(knob) => knob.value = value,
            None => self.static_knobs.push(StaticParam {
                module_id,
                param_id,
                value,
            }),
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Cables and panel jacks
    // ─────────────────────────────────────────────────────────────────────

    /// Cable driven by `out_jack` (cables without inputs don't count)
    pub fn find_internal_cable_with_outjack(&self, out_jack: Jack) -> Option<&InternalCable> {
        self.int_cables
            .iter()
            .find(|c| c.out == out_jack && !c.ins.is_empty())
    }

    pub fn find_internal_cable_with_injack(&self, in_jack: Jack) -> Option<&InternalCable> {
        self.int_cables.iter().find(|c| c.ins.contains(&in_jack))
    }

    /// Connect `in_jack` to `out_jack`, fanning out from an existing cable
    ///
    /// Duplicate inputs are not filtered.
    pub fn add_internal_cable(&mut self, in_jack: Jack, out_jack: Jack) {
        match self
            .int_cables
            .iter_mut()
            .find(|c| c.out == out_jack && !c.ins.is_empty())
        {
            Some(cable) => cable.ins.push(in_jack),
            None => self.int_cables.push(InternalCable {
                out: out_jack,
                ins: vec![in_jack],
                color: None,
            }),
        }
    }

    /// Remove `jack` from every cable and panel input, pruning whatever is
    /// left without inputs
    pub fn disconnect_injack(&mut self, jack: Jack) {
        for cable in &mut self.int_cables {
            cable.ins.retain(|j| *j != jack);
        }
        self.int_cables.retain(|c| !c.ins.is_empty());

        for map in &mut self.mapped_ins {
            map.ins.retain(|j| *j != jack);
        }
        self.mapped_ins.retain(|m| !m.ins.is_empty());

        self.update_midi_poly_num();
    }

    /// Remove every cable and panel output driven by `jack`
    pub fn disconnect_outjack(&mut self, jack: Jack) {
        self.int_cables.retain(|c| c.out != jack);
        self.mapped_outs.retain(|m| m.out != jack);
    }

    pub fn find_mapped_injack(&self, jack: Jack) -> Option<&MappedInputJack> {
        self.mapped_ins.iter().find(|m| m.ins.contains(&jack))
    }

    pub fn find_mapped_injack_by_panel_id(&self, panel_jack_id: u32) -> Option<&MappedInputJack> {
        self.mapped_ins
            .iter()
            .find(|m| m.panel_jack_id == panel_jack_id)
    }

    pub fn find_mapped_outjack(&self, jack: Jack) -> Option<&MappedOutputJack> {
        self.mapped_outs.iter().find(|m| m.out == jack)
    }

    pub fn find_mapped_outjack_by_panel_id(&self, panel_jack_id: u32) -> Option<&MappedOutputJack> {
        self.mapped_outs
            .iter()
            .find(|m| m.panel_jack_id == panel_jack_id)
    }

    /// Route a panel input to `jack`, adding it to the fan-out if the panel
    /// input is already mapped
    pub fn add_mapped_injack(&mut self, panel_jack_id: u32, jack: Jack) {
        match self
            .mapped_ins
            .iter_mut()
            .find(|m| m.panel_jack_id == panel_jack_id)
        {
            Some(map) if map.ins.contains(&jack) => return,
            Some(map) => map.ins.push(jack),
            None => self.mapped_ins.push(MappedInputJack {
                panel_jack_id,
                ins: vec![jack],
                alias_name: Default::default(),
            }),
        }
        self.update_midi_poly_num_for(panel_jack_id);
    }

    /// Route `jack` to a panel output, replacing any previous source
    pub fn add_mapped_outjack(&mut self, panel_jack_id: u32, jack: Jack) {
        let mut found = false;
        for map in self
            .mapped_outs
            .iter_mut()
            .filter(|m| m.panel_jack_id == panel_jack_id)
        {
            map.out = jack;
            found = true;
        }

        if !found {
            self.mapped_outs.push(MappedOutputJack {
                panel_jack_id,
                out: jack,
                alias_name: Default::default(),
            });
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // MIDI polyphony
    // ─────────────────────────────────────────────────────────────────────

    /// Switch calibration and recompute polyphony under it
    pub fn set_calibration(&mut self, calibration: MidiCalibration) {
        self.calibration = calibration;
        self.update_midi_poly_num();
    }

    /// Recompute polyphony from all panel inputs (0 when no per-voice id is used)
    pub fn update_midi_poly_num(&mut self) {
        let calibration = self.calibration;
        self.midi_poly_num = self
            .mapped_ins
            .iter()
            .filter_map(|m| calibration.polychan(m.panel_jack_id))
            .max()
            .unwrap_or(0);
    }

    /// Raise polyphony to cover one newly used id. Never lowers it.
    pub fn update_midi_poly_num_for(&mut self, panel_jack_id: u32) {
        if let Some(poly) = self.calibration.polychan(panel_jack_id) {
            self.midi_poly_num = self.midi_poly_num.max(poly);
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Modules
    // ─────────────────────────────────────────────────────────────────────

    /// Append a module; returns its id
    pub fn add_module(&mut self, slug: impl Into<String>) -> u16 {
        let module_id = self.module_slugs.len() as u16;
        let slug = slug.into();
        log::debug!("add_module: {} as module {}", slug, module_id);
        self.module_slugs.push(slug);
        module_id
    }

    /// Remove a module and renumber every module id above it
    ///
    /// Does nothing for an id out of range.
    pub fn remove_module(&mut self, module_id: u16) {
        if self.check_module(module_id).is_err() {
            return;
        }

        // Purge must run before the shift, or records of the next module
        // would be caught by the purge.
        self.blank_out_module(module_id);
        self.rewrite_module_refs(|id| {
            if id > module_id {
                ModuleRef::Renumber(id - 1)
            } else {
                ModuleRef::Keep
            }
        });
        self.module_slugs.remove(module_id as usize);

        log::debug!(
            "remove_module: Removed module {}, {} module(s) left",
            module_id,
            self.module_slugs.len()
        );
    }

    /// Purge everything that belongs to a module, leaving a placeholder slug
    /// so other module ids stay valid
    pub fn blank_out_module(&mut self, module_id: u16) {
        let Some(slug) = self.module_slugs.get_mut(module_id as usize) else {
            return;
        };
        *slug = BLANK_SLUG.to_string();

        self.rewrite_module_refs(|id| {
            if id == module_id {
                ModuleRef::Drop
            } else {
                ModuleRef::Keep
            }
        });
    }

    /// Visit every stored module reference
    ///
    /// Records whose reference is dropped are removed. Cables and panel
    /// inputs lose only the dropped inputs, and go away once empty. A cable
    /// goes away with its output module.
    fn rewrite_module_refs(&mut self, op: impl Fn(u16) -> ModuleRef) {
        self.int_cables.retain_mut(|cable| {
            if !retarget(&mut cable.out.module_id, &op) {
                return false;
            }
            cable.ins.retain_mut(|jack| retarget(&mut jack.module_id, &op));
            !cable.ins.is_empty()
        });

        self.mapped_ins.retain_mut(|map| {
            map.ins.retain_mut(|jack| retarget(&mut jack.module_id, &op));
            !map.ins.is_empty()
        });

        self.mapped_outs
            .retain_mut(|map| retarget(&mut map.out.module_id, &op));

        self.static_knobs
            .retain_mut(|knob| retarget(&mut knob.module_id, &op));

        for knob_set in &mut self.knob_sets {
            knob_set
                .set
                .retain_mut(|map| retarget(&mut map.module_id, &op));
        }
        self.midi_maps
            .set
            .retain_mut(|map| retarget(&mut map.module_id, &op));

        self.mapped_lights
            .retain_mut(|light| retarget(&mut light.module_id, &op));

        self.module_states
            .retain_mut(|state| retarget(&mut state.module_id, &op));

        self.bypassed_modules.retain_mut(|id| retarget(id, &op));
    }
}
