//! Patch document reader/writer
//!
//! ```yaml
//! PatchData:
//!   patch_name: My Patch
//!   module_slugs:
//!     0: HubMedium
//!     1: VCO
//!   int_cables: []
//!   mapped_knobs:
//!     - name: Knob Set 1
//!       set: [...]
//!   ...
//! ```
//!
//! Only `PatchData` and `patch_name` are required. Every other field is
//! applied on its own when present, so older documents keep loading.

use super::error::{PatchLoadError, PatchSaveError};
use super::node::{
    list_from_node, list_to_node, slugs_from_node, slugs_to_node, values_from_node, PatchNode,
};
use crate::patch::types::scalar_text;
use crate::patch::{MappedKnobSet, PatchData, PolyMode, MAX_KNOB_SETS};
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde_yaml::{Mapping, Value};
use std::path::Path;

const ROOT_KEY: &str = "PatchData";
const KNOB_SETS_KEY: &str = "mapped_knobs";
const MODULE_STATES_KEY: &str = "vcvModuleStates";

fn read_scalar<T: DeserializeOwned>(data: &Value, key: &str) -> Option<T> {
    let node = data.get(key)?;
    match serde_yaml::from_value(node.clone()) {
        Ok(v) => Some(v),
        Err(e) => {
            log::warn!("yaml_to_patch: Ignoring invalid {}: {}", key, e);
            None
        }
    }
}

fn read_list<T: PatchNode>(data: &Value, key: &str) -> Option<Vec<T>> {
    list_from_node(data.get(key)?, key)
}

/// Load a patch document into `pd`
///
/// Fails only when the document doesn't parse, is empty, or lacks
/// `PatchData`/`patch_name`; `pd` is not touched in that case. Otherwise
/// each present field replaces the one in `pd`, and elements that fail to
/// read are skipped. Module references are not validated.
pub fn yaml_to_patch(yaml: &str, pd: &mut PatchData) -> Result<(), PatchLoadError> {
    if yaml.trim().is_empty() {
        log::warn!("yaml_to_patch: Rejecting empty document");
        return Err(PatchLoadError::EmptyDocument);
    }

    let root: Value = serde_yaml::from_str(yaml)?;

    let is_empty = match &root {
        Value::Null => true,
        Value::Mapping(map) => map.is_empty(),
        Value::Sequence(seq) => seq.is_empty(),
        _ => false,
    };
    if is_empty {
        log::warn!("yaml_to_patch: Rejecting empty document");
        return Err(PatchLoadError::EmptyDocument);
    }

    let data = root.get(ROOT_KEY).ok_or_else(|| {
        log::warn!("yaml_to_patch: Rejecting document without {}", ROOT_KEY);
        PatchLoadError::MissingPatchData
    })?;

    let patch_name = data
        .get("patch_name")
        .and_then(scalar_text)
        .ok_or_else(|| {
            log::warn!("yaml_to_patch: Rejecting document without patch_name");
            PatchLoadError::MissingPatchName
        })?;

    pd.patch_name = patch_name;

    if let Some(description) = data.get("description").and_then(scalar_text) {
        pd.set_description(description);
    }

    if let Some(slugs) = data.get("module_slugs").and_then(slugs_from_node) {
        pd.module_slugs = slugs;
    }
    if let Some(cables) = read_list(data, "int_cables") {
        pd.int_cables = cables;
    }
    if let Some(ins) = read_list(data, "mapped_ins") {
        pd.mapped_ins = ins;
    }
    if let Some(outs) = read_list(data, "mapped_outs") {
        pd.mapped_outs = outs;
    }
    if let Some(knobs) = read_list(data, "static_knobs") {
        pd.static_knobs = knobs;
    }

    if let Some(mut knob_sets) = read_list::<MappedKnobSet>(data, KNOB_SETS_KEY) {
        if knob_sets.len() > MAX_KNOB_SETS as usize {
            log::warn!(
                "yaml_to_patch: Dropping {} knob set(s) past the limit of {}",
                knob_sets.len() - MAX_KNOB_SETS as usize,
                MAX_KNOB_SETS
            );
            knob_sets.truncate(MAX_KNOB_SETS as usize);
        }
        pd.knob_sets = knob_sets;
    }

    if let Some(node) = data.get("midi_maps") {
        match MappedKnobSet::from_node(node) {
            Ok(midi_maps) => pd.midi_maps = midi_maps,
            Err(e) => log::warn!("yaml_to_patch: Ignoring invalid midi_maps: {}", e),
        }
    }

    if let Some(poly_num) = read_scalar(data, "midi_poly_num") {
        pd.midi_poly_num = poly_num;
    }

    if let Some(raw) = read_scalar::<u32>(data, "midi_poly_mode") {
        match PolyMode::try_from(raw) {
            Ok(mode) => pd.midi_poly_mode = mode,
            Err(v) => log::warn!("yaml_to_patch: Ignoring unknown midi_poly_mode {}", v),
        }
    }

    if let Some(range) = read_scalar(data, "midi_pitchwheel_range") {
        pd.midi_pitchwheel_range = range;
    }

    if let Some(lights) = read_list(data, "mapped_lights") {
        pd.mapped_lights = lights;
    }
    if let Some(states) = read_list(data, MODULE_STATES_KEY) {
        pd.module_states = states;
    }

    pd.suggested_samplerate = read_scalar(data, "suggested_samplerate").unwrap_or(0);
    pd.suggested_blocksize = read_scalar(data, "suggested_blocksize").unwrap_or(0);

    if let Some(bypassed) = data
        .get("bypassed_modules")
        .and_then(|node| values_from_node(node, "bypassed_modules"))
    {
        pd.bypassed_modules = bypassed;
    }

    Ok(())
}

/// Parse a patch document into a fresh [`PatchData`]
pub fn yaml_string_to_patch(yaml: &str) -> Result<PatchData, PatchLoadError> {
    let mut pd = PatchData::default();
    yaml_to_patch(yaml, &mut pd)?;
    Ok(pd)
}

/// Write the full patch document
pub fn patch_to_yaml(pd: &PatchData) -> Result<String, PatchSaveError> {
    let mut data = Mapping::new();
    data.insert("patch_name".into(), Value::from(pd.patch_name.as_str()));
    data.insert("description".into(), Value::from(pd.description.as_str()));
    data.insert("module_slugs".into(), slugs_to_node(&pd.module_slugs));
    data.insert("int_cables".into(), list_to_node(&pd.int_cables)?);
    data.insert("mapped_ins".into(), list_to_node(&pd.mapped_ins)?);
    data.insert("mapped_outs".into(), list_to_node(&pd.mapped_outs)?);
    data.insert("static_knobs".into(), list_to_node(&pd.static_knobs)?);
    data.insert(KNOB_SETS_KEY.into(), list_to_node(&pd.knob_sets)?);
    data.insert("midi_maps".into(), pd.midi_maps.to_node()?);
    data.insert("midi_poly_num".into(), Value::from(pd.midi_poly_num));
    data.insert(
        "midi_poly_mode".into(),
        Value::from(pd.midi_poly_mode.as_u32()),
    );
    data.insert(
        "midi_pitchwheel_range".into(),
        Value::from(pd.midi_pitchwheel_range),
    );
    data.insert("mapped_lights".into(), list_to_node(&pd.mapped_lights)?);
    data.insert(MODULE_STATES_KEY.into(), list_to_node(&pd.module_states)?);
    data.insert(
        "suggested_samplerate".into(),
        Value::from(pd.suggested_samplerate),
    );
    data.insert(
        "suggested_blocksize".into(),
        Value::from(pd.suggested_blocksize),
    );
    data.insert(
        "bypassed_modules".into(),
        Value::Sequence(pd.bypassed_modules.iter().map(|&m| Value::from(m)).collect()),
    );

    let mut root = Mapping::new();
    root.insert(ROOT_KEY.into(), Value::Mapping(data));
    Ok(serde_yaml::to_string(&root)?)
}

/// Read and parse a patch file
pub fn load_patch_file(path: &Path) -> Result<PatchData, PatchLoadError> {
    log::info!("load_patch_file: Loading from {:?}", path);

    let yaml = std::fs::read_to_string(path).map_err(|source| PatchLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let pd = yaml_string_to_patch(&yaml)?;

    log::info!(
        "load_patch_file: Loaded '{}' ({} modules)",
        pd.patch_name,
        pd.num_modules()
    );
    Ok(pd)
}

/// Write a patch file
///
/// Creates parent directories if they don't exist.
pub fn save_patch_file(pd: &PatchData, path: &Path) -> Result<()> {
    log::info!("save_patch_file: Saving '{}' to {:?}", pd.patch_name, path);

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create patch directory: {:?}", parent))?;
    }

    let yaml = patch_to_yaml(pd).context("Failed to serialize patch to YAML")?;

    std::fs::write(path, yaml)
        .with_context(|| format!("Failed to write patch file: {:?}", path))?;

    log::info!("save_patch_file: Patch saved successfully");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patch::{CurveType, Jack, KnobSetId, MappedKnob, ModuleInitState};

    /// `MappedKnob` equality only looks at the destination, so compare every field
    fn assert_knobs_match(loaded: &[MappedKnob], expected: &[MappedKnob]) {
        assert_eq!(loaded.len(), expected.len());
        for (a, b) in loaded.iter().zip(expected) {
            assert_eq!(
                (a.panel_knob_id, a.module_id, a.param_id),
                (b.panel_knob_id, b.module_id, b.param_id)
            );
            assert_eq!(a.curve_type, b.curve_type);
            assert_eq!((a.min, a.max), (b.min, b.max));
            assert_eq!(a.alias_name, b.alias_name);
            assert_eq!(a.midi_chan, b.midi_chan);
        }
    }

    fn assert_patches_match(loaded: &PatchData, expected: &PatchData) {
        assert_eq!(loaded, expected);
        assert_eq!(loaded.knob_sets.len(), expected.knob_sets.len());
        for (a, b) in loaded.knob_sets.iter().zip(&expected.knob_sets) {
            assert_eq!(a.name, b.name);
            assert_knobs_match(&a.set, &b.set);
        }
        assert_eq!(loaded.midi_maps.name, expected.midi_maps.name);
        assert_knobs_match(&loaded.midi_maps.set, &expected.midi_maps.set);
    }

    #[test]
    fn test_end_to_end_roundtrip() {
        let mut pd = PatchData::default();
        pd.blank_patch("Roundtrip");
        assert_eq!(pd.add_module("HubMedium"), 0);
        assert_eq!(pd.add_module("VCO"), 1);
        pd.add_update_mapped_knob(KnobSetId::Index(0), MappedKnob::new(3, 1, 0))
            .unwrap();

        let yaml = patch_to_yaml(&pd).unwrap();
        let loaded = yaml_string_to_patch(&yaml).unwrap();

        assert_eq!(loaded.patch_name, "Roundtrip");
        assert_eq!(loaded.module_slugs, vec!["HubMedium", "VCO"]);
        assert_eq!(loaded.knob_sets.len(), 1);
        let knob = &loaded.knob_sets[0].set[0];
        assert_eq!(
            (knob.panel_knob_id, knob.module_id, knob.param_id),
            (3, 1, 0)
        );
        assert_eq!((knob.min, knob.max), (0.0, 1.0));
        assert_patches_match(&loaded, &pd);
    }

    #[test]
    fn test_full_patch_roundtrip() {
        let mut pd = PatchData::with_hub("Everything");
        pd.set_description("A patch with one of everything");
        let vco = pd.add_module("VCO");
        let vca = pd.add_module("VCA");
        pd.add_internal_cable(Jack::new(vca, 0), Jack::new(vco, 0));
        pd.int_cables[0].color = Some(3);
        pd.add_mapped_injack(0x105, Jack::new(vco, 1));
        pd.add_mapped_outjack(0, Jack::new(vca, 0));
        pd.set_or_add_static_knob_value(vco, 2, 0.5);
        let mut knob = MappedKnob::new(0x207, vca, 1).with_range(0.25, 0.75);
        knob.alias_name = "Level".into();
        knob.midi_chan = 2;
        pd.add_update_midi_map(knob).unwrap();
        let mut toggle = MappedKnob::new(4, vco, 3).with_range(1.0, 0.0);
        toggle.curve_type = CurveType::Toggle;
        toggle.alias_name = "Sync".into();
        pd.add_update_mapped_knob(KnobSetId::Index(0), toggle).unwrap();
        pd.module_states.push(ModuleInitState {
            module_id: vco,
            state_data: "{\"wave\": 2}".into(),
        });
        pd.midi_poly_mode = PolyMode::Mpe;
        pd.midi_pitchwheel_range = 12.0;
        pd.suggested_samplerate = 48000;
        pd.suggested_blocksize = 64;
        pd.bypassed_modules.push(vca);

        let loaded = yaml_string_to_patch(&patch_to_yaml(&pd).unwrap()).unwrap();

        assert_patches_match(&loaded, &pd);
        assert_eq!(loaded.knob_sets[0].set[0].curve_type, CurveType::Toggle);
        assert_eq!(loaded.midi_poly_num, 6);
        assert_eq!(loaded.int_cables[0].color, Some(3));
        let midi = &loaded.midi_maps.set[0];
        assert_eq!(midi.alias_name.as_str(), "Level");
        assert_eq!(midi.midi_chan, 2);
        assert_eq!(midi.max, 0.75);
        assert_eq!(loaded.module_states[0].state_data, "{\"wave\": 2}");
    }

    #[test]
    fn test_rejected_documents_leave_patch_untouched() {
        let original = PatchData::with_hub("Keep me");

        for doc in [
            "",
            "{}",
            "Other:\n  patch_name: x",
            "PatchData:\n  description: no name",
            "PatchData: [",
        ] {
            let mut pd = original.clone();
            assert!(yaml_to_patch(doc, &mut pd).is_err(), "accepted {:?}", doc);
            assert_patches_match(&pd, &original);
        }
    }

    #[test]
    fn test_load_error_kinds() {
        let mut pd = PatchData::default();
        assert!(matches!(
            yaml_to_patch("", &mut pd),
            Err(PatchLoadError::EmptyDocument)
        ));
        assert!(matches!(
            yaml_to_patch("Other: 1", &mut pd),
            Err(PatchLoadError::MissingPatchData)
        ));
        assert!(matches!(
            yaml_to_patch("PatchData:\n  module_slugs: []", &mut pd),
            Err(PatchLoadError::MissingPatchName)
        ));
        assert!(matches!(
            yaml_to_patch("PatchData: [", &mut pd),
            Err(PatchLoadError::Parse(_))
        ));
    }

    #[test]
    fn test_minimal_document() {
        let mut pd = PatchData::with_hub("Old");
        pd.suggested_samplerate = 96000;
        pd.suggested_blocksize = 128;

        yaml_to_patch("PatchData:\n  patch_name: Minimal\n", &mut pd).unwrap();

        assert_eq!(pd.patch_name, "Minimal");
        // Absent lists are left alone
        assert_eq!(pd.module_slugs, vec!["HubMedium"]);
        assert_eq!(pd.knob_sets.len(), 1);
        // Engine hints reset when absent
        assert_eq!(pd.suggested_samplerate, 0);
        assert_eq!(pd.suggested_blocksize, 0);
    }

    #[test]
    fn test_poly_mode_out_of_range_ignored() {
        let mut pd = PatchData::default();
        pd.midi_poly_mode = PolyMode::Reuse;
        yaml_to_patch("PatchData:\n  patch_name: x\n  midi_poly_mode: 7\n", &mut pd).unwrap();
        assert_eq!(pd.midi_poly_mode, PolyMode::Reuse);

        yaml_to_patch("PatchData:\n  patch_name: x\n  midi_poly_mode: 2\n", &mut pd).unwrap();
        assert_eq!(pd.midi_poly_mode, PolyMode::Reset);
    }

    #[test]
    fn test_bad_elements_skipped() {
        let doc = r#"
PatchData:
  patch_name: Partial
  module_slugs: [HubMedium, VCO]
  int_cables:
    - out: {module_id: 1, jack_id: 0}
      ins: []
    - out: {module_id: 1, jack_id: 1}
      ins:
        - {module_id: 0, jack_id: 2}
  static_knobs:
    - {module_id: 1, param_id: 0}
    - {module_id: 1, param_id: 1, value: 0.5}
  midi_poly_num: lots
"#;
        let pd = yaml_string_to_patch(doc).unwrap();

        assert_eq!(pd.module_slugs, vec!["HubMedium", "VCO"]);
        assert_eq!(pd.int_cables.len(), 1);
        assert_eq!(pd.int_cables[0].out, Jack::new(1, 1));
        assert_eq!(pd.static_knobs.len(), 1);
        assert_eq!(pd.get_static_knob_value(1, 1), Some(0.5));
        assert_eq!(pd.midi_poly_num, 1);
    }

    #[test]
    fn test_off_type_fields_keep_records() {
        let doc = r#"
PatchData:
  patch_name: 1999
  module_slugs: [HubMedium, VCO, VCA]
  mapped_ins:
    - panel_jack_id: 0
      ins:
        - {module_id: 1, jack_id: 0}
      alias_name: 42
  mapped_knobs:
    - name: 2024
      set:
        - {panel_knob_id: 0, module_id: 1, param_id: 0, curve_type: 0, min: 0, max: 1, alias_name: 808}
        - {panel_knob_id: 1, module_id: 2, param_id: 1, curve_type: 2, min: 0, max: 1}
  bypassed_modules: [1, x]
"#;
        let pd = yaml_string_to_patch(doc).unwrap();

        assert_eq!(pd.patch_name, "1999");
        assert_eq!(pd.mapped_ins.len(), 1);
        assert_eq!(pd.mapped_ins[0].alias_name.as_str(), "42");

        assert_eq!(pd.knob_sets.len(), 1);
        let set = &pd.knob_sets[0];
        assert_eq!(set.name.as_str(), "2024");
        assert_eq!(set.set.len(), 2);
        assert_eq!(set.set[0].alias_name.as_str(), "808");
        assert_eq!(set.set[1].module_id, 2);
        assert_eq!(set.set[1].curve_type, CurveType::Normal);

        assert_eq!(pd.bypassed_modules, vec![1]);
    }

    #[test]
    fn test_knob_sets_capped() {
        let mut doc = String::from("PatchData:\n  patch_name: Many\n  mapped_knobs:\n");
        for i in 0..10 {
            doc.push_str(&format!("    - name: Set {}\n      set: []\n", i));
        }
        let pd = yaml_string_to_patch(&doc).unwrap();
        assert_eq!(pd.knob_sets.len(), MAX_KNOB_SETS as usize);
        assert_eq!(pd.knob_sets[7].name.as_str(), "Set 7");
    }

    #[test]
    fn test_written_document_shape() {
        let mut pd = PatchData::with_hub("Shape");
        pd.add_module("VCO");
        let yaml = patch_to_yaml(&pd).unwrap();

        assert!(yaml.starts_with("PatchData:"));
        assert!(yaml.contains("patch_name: Shape"));
        assert!(yaml.contains("0: HubMedium"));
        assert!(yaml.contains("mapped_knobs:"));
        assert!(yaml.contains("vcvModuleStates: []"));
    }

    #[test]
    fn test_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("patches").join("test.yml");

        let mut pd = PatchData::with_hub("File");
        pd.add_module("VCO");

        save_patch_file(&pd, &path).unwrap();
        let loaded = load_patch_file(&path).unwrap();
        assert_patches_match(&loaded, &pd);
    }

    #[test]
    fn test_load_missing_file() {
        let result = load_patch_file(Path::new("/nonexistent/path/patch.yml"));
        assert!(matches!(result, Err(PatchLoadError::Io { .. })));
    }
}
