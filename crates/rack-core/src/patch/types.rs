//! Patch entity types
//!
//! Plain value types that make up a patch. Module references are positional:
//! `module_id` is an index into [`PatchData::module_slugs`](super::PatchData).

use rack_midi::ids::{MIDI_CC0, MIDI_CC127, MIDI_GATE_NOTE0, MIDI_GATE_NOTE127};
use rack_midi::{panel, MappingId};
use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_yaml::Value;
use std::fmt;
use std::ops::Deref;

/// Maximum number of switchable knob sets in a patch
pub const MAX_KNOB_SETS: u32 = 8;

/// Raw set id addressing the MIDI mapping set
pub const MIDI_KNOB_SET: u32 = 0xFFFF_FFFF;

/// Maximum length of alias names, in bytes
pub const ALIAS_NAME_LEN: usize = 31;

/// Maximum length of the patch description, in bytes
pub const DESCRIPTION_LEN: usize = 255;

/// Truncate `s` to at most `max` bytes without splitting a character
pub(crate) fn truncate_to(mut s: String, max: usize) -> String {
    if s.len() > max {
        let mut end = max;
        while !s.is_char_boundary(end) {
            end -= 1;
        }
        s.truncate(end);
    }
    s
}

/// One jack on one module instance
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Jack {
    pub module_id: u16,
    pub jack_id: u16,
}

impl Jack {
    pub const fn new(module_id: u16, jack_id: u16) -> Self {
        Self { module_id, jack_id }
    }
}

/// Fixed (unmapped) parameter value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StaticParam {
    pub module_id: u16,
    pub param_id: u16,
    pub value: f32,
}

/// Short user-facing name, at most [`ALIAS_NAME_LEN`] bytes
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct AliasName(String);

impl AliasName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(truncate_to(name.into(), ALIAS_NAME_LEN))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn is_empty_name(&self) -> bool {
        self.0.is_empty()
    }
}

impl Deref for AliasName {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for AliasName {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for AliasName {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl fmt::Display for AliasName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for AliasName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for AliasName {
    /// Any scalar is taken as text (`name: 2024`); null and non-scalars read as empty
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        let name = scalar_text(&value).unwrap_or_else(|| {
            log::warn!("AliasName: Ignoring non-scalar name {:?}", value);
            String::new()
        });
        Ok(Self::new(name))
    }
}

/// Response curve of a mapped knob
///
/// Persisted as an integer. Unknown values read as `Normal`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "i64", into = "u8")]
pub enum CurveType {
    #[default]
    Normal = 0,
    Toggle = 1,
}

impl From<i64> for CurveType {
    fn from(v: i64) -> Self {
        match v {
            0 => Self::Normal,
            1 => Self::Toggle,
            other => {
                log::warn!("CurveType: Unknown curve_type {}, using Normal", other);
                Self::Normal
            }
        }
    }
}

impl From<CurveType> for u8 {
    fn from(c: CurveType) -> u8 {
        c as u8
    }
}

fn is_zero(v: &u8) -> bool {
    *v == 0
}

/// Scalar YAML value as text; null reads as empty
pub(crate) fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null => Some(String::new()),
        _ => None,
    }
}

/// Optional field that falls back to its default instead of failing the record
fn or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_yaml::from_value(value).unwrap_or_else(|e| {
        log::warn!("Ignoring invalid optional field: {}", e);
        T::default()
    }))
}

/// Maps one panel knob, MIDI CC or MIDI gate-note to one module parameter
///
/// Two mappings are equal when they target the same `(module_id, param_id)`,
/// whatever their source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MappedKnob {
    pub panel_knob_id: u16,
    pub module_id: u16,
    pub param_id: u16,
    pub curve_type: CurveType,
    pub min: f32,
    pub max: f32,
    #[serde(default, skip_serializing_if = "AliasName::is_empty_name")]
    pub alias_name: AliasName,
    /// 0: any channel, 1-16: only that MIDI channel
    #[serde(default, deserialize_with = "or_default", skip_serializing_if = "is_zero")]
    pub midi_chan: u8,
}

impl MappedKnob {
    /// Full-range mapping with no alias and omni channel
    pub fn new(panel_knob_id: u16, module_id: u16, param_id: u16) -> Self {
        Self {
            panel_knob_id,
            module_id,
            param_id,
            curve_type: CurveType::Normal,
            min: 0.0,
            max: 1.0,
            alias_name: AliasName::default(),
            midi_chan: 0,
        }
    }

    pub fn with_range(mut self, min: f32, max: f32) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    /// Value of the mapped parameter for a panel value in 0..1
    ///
    /// Goes from `min` to `max`; reversed when `max < min`.
    pub fn get_mapped_val(&self, panel_val: f32) -> f32 {
        (self.max - self.min) * panel_val + self.min
    }

    /// Inverse of [`get_mapped_val`](Self::get_mapped_val). 0 for a degenerate range.
    pub fn unmap_val(&self, mapped_val: f32) -> f32 {
        if self.min == self.max {
            return 0.0;
        }
        (mapped_val - self.min) / (self.max - self.min)
    }

    pub fn is_panel_knob(&self) -> bool {
        panel::is_panel_knob(self.panel_knob_id as u32)
    }

    pub fn is_midi_cc(&self) -> bool {
        (MIDI_CC0..=MIDI_CC127).contains(&(self.panel_knob_id as u32))
    }

    pub fn is_midi_notegate(&self) -> bool {
        (MIDI_GATE_NOTE0..=MIDI_GATE_NOTE127).contains(&(self.panel_knob_id as u32))
    }

    pub fn is_midi(&self) -> bool {
        self.is_midi_notegate() || self.is_midi_cc()
    }

    pub fn is_button(&self) -> bool {
        panel::is_button(self.panel_knob_id as u32)
    }

    /// Only meaningful when [`is_midi_cc`](Self::is_midi_cc)
    pub fn cc_num(&self) -> u16 {
        self.panel_knob_id.wrapping_sub(MIDI_CC0 as u16)
    }

    /// Only meaningful when [`is_midi_notegate`](Self::is_midi_notegate)
    pub fn notegate_num(&self) -> u16 {
        self.panel_knob_id.wrapping_sub(MIDI_GATE_NOTE0 as u16)
    }

    pub fn mapping_id(&self) -> Option<MappingId> {
        MappingId::decode(self.panel_knob_id as u32)
    }

    pub fn maps_to_same_as(&self, other: &MappedKnob) -> bool {
        self.module_id == other.module_id && self.param_id == other.param_id
    }
}

impl PartialEq for MappedKnob {
    fn eq(&self, other: &Self) -> bool {
        self.maps_to_same_as(other)
    }
}

/// Named bank of knob mappings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MappedKnobSet {
    #[serde(default)]
    pub name: AliasName,
    #[serde(default)]
    pub set: Vec<MappedKnob>,
}

impl MappedKnobSet {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: AliasName::new(name),
            set: Vec::new(),
        }
    }
}

/// Addresses either one of the numbered knob sets or the MIDI set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KnobSetId {
    Index(u32),
    Midi,
}

impl KnobSetId {
    pub fn raw(self) -> u32 {
        match self {
            Self::Index(i) => i,
            Self::Midi => MIDI_KNOB_SET,
        }
    }
}

impl From<u32> for KnobSetId {
    fn from(raw: u32) -> Self {
        if raw == MIDI_KNOB_SET {
            Self::Midi
        } else {
            Self::Index(raw)
        }
    }
}

impl fmt::Display for KnobSetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(i) => write!(f, "{}", i),
            Self::Midi => write!(f, "MIDI"),
        }
    }
}

fn non_empty_jacks<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Jack>, D::Error> {
    let ins = Vec::<Jack>::deserialize(deserializer)?;
    if ins.is_empty() {
        return Err(D::Error::custom("expected at least one input jack"));
    }
    Ok(ins)
}

/// Virtual cable from one output to one or more inputs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InternalCable {
    pub out: Jack,
    #[serde(deserialize_with = "non_empty_jacks")]
    pub ins: Vec<Jack>,
    #[serde(
        default,
        deserialize_with = "or_default",
        skip_serializing_if = "Option::is_none"
    )]
    pub color: Option<u16>,
}

/// Panel input jack feeding one or more module inputs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappedInputJack {
    pub panel_jack_id: u32,
    #[serde(deserialize_with = "non_empty_jacks")]
    pub ins: Vec<Jack>,
    #[serde(default, skip_serializing_if = "AliasName::is_empty_name")]
    pub alias_name: AliasName,
}

/// Panel output jack driven by one module output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappedOutputJack {
    pub panel_jack_id: u32,
    pub out: Jack,
    #[serde(default, skip_serializing_if = "AliasName::is_empty_name")]
    pub alias_name: AliasName,
}

/// Panel light driven by a module's light output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappedLight {
    pub panel_light_id: u32,
    pub module_id: u16,
    pub light_id: u16,
}

/// Required scalar text field; null counts as missing
fn scalar_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Null => Err(D::Error::custom("expected a scalar value, found null")),
        value => scalar_text(&value).ok_or_else(|| D::Error::custom("expected a scalar value")),
    }
}

/// Opaque saved state of one module; the module decides the encoding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleInitState {
    pub module_id: u16,
    #[serde(rename = "data", deserialize_with = "scalar_string")]
    pub state_data: String,
}

/// MIDI voice allocation mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PolyMode {
    #[default]
    Rotate = 0,
    Reuse = 1,
    Reset = 2,
    Mpe = 3,
}

impl PolyMode {
    pub fn as_u32(self) -> u32 {
        self as u32
    }
}

impl TryFrom<u32> for PolyMode {
    type Error = u32;

    fn try_from(v: u32) -> Result<Self, u32> {
        match v {
            0 => Ok(Self::Rotate),
            1 => Ok(Self::Reuse),
            2 => Ok(Self::Reset),
            3 => Ok(Self::Mpe),
            other => Err(other),
        }
    }
}
