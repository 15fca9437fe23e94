//! Entity <-> YAML node conversion
//!
//! Every persisted entity is a YAML map. Reading is per node: a node that
//! fails is reported and the caller decides whether to skip it.

use super::error::{NodeError, NodeResult};
use crate::patch::types::{
    scalar_text, InternalCable, Jack, MappedInputJack, MappedKnob, MappedKnobSet, MappedLight,
    MappedOutputJack, ModuleInitState, StaticParam,
};
use serde::de::DeserializeOwned;
use serde_yaml::{Mapping, Value};

/// Conversion of one entity to and from a document node
pub trait PatchNode: Sized {
    fn to_node(&self) -> NodeResult<Value>;

    /// Fails when the node is not a map or lacks a required field
    fn from_node(node: &Value) -> NodeResult<Self>;
}

/// Entities whose serde layout is their node layout
macro_rules! impl_map_node {
    ($($ty:ty),* $(,)?) => {
        $(
            impl PatchNode for $ty {
                fn to_node(&self) -> NodeResult<Value> {
                    Ok(serde_yaml::to_value(self)?)
                }

                fn from_node(node: &Value) -> NodeResult<Self> {
                    if !node.is_mapping() {
                        return Err(NodeError::NotAMap);
                    }
                    Ok(serde_yaml::from_value(node.clone())?)
                }
            }
        )*
    };
}

impl_map_node!(
    Jack,
    StaticParam,
    MappedKnob,
    InternalCable,
    MappedInputJack,
    MappedOutputJack,
    MappedLight,
    ModuleInitState,
);

impl PatchNode for MappedKnobSet {
    fn to_node(&self) -> NodeResult<Value> {
        let mut map = Mapping::new();
        map.insert("name".into(), Value::from(self.name.as_str()));
        map.insert("set".into(), list_to_node(&self.set)?);
        Ok(Value::Mapping(map))
    }

    /// A knob set node that isn't a map reads as an empty set
    fn from_node(node: &Value) -> NodeResult<Self> {
        let mut knob_set = Self::default();
        let Some(map) = node.as_mapping() else {
            return Ok(knob_set);
        };

        if let Some(name) = map.get("name") {
            knob_set.name = serde_yaml::from_value(name.clone())?;
        }
        if let Some(set) = map.get("set") {
            knob_set.set = list_from_node(set, "set").unwrap_or_default();
        }
        Ok(knob_set)
    }
}

pub fn list_to_node<T: PatchNode>(items: &[T]) -> NodeResult<Value> {
    let nodes = items
        .iter()
        .map(PatchNode::to_node)
        .collect::<NodeResult<Vec<_>>>()?;
    Ok(Value::Sequence(nodes))
}

/// Read a sequence element by element, skipping elements that fail
///
/// `None` when the node is not a sequence. A null node is an empty list.
fn sequence_from_node<T, E: std::fmt::Display>(
    node: &Value,
    field: &str,
    read: impl Fn(&Value) -> Result<T, E>,
) -> Option<Vec<T>> {
    let items = match node {
        Value::Sequence(items) => items,
        Value::Null => return Some(Vec::new()),
        _ => {
            log::warn!("sequence_from_node: {} is not a list, ignoring", field);
            return None;
        }
    };

    let list = items
        .iter()
        .enumerate()
        .filter_map(|(i, item)| match read(item) {
            Ok(v) => Some(v),
            Err(e) => {
                log::warn!("sequence_from_node: Skipping {}[{}]: {}", field, i, e);
                None
            }
        })
        .collect();
    Some(list)
}

/// Read a sequence of entities, skipping elements that fail
pub fn list_from_node<T: PatchNode>(node: &Value, field: &str) -> Option<Vec<T>> {
    sequence_from_node(node, field, T::from_node)
}

/// Read a sequence of plain values (e.g. module ids), skipping elements that fail
pub fn values_from_node<T: DeserializeOwned>(node: &Value, field: &str) -> Option<Vec<T>> {
    sequence_from_node(node, field, |item| serde_yaml::from_value::<T>(item.clone()))
}

/// Module slugs as a map keyed by module id
pub fn slugs_to_node(slugs: &[String]) -> Value {
    let map: Mapping = slugs
        .iter()
        .enumerate()
        .map(|(i, slug)| (Value::from(i as u64), Value::from(slug.as_str())))
        .collect();
    Value::Mapping(map)
}

/// Read module slugs from a map (in document order) or a plain list
pub fn slugs_from_node(node: &Value) -> Option<Vec<String>> {
    let values: Vec<&Value> = match node {
        Value::Mapping(map) => map.values().collect(),
        Value::Sequence(seq) => seq.iter().collect(),
        Value::Null => return Some(Vec::new()),
        _ => {
            log::warn!("slugs_from_node: module_slugs is neither a map nor a list, ignoring");
            return None;
        }
    };

    let slugs = values
        .into_iter()
        .filter_map(|v| {
            let slug = scalar_text(v);
            if slug.is_none() {
                log::warn!("slugs_from_node: Skipping non-scalar module slug");
            }
            slug
        })
        .collect();
    Some(slugs)
}
