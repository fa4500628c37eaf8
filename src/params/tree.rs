use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use log::warn;

use crate::error::ConfigError;
use crate::params::range::{ParameterRange, Unit};

/*
Parameter Tree
==============

The tree is the single source of truth for every automatable value.

  host thread    set_normalized(i, v)   stores the value and bumps the
                                        generation counter
  audio thread   snapshot_into(&mut s)  copies every plain value into a
                                        preallocated snapshot, wait-free
  GUI thread     ParameterListeners     diffs against its last seen values
                                        and calls callbacks there

Values live in AtomicU32 cells holding the bits of the normalized f32, so
every access is a single relaxed load or store. The shape of the tree (ids,
ranges, order) is frozen by `ParameterTreeBuilder::build`.
*/

/// Static description of one parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterDescriptor {
    pub name: String,
    pub group: String,
    pub range: ParameterRange,
    /// Plain default value.
    pub default: f32,
    pub unit: Unit,
}

impl ParameterDescriptor {
    pub fn new(name: impl Into<String>, range: ParameterRange, default: f32, unit: Unit) -> Self {
        Self {
            name: name.into(),
            group: String::new(),
            range,
            default,
            unit,
        }
    }

    pub fn in_group(mut self, group: impl Into<String>) -> Self {
        self.group = group.into();
        self
    }
}

/// A registered parameter with its live value.
#[derive(Debug)]
pub struct Parameter {
    id: String,
    descriptor: ParameterDescriptor,
    normalized: AtomicU32,
}

impl Parameter {
    fn new(id: String, descriptor: ParameterDescriptor) -> Self {
        let normalized = descriptor.range.to_normalized(descriptor.default);
        Self {
            id,
            descriptor,
            normalized: AtomicU32::new(normalized.to_bits()),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    pub fn group(&self) -> &str {
        &self.descriptor.group
    }

    pub fn range(&self) -> &ParameterRange {
        &self.descriptor.range
    }

    pub fn unit(&self) -> Unit {
        self.descriptor.unit
    }

    pub fn default_plain(&self) -> f32 {
        self.descriptor.default
    }

    pub fn default_normalized(&self) -> f32 {
        self.descriptor.range.to_normalized(self.descriptor.default)
    }

    #[inline]
    pub fn normalized(&self) -> f32 {
        f32::from_bits(self.normalized.load(Ordering::Relaxed))
    }

    #[inline]
    pub fn plain(&self) -> f32 {
        self.descriptor.range.to_plain(self.normalized())
    }

    /// Human readable current value, using the choice label when there is one.
    pub fn display(&self) -> String {
        let plain = self.plain();
        match self.descriptor.range.label(plain) {
            Some(label) => label.to_string(),
            None => self.descriptor.unit.format(plain),
        }
    }

    fn store(&self, normalized: f32) {
        let normalized = if normalized.is_finite() { normalized.clamp(0.0, 1.0) } else { 0.0 };
        self.normalized.store(normalized.to_bits(), Ordering::Relaxed);
    }
}

/// Collects parameters before the tree shape is frozen.
#[derive(Debug, Default)]
pub struct ParameterTreeBuilder {
    parameters: Vec<Parameter>,
    index: HashMap<String, usize>,
}

impl ParameterTreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a parameter. Ids must be unique and the default must lie in
    /// the declared range.
    pub fn register(
        &mut self,
        id: impl Into<String>,
        descriptor: ParameterDescriptor,
    ) -> Result<&mut Self, ConfigError> {
        let id = id.into();
        if self.index.contains_key(&id) {
            warn!("rejecting duplicate parameter id '{id}'");
            return Err(ConfigError::DuplicateParameter { id });
        }
        if !descriptor.range.is_valid() {
            return Err(ConfigError::InvalidRange {
                id,
                min: descriptor.range.min(),
                max: descriptor.range.max(),
            });
        }
        if !descriptor.range.contains(descriptor.default) {
            return Err(ConfigError::InvalidDefault { id, value: descriptor.default });
        }

        self.index.insert(id.clone(), self.parameters.len());
        self.parameters.push(Parameter::new(id, descriptor));
        Ok(self)
    }

    pub fn build(self) -> ParameterTree {
        ParameterTree {
            parameters: self.parameters.into_boxed_slice(),
            index: self.index,
            generation: AtomicU64::new(0),
        }
    }
}

/// Immutable-shape registry of parameters with atomic values.
#[derive(Debug)]
pub struct ParameterTree {
    parameters: Box<[Parameter]>,
    index: HashMap<String, usize>,
    generation: AtomicU64,
}

impl ParameterTree {
    pub fn builder() -> ParameterTreeBuilder {
        ParameterTreeBuilder::new()
    }

    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    /// Parameters in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Parameter> {
        self.parameters.iter()
    }

    pub fn get(&self, index: usize) -> Option<&Parameter> {
        self.parameters.get(index)
    }

    pub fn find(&self, id: &str) -> Option<&Parameter> {
        self.index_of(id).map(|index| &self.parameters[index])
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    /// Group names in the order their first parameter was registered.
    pub fn groups(&self) -> Vec<&str> {
        let mut groups: Vec<&str> = Vec::new();
        for parameter in self.parameters.iter() {
            let group = parameter.group();
            if !group.is_empty() && !groups.contains(&group) {
                groups.push(group);
            }
        }
        groups
    }

    /// Parameters belonging to `group`, in registration order.
    pub fn in_group<'a>(&'a self, group: &'a str) -> impl Iterator<Item = &'a Parameter> + 'a {
        self.parameters.iter().filter(move |p| p.group() == group)
    }

    /// Incremented on every value change.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    // -- host surface -----------------------------------------------------

    pub fn parameter_count(&self) -> usize {
        self.len()
    }

    pub fn normalized(&self, index: usize) -> Option<f32> {
        self.get(index).map(Parameter::normalized)
    }

    /// Set a normalized value by index. Returns false for an unknown index.
    pub fn set_normalized(&self, index: usize, normalized: f32) -> bool {
        match self.get(index) {
            Some(parameter) => {
                parameter.store(normalized);
                self.generation.fetch_add(1, Ordering::AcqRel);
                true
            }
            None => false,
        }
    }

    pub fn set_normalized_by_id(&self, id: &str, normalized: f32) -> Result<(), ConfigError> {
        let index = self
            .index_of(id)
            .ok_or_else(|| ConfigError::UnknownParameter { id: id.to_string() })?;
        self.set_normalized(index, normalized);
        Ok(())
    }

    /// Set a plain value by id, clamping it into the declared range.
    pub fn set_plain(&self, id: &str, plain: f32) -> Result<(), ConfigError> {
        let index = self
            .index_of(id)
            .ok_or_else(|| ConfigError::UnknownParameter { id: id.to_string() })?;
        let normalized = self.parameters[index].range().to_normalized(plain);
        self.set_normalized(index, normalized);
        Ok(())
    }

    pub fn reset_to_defaults(&self) {
        for index in 0..self.parameters.len() {
            let default = self.parameters[index].default_normalized();
            self.set_normalized(index, default);
        }
    }

    // -- audio surface ----------------------------------------------------

    /// Allocate a snapshot sized for this tree. Call outside the audio thread.
    pub fn snapshot(&self) -> ParamSnapshot {
        let mut snapshot = ParamSnapshot {
            values: vec![0.0; self.parameters.len()],
            generation: 0,
        };
        self.snapshot_into(&mut snapshot);
        snapshot
    }

    /// Copy every plain value into `snapshot`. Wait-free and allocation-free
    /// when the snapshot came from [`snapshot`](Self::snapshot).
    pub fn snapshot_into(&self, snapshot: &mut ParamSnapshot) {
        snapshot.generation = self.generation();
        for (value, parameter) in snapshot.values.iter_mut().zip(self.parameters.iter()) {
            *value = parameter.plain();
        }
    }
}

/// Plain parameter values captured once per block.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSnapshot {
    values: Vec<f32>,
    generation: u64,
}

impl ParamSnapshot {
    /// Plain value at registration index `index`, 0 when out of range.
    #[inline]
    pub fn plain(&self, index: usize) -> f32 {
        self.values.get(index).copied().unwrap_or(0.0)
    }

    /// Tree generation this snapshot was taken at.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_tree() -> ParameterTree {
        let mut builder = ParameterTree::builder();
        builder
            .register(
                "hereticDrive",
                ParameterDescriptor::new("Drive", ParameterRange::linear(1.0, 32.0), 1.5, Unit::Ratio)
                    .in_group("heretic"),
            )
            .unwrap()
            .register(
                "hereticMix",
                ParameterDescriptor::new("Mix", ParameterRange::linear(0.0, 1.0), 0.5, Unit::Percent)
                    .in_group("heretic"),
            )
            .unwrap()
            .register(
                "filterType",
                ParameterDescriptor::new(
                    "Type",
                    ParameterRange::Choice { options: vec!["Low", "High"] },
                    0.0,
                    Unit::Raw,
                )
                .in_group("filter"),
            )
            .unwrap();
        builder.build()
    }

    #[test]
    fn duplicate_ids_fail_fast() {
        let mut builder = ParameterTree::builder();
        let descriptor = ParameterDescriptor::new("Mix", ParameterRange::linear(0.0, 1.0), 0.5, Unit::Percent);
        builder.register("mix", descriptor.clone()).unwrap();

        let err = builder.register("mix", descriptor).unwrap_err();
        assert_eq!(err, ConfigError::DuplicateParameter { id: "mix".into() });
    }

    #[test]
    fn default_outside_range_is_rejected() {
        let mut builder = ParameterTree::builder();
        let descriptor = ParameterDescriptor::new("Gain", ParameterRange::linear(-24.0, 24.0), 30.0, Unit::Decibels);
        assert!(matches!(
            builder.register("gain", descriptor),
            Err(ConfigError::InvalidDefault { .. })
        ));
    }

    #[test]
    fn insertion_order_and_groups_are_preserved() {
        let tree = small_tree();
        let ids: Vec<&str> = tree.iter().map(Parameter::id).collect();
        assert_eq!(ids, ["hereticDrive", "hereticMix", "filterType"]);
        assert_eq!(tree.groups(), ["heretic", "filter"]);
        assert_eq!(tree.in_group("heretic").count(), 2);
    }

    #[test]
    fn defaults_show_up_in_snapshot() {
        let tree = small_tree();
        let snapshot = tree.snapshot();
        assert!((snapshot.plain(0) - 1.5).abs() < 1e-5);
        assert!((snapshot.plain(1) - 0.5).abs() < 1e-6);
        assert_eq!(snapshot.plain(2), 0.0);
        assert_eq!(snapshot.plain(99), 0.0, "out of range reads are zero");
    }

    #[test]
    fn host_writes_bump_generation_and_clamp() {
        let tree = small_tree();
        let before = tree.generation();

        assert!(tree.set_normalized(1, 2.0));
        assert_eq!(tree.normalized(1), Some(1.0), "normalized values are clamped");
        assert!(tree.generation() > before);
        assert!(!tree.set_normalized(17, 0.5));

        tree.set_plain("hereticDrive", 32.0).unwrap();
        let mut snapshot = tree.snapshot();
        tree.snapshot_into(&mut snapshot);
        assert_eq!(snapshot.plain(0), 32.0);
        assert_eq!(snapshot.generation(), tree.generation());

        assert!(matches!(
            tree.set_plain("nope", 1.0),
            Err(ConfigError::UnknownParameter { .. })
        ));
    }

    #[test]
    fn display_uses_units_and_labels() {
        let tree = small_tree();
        assert_eq!(tree.find("hereticMix").unwrap().display(), "50 %");
        assert_eq!(tree.find("filterType").unwrap().display(), "Low");
    }

    #[test]
    fn reset_restores_defaults() {
        let tree = small_tree();
        tree.set_normalized(0, 1.0);
        tree.reset_to_defaults();
        assert!((tree.find("hereticDrive").unwrap().plain() - 1.5).abs() < 1e-5);
    }
}
