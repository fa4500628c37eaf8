use crate::error::ConfigError;
use crate::params::tree::ParameterTree;

type Callback = Box<dyn FnMut(&str, f32)>;

/// GUI-thread parameter change listeners.
///
/// Each listener set keeps its own view of the tree: the generation it last
/// saw and the normalized value of every parameter at that point. The GUI
/// calls [`dispatch`](Self::dispatch) from its repaint tick, which compares
/// the tree against that view and runs the callbacks there. Several sets can
/// watch one tree without stealing changes from each other. Nothing here is
/// ever touched by the audio thread, so callbacks are free to allocate or
/// lock.
#[derive(Default)]
pub struct ParameterListeners {
    callbacks: Vec<(usize, Callback)>,
    seen_generation: Option<u64>,
    seen_values: Vec<f32>,
}

impl ParameterListeners {
    pub fn new() -> Self {
        Self::default()
    }

    /// Call `callback` with the id and new plain value whenever `id` changes.
    ///
    /// The first registration takes the tree's current values as the
    /// baseline for later dispatches.
    pub fn on_parameter_changed(
        &mut self,
        tree: &ParameterTree,
        id: &str,
        callback: impl FnMut(&str, f32) + 'static,
    ) -> Result<(), ConfigError> {
        let index = tree
            .index_of(id)
            .ok_or_else(|| ConfigError::UnknownParameter { id: id.to_string() })?;
        if self.seen_generation.is_none() {
            self.rebase(tree);
        }
        self.callbacks.push((index, Box::new(callback)));
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }

    fn rebase(&mut self, tree: &ParameterTree) {
        self.seen_generation = Some(tree.generation());
        self.seen_values.clear();
        self.seen_values.extend(tree.iter().map(|parameter| parameter.normalized()));
    }

    /// Run the callbacks for every parameter that changed since the last
    /// dispatch.
    ///
    /// Returns how many parameters had changed. A dispatch with no baseline
    /// yet only records one.
    pub fn dispatch(&mut self, tree: &ParameterTree) -> usize {
        let generation = tree.generation();
        match self.seen_generation {
            None => {
                self.rebase(tree);
                return 0;
            }
            Some(seen) if seen == generation => return 0,
            Some(_) => {}
        }
        self.seen_generation = Some(generation);
        if self.seen_values.len() != tree.len() {
            self.seen_values.resize(tree.len(), f32::NAN);
        }

        let mut changed = 0;
        for ((index, parameter), seen) in tree.iter().enumerate().zip(self.seen_values.iter_mut()) {
            let normalized = parameter.normalized();
            if normalized.to_bits() == seen.to_bits() {
                continue;
            }
            *seen = normalized;
            changed += 1;
            let value = parameter.plain();
            for (_, callback) in self.callbacks.iter_mut().filter(|(target, _)| *target == index) {
                callback(parameter.id(), value);
            }
        }
        changed
    }
}
