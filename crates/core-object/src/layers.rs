use crate::object::GraphicsObject;
use core_model::{RuntimeError, RuntimeResult};
use serde::{Deserialize, Serialize};

/// Default ceiling on object numbers per layer; the configuration can
/// raise it (`OBJECT_MAX`).
pub const DEFAULT_OBJECT_CEILING: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Layer {
    Foreground,
    Background,
}

impl Layer {
    pub fn from_int(value: i32) -> RuntimeResult<Layer> {
        match value {
            0 => Ok(Layer::Background),
            1 => Ok(Layer::Foreground),
            _ => Err(RuntimeError::BadFormat(format!(
                "invalid object layer {value}"
            ))),
        }
    }
}

/// Lazily-allocated object slots for one layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct ObjectArray {
    slots: Vec<Option<GraphicsObject>>,
}

impl ObjectArray {
    fn new(size: usize) -> Self {
        Self {
            slots: (0..size).map(|_| None).collect(),
        }
    }

    fn check(&self, index: usize) -> RuntimeResult<()> {
        if index >= self.slots.len() {
            return Err(RuntimeError::BadIndex {
                bank: "objects".into(),
                index,
                size: self.slots.len(),
            });
        }
        Ok(())
    }

    fn get(&self, index: usize) -> Option<&GraphicsObject> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    fn get_mut(&mut self, index: usize) -> RuntimeResult<&mut GraphicsObject> {
        self.check(index)?;
        Ok(self.slots[index].get_or_insert_with(GraphicsObject::default))
    }

    fn set(&mut self, index: usize, object: GraphicsObject) -> RuntimeResult<()> {
        self.check(index)?;
        self.slots[index] = Some(object);
        Ok(())
    }

    fn take(&mut self, index: usize) -> Option<GraphicsObject> {
        self.slots.get_mut(index).and_then(Option::take)
    }

    fn iter_mut(&mut self) -> impl Iterator<Item = &mut GraphicsObject> {
        self.slots.iter_mut().flatten()
    }

    fn iter(&self) -> impl Iterator<Item = (usize, &GraphicsObject)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|obj| (i, obj)))
    }
}

/// The foreground/background object table shared read-only with the
/// renderer between ticks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphicsLayers {
    foreground: ObjectArray,
    background: ObjectArray,
}

impl Default for GraphicsLayers {
    fn default() -> Self {
        Self::with_ceiling(DEFAULT_OBJECT_CEILING)
    }
}

impl GraphicsLayers {
    pub fn with_ceiling(ceiling: usize) -> Self {
        Self {
            foreground: ObjectArray::new(ceiling),
            background: ObjectArray::new(ceiling),
        }
    }

    pub fn ceiling(&self) -> usize {
        self.foreground.slots.len()
    }

    fn array(&self, layer: Layer) -> &ObjectArray {
        match layer {
            Layer::Foreground => &self.foreground,
            Layer::Background => &self.background,
        }
    }

    fn array_mut(&mut self, layer: Layer) -> &mut ObjectArray {
        match layer {
            Layer::Foreground => &mut self.foreground,
            Layer::Background => &mut self.background,
        }
    }

    pub fn object(&self, layer: Layer, index: usize) -> Option<&GraphicsObject> {
        self.array(layer).get(index)
    }

    /// Allocate-on-first-touch access to a slot.
    pub fn object_mut(&mut self, layer: Layer, index: usize) -> RuntimeResult<&mut GraphicsObject> {
        self.array_mut(layer).get_mut(index)
    }

    pub fn set_object(
        &mut self,
        layer: Layer,
        index: usize,
        object: GraphicsObject,
    ) -> RuntimeResult<()> {
        self.array_mut(layer).set(index, object)
    }

    /// Child access through a foreground/background parent drawer.
    pub fn child_mut(
        &mut self,
        layer: Layer,
        parent_index: usize,
        child_index: usize,
    ) -> RuntimeResult<&mut GraphicsObject> {
        use crate::object::{Drawer, ParentLayer};
        let parent = self.object_mut(layer, parent_index)?;
        if !matches!(parent.drawer, Some(Drawer::Parent(_))) {
            parent.drawer = Some(Drawer::Parent(ParentLayer::with_capacity(
                DEFAULT_OBJECT_CEILING,
            )));
        }
        match parent.drawer.as_mut() {
            Some(Drawer::Parent(children)) => {
                children.child_mut(child_index).ok_or(RuntimeError::BadIndex {
                    bank: "child objects".into(),
                    index: child_index,
                    size: DEFAULT_OBJECT_CEILING,
                })
            }
            _ => unreachable!("parent drawer installed above"),
        }
    }

    pub fn allocated(&self, layer: Layer) -> impl Iterator<Item = (usize, &GraphicsObject)> {
        self.array(layer).iter()
    }

    /// Per-tick work for every allocated object in both layers.
    pub fn execute(&mut self, now: u64) -> RuntimeResult<()> {
        for object in self
            .foreground
            .iter_mut()
            .chain(self.background.iter_mut())
        {
            object.execute(now)?;
        }
        Ok(())
    }

    /// Scene-transition promotion: every foreground object without
    /// `wipe_copy` is reset and its drawer freed, then each background
    /// object moves into the corresponding foreground slot.
    pub fn clear_and_promote(&mut self) {
        let size = self.foreground.slots.len().min(self.background.slots.len());
        for index in 0..size {
            if let Some(fg) = self.foreground.slots[index].as_mut() {
                if !fg.params.wipe_copy {
                    fg.free();
                }
            }
            if let Some(bg) = self.background.take(index) {
                self.foreground.slots[index] = Some(bg);
            }
        }
    }

    /// Free every object in both layers (full reset).
    pub fn clear_all(&mut self) {
        for object in self
            .foreground
            .iter_mut()
            .chain(self.background.iter_mut())
        {
            object.free();
        }
    }
}
