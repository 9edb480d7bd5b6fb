use crate::mutator::ObjectMutator;
use crate::params::ObjectParameters;
use core_model::{Rect, RuntimeResult};
use serde::{Deserialize, Serialize};

/// What an animation drawer does when its frame table runs out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AfterAction {
    /// Freeze on the final frame.
    #[default]
    Stop,
    /// Wrap to the first frame and keep playing.
    Loop,
    /// Remove the drawer entirely.
    Clear,
}

/// Frame-advance state shared by animation-capable drawers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Animator {
    pub playing: bool,
    pub start_time: u64,
    pub current_frame: usize,
    pub after_action: AfterAction,
    /// Per-frame display time in milliseconds.
    pub frame_times: Vec<u32>,
}

impl Animator {
    pub fn new(frame_times: Vec<u32>, after_action: AfterAction) -> Self {
        Self {
            playing: false,
            start_time: 0,
            current_frame: 0,
            after_action,
            frame_times,
        }
    }

    pub fn play(&mut self, now: u64) {
        self.playing = true;
        self.start_time = now;
        self.current_frame = 0;
    }

    pub fn pause(&mut self) {
        self.playing = false;
    }

    fn total_time(&self) -> u64 {
        self.frame_times.iter().map(|&t| t as u64).sum()
    }

    /// Advance the frame counter against the frame-time table. Returns true
    /// when the after-action asks for the drawer to be cleared.
    pub fn execute(&mut self, now: u64) -> bool {
        if !self.playing || self.frame_times.is_empty() {
            return false;
        }
        let total = self.total_time();
        if total == 0 {
            return false;
        }

        let elapsed = now.saturating_sub(self.start_time);
        let position = match self.after_action {
            AfterAction::Loop => elapsed % total,
            AfterAction::Stop | AfterAction::Clear => {
                if elapsed >= total {
                    self.playing = false;
                    if self.after_action == AfterAction::Clear {
                        return true;
                    }
                    self.current_frame = self.frame_times.len() - 1;
                    return false;
                }
                elapsed
            }
        };

        let mut acc = 0u64;
        for (index, &frame_time) in self.frame_times.iter().enumerate() {
            acc += frame_time as u64;
            if position < acc {
                self.current_frame = index;
                break;
            }
        }
        false
    }
}

/// A parent drawer's child arena: lazily-allocated slots addressed by
/// (parent index, child index).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParentLayer {
    children: Vec<Option<GraphicsObject>>,
}

impl ParentLayer {
    pub fn with_capacity(size: usize) -> Self {
        Self {
            children: (0..size).map(|_| None).collect(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.children.len()
    }

    pub fn child(&self, index: usize) -> Option<&GraphicsObject> {
        self.children.get(index).and_then(Option::as_ref)
    }

    /// Allocate-on-first-touch access.
    pub fn child_mut(&mut self, index: usize) -> Option<&mut GraphicsObject> {
        let slot = self.children.get_mut(index)?;
        Some(slot.get_or_insert_with(GraphicsObject::default))
    }

    pub fn set_child(&mut self, index: usize, object: GraphicsObject) {
        if index >= self.children.len() {
            self.children.resize_with(index + 1, || None);
        }
        self.children[index] = Some(object);
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &GraphicsObject)> {
        self.children
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|obj| (i, obj)))
    }

    fn execute(&mut self, now: u64) -> RuntimeResult<()> {
        for slot in self.children.iter_mut().flatten() {
            slot.execute(now)?;
        }
        Ok(())
    }
}

/// The polymorphic content kind of an object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Drawer {
    /// A file-backed surface; the renderer resolves the name to pixels.
    File {
        filename: String,
        pattern_count: usize,
    },
    /// An animation file with frame timing.
    Animation {
        filename: String,
        animator: Animator,
    },
    /// A solid colour filter over a screen region.
    ColourFilter { rect: Rect },
    /// Renders the object's text properties.
    Text,
    /// Renders the object's digit properties.
    Digit,
    /// Drift effect driven by the object's drift properties.
    Drift { filename: String, animator: Animator },
    /// Holds an arena of child objects which inherit part of this object's
    /// parameters at render time.
    Parent(ParentLayer),
}

impl Drawer {
    pub fn animator(&self) -> Option<&Animator> {
        match self {
            Drawer::Animation { animator, .. } | Drawer::Drift { animator, .. } => Some(animator),
            _ => None,
        }
    }

    pub fn animator_mut(&mut self) -> Option<&mut Animator> {
        match self {
            Drawer::Animation { animator, .. } | Drawer::Drift { animator, .. } => Some(animator),
            _ => None,
        }
    }

    pub fn is_parent_layer(&self) -> bool {
        matches!(self, Drawer::Parent(_))
    }
}

/// A drawable object: parameters + optional drawer + active mutators.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphicsObject {
    pub params: ObjectParameters,
    pub drawer: Option<Drawer>,
    mutators: Vec<ObjectMutator>,
}

impl GraphicsObject {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_content(&self) -> bool {
        self.drawer.is_some()
    }

    /// Reset parameters to neutral and release the drawer.
    pub fn free(&mut self) {
        self.params.initialize();
        self.drawer = None;
        self.mutators.clear();
    }

    pub fn attach_mutator(&mut self, mutator: ObjectMutator) {
        self.mutators.push(mutator);
    }

    pub fn mutator_count(&self) -> usize {
        self.mutators.len()
    }

    pub fn is_mutating(&self, repno: i32, name: &str) -> bool {
        self.mutators.iter().any(|m| m.matches(repno, name))
    }

    /// Snap and remove every mutator whose (repno, name) matches.
    pub fn end_mutations(&mut self, repno: i32, name: &str) {
        let params = &mut self.params;
        self.mutators.retain(|mutator| {
            if mutator.matches(repno, name) {
                mutator.set_to_end(params);
                false
            } else {
                true
            }
        });
    }

    /// Snap and remove all mutators.
    pub fn end_all_mutations(&mut self) {
        for mutator in self.mutators.drain(..) {
            mutator.set_to_end(&mut self.params);
        }
    }

    /// Per-tick work: advance mutators (insertion order, auto-removing
    /// completed ones), the animator, and children.
    pub fn execute(&mut self, now: u64) -> RuntimeResult<()> {
        let params = &mut self.params;
        let mut first_error = None;
        self.mutators.retain(|mutator| {
            if first_error.is_some() {
                return true;
            }
            match mutator.step(params, now) {
                Ok(done) => !done,
                Err(err) => {
                    first_error = Some(err);
                    true
                }
            }
        });
        if let Some(err) = first_error {
            return Err(err);
        }

        let mut clear_drawer = false;
        if let Some(drawer) = &mut self.drawer {
            if let Some(animator) = drawer.animator_mut() {
                clear_drawer = animator.execute(now);
            }
            if let Drawer::Parent(layer) = drawer {
                layer.execute(now)?;
            }
        }
        if clear_drawer {
            self.drawer = None;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpolation::InterpolationMode;
    use crate::mutator::MutatorTarget;
    use crate::params::ParamId;

    fn animator(frames: usize, frame_time: u32, after: AfterAction) -> Animator {
        let mut a = Animator::new(vec![frame_time; frames], after);
        a.play(0);
        a
    }

    #[test]
    fn looping_animator_wraps_by_frame_table() {
        let mut a = animator(5, 40, AfterAction::Loop);
        a.execute(200);
        // (200 / 40) mod 5 == 0
        assert_eq!(a.current_frame, 0);
        a.execute(90);
        assert_eq!(a.current_frame, 2);
        assert!(a.playing);
    }

    #[test]
    fn stopping_animator_freezes_on_last_frame() {
        let mut a = animator(5, 40, AfterAction::Stop);
        a.execute(200);
        assert_eq!(a.current_frame, 4);
        assert!(!a.playing);
    }

    #[test]
    fn clearing_animator_requests_drawer_removal() {
        let mut object = GraphicsObject::new();
        object.drawer = Some(Drawer::Animation {
            filename: "burst.anm".into(),
            animator: animator(2, 10, AfterAction::Clear),
        });
        object.execute(100).unwrap();
        assert!(object.drawer.is_none());
    }

    #[test]
    fn completed_mutators_auto_remove() {
        let mut object = GraphicsObject::new();
        object.attach_mutator(ObjectMutator::new(
            -1,
            "objEveAlpha",
            0,
            100,
            0,
            InterpolationMode::Linear,
            vec![MutatorTarget {
                param: ParamId::AlphaSource,
                start: 0,
                end: 200,
            }],
        ));
        object.execute(50).unwrap();
        assert_eq!(object.mutator_count(), 1);
        object.execute(101).unwrap();
        assert_eq!(object.mutator_count(), 0);
        assert_eq!(object.params.alpha_source, 200);
    }

    #[test]
    fn end_mutations_snaps_only_matching() {
        let mut object = GraphicsObject::new();
        for (name, param) in [("objEveMove", ParamId::X), ("objEveAlpha", ParamId::AlphaSource)] {
            object.attach_mutator(ObjectMutator::new(
                -1,
                name,
                0,
                10_000,
                0,
                InterpolationMode::Linear,
                vec![MutatorTarget {
                    param,
                    start: 0,
                    end: 77,
                }],
            ));
        }
        object.end_mutations(-1, "objEveMove");
        assert_eq!(object.params.x, 77);
        assert_ne!(object.params.alpha_source, 77);
        assert!(object.is_mutating(-1, "objEveAlpha"));
        assert!(!object.is_mutating(-1, "objEveMove"));
    }

    #[test]
    fn free_resets_params_and_drawer() {
        let mut object = GraphicsObject::new();
        object.params.visible = true;
        object.params.x = 5;
        object.drawer = Some(Drawer::Text);
        object.free();
        assert_eq!(object.params, ObjectParameters::default());
        assert!(object.drawer.is_none());
    }

    #[test]
    fn parent_layer_allocates_lazily() {
        let mut layer = ParentLayer::with_capacity(4);
        assert!(layer.child(2).is_none());
        layer.child_mut(2).unwrap().params.visible = true;
        assert!(layer.child(2).unwrap().params.visible);
        assert_eq!(layer.iter().count(), 1);
    }
}
