//! Overlay content pinned to another actor
//!
//! A pin draws its content at the position of a target actor, following it
//! as it moves. The target is referenced by handle and resolved every frame,
//! so the pin never keeps the target alive and simply hides once the target
//! is gone.

use crate::geometry::Rect;

/// Handle of an actor in the host's scene graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActorId(pub u64);

/// Resolves actor handles to their current stage bounds
pub trait ActorLookup {
    /// Stage-space bounds of `actor`, or `None` if it no longer exists
    fn bounds(&self, actor: ActorId) -> Option<Rect>;

    /// Width and height of the stage
    fn stage_size(&self) -> (f32, f32);
}

/// How the pin's own position is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PositionMode {
    /// Offset from the target's stage position
    #[default]
    Relative,
    /// Stage coordinates; the target only controls visibility
    Absolute,
}

/// How the pin's size is determined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SizeMode {
    /// The pin keeps its own size
    #[default]
    Absolute,
    /// The pin takes the target's size every frame
    Mimic,
}

/// Where pinned content is drawn this frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PinFrame {
    pub bounds: Rect,
    /// Multiplied into the parent alpha when drawing the content
    pub alpha: f32,
}

/// Content attached to a target actor
#[derive(Debug, Clone)]
pub struct Pin<C> {
    content: C,
    target: Option<ActorId>,
    bounds: Rect,
    alpha: f32,
    position_mode: PositionMode,
    size_mode: SizeMode,
    keep_within_stage: bool,
    touchable: bool,
}

impl<C> Pin<C> {
    /// Create a pin without a target; it draws nothing until one is set
    pub fn new(content: C) -> Self {
        Self {
            content,
            target: None,
            bounds: Rect::new(0.0, 0.0, 0.0, 0.0),
            alpha: 1.0,
            position_mode: PositionMode::default(),
            size_mode: SizeMode::default(),
            keep_within_stage: true,
            touchable: false,
        }
    }

    pub fn with_target(mut self, target: ActorId) -> Self {
        self.target = Some(target);
        self
    }

    pub fn with_position_mode(mut self, mode: PositionMode) -> Self {
        self.position_mode = mode;
        self
    }

    pub fn with_size_mode(mut self, mode: SizeMode) -> Self {
        self.size_mode = mode;
        self
    }

    pub fn with_keep_within_stage(mut self, keep: bool) -> Self {
        self.keep_within_stage = keep;
        self
    }

    pub fn content(&self) -> &C {
        &self.content
    }

    pub fn content_mut(&mut self) -> &mut C {
        &mut self.content
    }

    pub fn into_content(self) -> C {
        self.content
    }

    pub fn target(&self) -> Option<ActorId> {
        self.target
    }

    pub fn set_target(&mut self, target: Option<ActorId>) {
        self.target = target;
    }

    /// Offset (relative mode) or stage position (absolute mode)
    pub fn set_position(&mut self, x: f32, y: f32) {
        self.bounds.x = x;
        self.bounds.y = y;
    }

    /// Size used in `SizeMode::Absolute`
    pub fn set_size(&mut self, width: f32, height: f32) {
        self.bounds.width = width;
        self.bounds.height = height;
    }

    pub fn set_alpha(&mut self, alpha: f32) {
        self.alpha = alpha.clamp(0.0, 1.0);
    }

    pub fn position_mode(&self) -> PositionMode {
        self.position_mode
    }

    pub fn size_mode(&self) -> SizeMode {
        self.size_mode
    }

    pub fn is_kept_within_stage(&self) -> bool {
        self.keep_within_stage
    }

    /// Pins never receive input; events fall through to the actors below
    pub fn is_touchable(&self) -> bool {
        self.touchable
    }

    /// Compute where the content is drawn this frame
    ///
    /// Returns `None` when there is no target or it no longer resolves.
    /// The pin's stored position is not modified.
    pub fn frame(&self, lookup: &impl ActorLookup) -> Option<PinFrame> {
        let target = lookup.bounds(self.target?)?;

        let (width, height) = match self.size_mode {
            SizeMode::Absolute => (self.bounds.width, self.bounds.height),
            SizeMode::Mimic => (target.width, target.height),
        };

        let (x, y) = match self.position_mode {
            PositionMode::Absolute => (self.bounds.x, self.bounds.y),
            PositionMode::Relative => {
                let (mut anchor_x, mut anchor_y) = (target.x, target.y);
                if self.keep_within_stage {
                    let (stage_width, stage_height) = lookup.stage_size();
                    anchor_x = anchor_x.clamp(0.0, (stage_width - target.width).max(0.0));
                    anchor_y = anchor_y.clamp(0.0, (stage_height - target.height).max(0.0));
                }
                (anchor_x + self.bounds.x, anchor_y + self.bounds.y)
            }
        };

        Some(PinFrame {
            bounds: Rect::new(x, y, width, height),
            alpha: self.alpha,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct Stage {
        actors: HashMap<ActorId, Rect>,
        size: (f32, f32),
    }

    impl Stage {
        fn new(width: f32, height: f32) -> Self {
            Self {
                actors: HashMap::new(),
                size: (width, height),
            }
        }

        fn with_actor(mut self, id: u64, bounds: Rect) -> Self {
            self.actors.insert(ActorId(id), bounds);
            self
        }
    }

    impl ActorLookup for Stage {
        fn bounds(&self, actor: ActorId) -> Option<Rect> {
            self.actors.get(&actor).copied()
        }

        fn stage_size(&self) -> (f32, f32) {
            self.size
        }
    }

    #[test]
    fn test_no_target_draws_nothing() {
        let stage = Stage::new(800.0, 600.0);
        let pin = Pin::new("tooltip");

        assert!(pin.frame(&stage).is_none());
        assert!(!pin.is_touchable());
    }

    #[test]
    fn test_removed_target_draws_nothing() {
        let stage = Stage::new(800.0, 600.0);
        let pin = Pin::new("tooltip").with_target(ActorId(7));
        assert!(pin.frame(&stage).is_none());
    }

    #[test]
    fn test_relative_position_follows_target() {
        let mut stage =
            Stage::new(800.0, 600.0).with_actor(1, Rect::new(100.0, 50.0, 40.0, 20.0));
        let mut pin = Pin::new("badge").with_target(ActorId(1));
        pin.set_position(5.0, -3.0);
        pin.set_size(10.0, 10.0);

        let frame = pin.frame(&stage).unwrap();
        assert_eq!(frame.bounds, Rect::new(105.0, 47.0, 10.0, 10.0));

        stage.actors.insert(ActorId(1), Rect::new(300.0, 200.0, 40.0, 20.0));
        let frame = pin.frame(&stage).unwrap();
        assert_eq!(frame.bounds, Rect::new(305.0, 197.0, 10.0, 10.0));
    }

    #[test]
    fn test_keep_within_stage_clamps_anchor() {
        let stage = Stage::new(800.0, 600.0).with_actor(1, Rect::new(790.0, -30.0, 40.0, 20.0));
        let pin = Pin::new(()).with_target(ActorId(1));

        let frame = pin.frame(&stage).unwrap();
        assert_eq!((frame.bounds.x, frame.bounds.y), (760.0, 0.0));

        let pin = pin.with_keep_within_stage(false);
        let frame = pin.frame(&stage).unwrap();
        assert_eq!((frame.bounds.x, frame.bounds.y), (790.0, -30.0));
    }

    #[test]
    fn test_target_larger_than_stage() {
        let stage = Stage::new(100.0, 100.0).with_actor(1, Rect::new(30.0, 40.0, 500.0, 500.0));
        let pin = Pin::new(()).with_target(ActorId(1));

        let frame = pin.frame(&stage).unwrap();
        assert_eq!((frame.bounds.x, frame.bounds.y), (0.0, 0.0));
    }

    #[test]
    fn test_absolute_position_and_mimic_size() {
        let stage = Stage::new(800.0, 600.0).with_actor(1, Rect::new(100.0, 50.0, 40.0, 20.0));
        let mut pin = Pin::new(())
            .with_target(ActorId(1))
            .with_position_mode(PositionMode::Absolute)
            .with_size_mode(SizeMode::Mimic);
        pin.set_position(12.0, 34.0);
        pin.set_size(1.0, 1.0);

        let frame = pin.frame(&stage).unwrap();
        assert_eq!(frame.bounds, Rect::new(12.0, 34.0, 40.0, 20.0));
    }

    #[test]
    fn test_alpha_clamped() {
        let stage = Stage::new(800.0, 600.0).with_actor(1, Rect::new(0.0, 0.0, 1.0, 1.0));
        let mut pin = Pin::new(()).with_target(ActorId(1));
        pin.set_alpha(3.0);

        assert_eq!(pin.frame(&stage).unwrap().alpha, 1.0);
        pin.set_target(None);
        assert!(pin.frame(&stage).is_none());
    }
}
