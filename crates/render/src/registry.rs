use crate::command::RenderQueue;
use crate::pose::PoseStack;
use crate::RenderError;
use cadence_common::TypeKey;
use cadence_extract::EntitySnapshot;
use std::collections::HashMap;

/// Everything a renderer needs to draw one entity: a pose stack positioned
/// at the entity's interpolated transform and the queue to submit into.
pub struct RenderContext<'a> {
    pub pose: &'a mut PoseStack,
    pub queue: &'a RenderQueue,
}

/// Draws entities of one type. Implementations sample animation state,
/// compose bone poses on the stack, and submit value-copied commands.
///
/// A `MissingModel` (or other resource) error means this entity is skipped
/// for the frame; it is not fatal.
pub trait EntityRenderer: Send {
    fn render(
        &mut self,
        snapshot: &EntitySnapshot,
        ctx: &mut RenderContext<'_>,
    ) -> Result<(), RenderError>;
}

type RendererFactory = Box<dyn Fn() -> Box<dyn EntityRenderer> + Send>;

/// Type-key-to-factory table for renderer selection.
///
/// Factories are bound once at registration; lookup is a plain map access
/// with no runtime reflection. Instances are created lazily on first use and
/// cached per type key, so per-renderer state (animation controllers and the
/// like) persists across frames.
#[derive(Default)]
pub struct RendererRegistry {
    factories: HashMap<TypeKey, RendererFactory>,
    instances: HashMap<TypeKey, Box<dyn EntityRenderer>>,
}

impl RendererRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a factory for `key`. Re-registering replaces the factory and
    /// drops any cached instance.
    pub fn register(
        &mut self,
        key: TypeKey,
        factory: impl Fn() -> Box<dyn EntityRenderer> + Send + 'static,
    ) {
        self.instances.remove(&key);
        self.factories.insert(key, Box::new(factory));
    }

    pub fn is_registered(&self, key: &TypeKey) -> bool {
        self.factories.contains_key(key)
    }

    /// The cached renderer for `key`, instantiating it on first use.
    /// `None` when no factory is registered for the key.
    pub fn renderer_mut(&mut self, key: &TypeKey) -> Option<&mut dyn EntityRenderer> {
        if !self.instances.contains_key(key) {
            let factory = self.factories.get(key)?;
            self.instances.insert(key.clone(), factory());
        }
        // A closure-based map cannot unsize the boxed renderer here; the
        // explicit match lets the trait-object coercion borrow-check.
        match self.instances.get_mut(key) {
            Some(renderer) => Some(renderer.as_mut()),
            None => None,
        }
    }

    /// Render one snapshot, resolving the renderer by the snapshot's type
    /// key. Unknown keys are reported as [`RenderError::UnknownTypeKey`].
    pub fn render(
        &mut self,
        snapshot: &EntitySnapshot,
        ctx: &mut RenderContext<'_>,
    ) -> Result<(), RenderError> {
        let renderer = self
            .renderer_mut(&snapshot.type_key)
            .ok_or_else(|| RenderError::UnknownTypeKey(snapshot.type_key.0.clone()))?;
        renderer.render(snapshot, ctx)
    }
}
