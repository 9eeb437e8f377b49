use super::input::InputSnapshot;
use super::rendering::RenderContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneCommand {
    None,
    Quit,
}

/// Something the loop drives every frame. `update` may move the camera through the
/// context; `render` is called between `begin_frame` and `end_frame`.
pub trait Scene {
    fn load(&mut self, ctx: &mut RenderContext);
    fn update(&mut self, dt: f32, input: &InputSnapshot, ctx: &mut RenderContext) -> SceneCommand;
    fn render(&mut self, ctx: &mut RenderContext);
    fn unload(&mut self);
    fn entity_count(&self) -> usize {
        0
    }
    fn debug_title(&self) -> Option<String> {
        None
    }
}

pub(crate) struct SceneRuntime {
    scene: Box<dyn Scene>,
    is_loaded: bool,
}

impl SceneRuntime {
    pub(crate) fn new(scene: Box<dyn Scene>) -> Self {
        Self {
            scene,
            is_loaded: false,
        }
    }

    pub(crate) fn is_loaded(&self) -> bool {
        self.is_loaded
    }

    pub(crate) fn load(&mut self, ctx: &mut RenderContext) {
        if self.is_loaded {
            return;
        }
        self.scene.load(ctx);
        self.is_loaded = true;
    }

    /// One frame: update, then a full begin/render/end pass.
    pub(crate) fn run_frame(
        &mut self,
        dt: f32,
        input: &InputSnapshot,
        ctx: &mut RenderContext,
    ) -> SceneCommand {
        self.load(ctx);
        let command = self.scene.update(dt, input, ctx);
        ctx.begin_frame(dt);
        self.scene.render(ctx);
        ctx.end_frame();
        command
    }

    pub(crate) fn entity_count(&self) -> usize {
        self.scene.entity_count()
    }

    pub(crate) fn debug_title(&self) -> Option<String> {
        self.scene.debug_title()
    }

    pub(crate) fn shutdown(&mut self) {
        if self.is_loaded {
            self.scene.unload();
            self.is_loaded = false;
        }
    }
}
