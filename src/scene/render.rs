//! The rendering boundary: what a frame draws, and a headless collector.

use std::sync::Arc;

use glam::Mat4;
use hecs::Entity;

use super::graph::SceneGraph;
use crate::camera::Camera;
use crate::geometry::RawGeometry;

/// RGBA color. Alpha below 1.0 marks a translucent material.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const fn with_alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }

    pub fn is_translucent(&self) -> bool {
        self.a < 1.0
    }

    pub const WHITE: Color = Color::rgba(1.0, 1.0, 1.0, 1.0);
    pub const RED: Color = Color::rgba(1.0, 0.0, 0.0, 1.0);
    /// Viewport clear color.
    pub const BACKGROUND: Color = Color::rgba(0.94, 0.94, 0.94, 1.0);
}

/// Drawable geometry attached to a scene node.
///
/// Geometry is shared through `Arc`; it is released once the last node
/// referring to it is despawned.
#[derive(Clone, Debug)]
pub struct RenderMesh {
    pub geometry: Arc<RawGeometry>,
    pub color: Color,
}

impl RenderMesh {
    pub fn new(geometry: Arc<RawGeometry>, color: Color) -> Self {
        Self { geometry, color }
    }
}

/// Something that can draw the attached part of a [`SceneGraph`].
pub trait Renderer {
    fn render(&mut self, scene: &SceneGraph, camera: &Camera);
}

/// One mesh instance drawn in a frame.
#[derive(Clone, Debug)]
pub struct DrawCommand {
    pub entity: Entity,
    pub model: Mat4,
    pub color: Color,
    pub triangles: usize,
}

/// Headless renderer that records the draw list of the latest frame.
#[derive(Debug, Default)]
pub struct DrawList {
    pub clear_color: Option<Color>,
    pub commands: Vec<DrawCommand>,
    pub view_projection: Mat4,
    pub frames: u64,
}

impl DrawList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn triangle_count(&self) -> usize {
        self.commands.iter().map(|c| c.triangles).sum()
    }

    /// Opaque draws come first, translucent ones after, like a forward pass.
    fn sort(&mut self) {
        self.commands.sort_by_key(|c| c.color.is_translucent());
    }
}

impl Renderer for DrawList {
    fn render(&mut self, scene: &SceneGraph, camera: &Camera) {
        self.commands.clear();
        self.clear_color = Some(Color::BACKGROUND);
        self.view_projection = camera.view_projection();

        for entity in scene.visible_nodes() {
            let Ok(mesh) = scene.world().get::<&RenderMesh>(entity) else {
                continue;
            };
            let Some(model) = scene.render_matrix(entity) else {
                continue;
            };
            self.commands.push(DrawCommand {
                entity,
                model,
                color: mesh.color,
                triangles: mesh.geometry.triangle_count(),
            });
        }

        self.sort();
        self.frames += 1;
    }
}
