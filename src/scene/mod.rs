//! Scene storage and the rendering boundary.
//!
//! The scene is a tree of entities in a `hecs` world. Loaded artifacts are
//! built as a detached tree owned by a [`GroupHandle`], attached once the
//! tree is complete, and released in one call to [`SceneGraph::dispose`].
//!
//! ```
//! use vitrine::scene::{SceneGraph, DrawList, Renderer};
//! use vitrine::{Camera, Transform};
//!
//! let mut scene = SceneGraph::new();
//! let group = scene.spawn_group(Transform::new());
//! scene.attach(&group);
//!
//! let mut renderer = DrawList::new();
//! renderer.render(&scene, &Camera::new());
//!
//! assert_eq!(scene.dispose(group), 1);
//! ```

mod graph;
mod render;

pub use graph::{Children, FixedSize, GroupHandle, Parent, SceneGraph};
pub use render::{Color, DrawCommand, DrawList, RenderMesh, Renderer};
