//! Entity hierarchy backing the rendered scene.

use glam::{Mat4, Vec3};
use hecs::{DynamicBundle, Entity, EntityBuilder, NoSuchEntity, World};

use crate::mesh::Transform;

/// Parent link of a non-root node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Parent(pub Entity);

/// Ordered child list of a node.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Children(pub Vec<Entity>);

/// Marks a node whose size must not inherit its ancestors' scale.
///
/// The node still follows its ancestors' translation, so it stays attached
/// to the same point of the model while keeping a constant on-screen size
/// relative to the world.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FixedSize;

/// Owning handle to the root of a node tree.
///
/// Not `Clone`: the only way to release the tree is to hand the handle back
/// to [`SceneGraph::dispose`], which despawns the root and every descendant.
#[derive(Debug, PartialEq, Eq)]
#[must_use = "a dropped GroupHandle leaks its nodes; pass it to SceneGraph::dispose"]
pub struct GroupHandle {
    root: Entity,
}

impl GroupHandle {
    pub fn entity(&self) -> Entity {
        self.root
    }
}

/// The scene: a `hecs` world plus the set of trees attached for rendering.
///
/// Every node has a [`Transform`] relative to its parent. Trees are built
/// detached, then attached once complete, so a half-built model is never
/// rendered or picked.
#[derive(Default)]
pub struct SceneGraph {
    world: World,
    attached: Vec<Entity>,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn a detached root node.
    pub fn spawn_group(&mut self, transform: Transform) -> GroupHandle {
        let root = self.world.spawn((transform, Children::default()));
        GroupHandle { root }
    }

    /// Spawn a node under `parent`, appended after its existing children.
    pub fn spawn_child(
        &mut self,
        parent: Entity,
        transform: Transform,
        components: impl DynamicBundle,
    ) -> Result<Entity, NoSuchEntity> {
        if !self.world.contains(parent) {
            return Err(NoSuchEntity);
        }

        let mut builder = EntityBuilder::new();
        builder
            .add_bundle(components)
            .add(transform)
            .add(Parent(parent))
            .add(Children::default());
        let child = self.world.spawn(builder.build());

        if let Ok(mut children) = self.world.get::<&mut Children>(parent) {
            children.0.push(child);
        }
        Ok(child)
    }

    /// Make a tree visible to rendering and picking.
    pub fn attach(&mut self, group: &GroupHandle) {
        if !self.attached.contains(&group.root) {
            self.attached.push(group.root);
        }
    }

    pub fn detach(&mut self, group: &GroupHandle) {
        self.attached.retain(|&e| e != group.root);
    }

    pub fn is_attached(&self, group: &GroupHandle) -> bool {
        self.attached.contains(&group.root)
    }

    /// Roots currently attached, in attach order.
    pub fn attached_roots(&self) -> &[Entity] {
        &self.attached
    }

    /// Detach and despawn a tree. Returns the number of nodes released.
    pub fn dispose(&mut self, group: GroupHandle) -> usize {
        self.detach(&group);

        let mut released = 0;
        let mut stack = vec![group.root];
        while let Some(entity) = stack.pop() {
            stack.extend(self.children(entity));
            if self.world.despawn(entity).is_ok() {
                released += 1;
            }
        }
        released
    }

    pub fn contains(&self, entity: Entity) -> bool {
        self.world.contains(entity)
    }

    /// Total number of live nodes.
    pub fn node_count(&self) -> usize {
        self.world.len() as usize
    }

    pub fn children(&self, entity: Entity) -> Vec<Entity> {
        self.world
            .get::<&Children>(entity)
            .map(|c| c.0.clone())
            .unwrap_or_default()
    }

    pub fn child_count(&self, entity: Entity) -> usize {
        self.world
            .get::<&Children>(entity)
            .map(|c| c.0.len())
            .unwrap_or(0)
    }

    pub fn parent(&self, entity: Entity) -> Option<Entity> {
        self.world.get::<&Parent>(entity).ok().map(|p| p.0)
    }

    pub fn local_transform(&self, entity: Entity) -> Option<Transform> {
        self.world.get::<&Transform>(entity).ok().map(|t| *t)
    }

    /// Local-to-world matrix, composing every ancestor's transform.
    pub fn world_matrix(&self, entity: Entity) -> Option<Mat4> {
        let mut matrix = self.local_transform(entity)?.matrix();
        let mut current = entity;
        while let Some(parent) = self.parent(current) {
            matrix = self.local_transform(parent)?.matrix() * matrix;
            current = parent;
        }
        Some(matrix)
    }

    /// World-space position of a node's origin.
    pub fn world_position(&self, entity: Entity) -> Option<Vec3> {
        self.world_matrix(entity).map(|m| m.w_axis.truncate())
    }

    /// Matrix used to draw a node. [`FixedSize`] nodes keep their own
    /// scale and rotation but take only the position from their ancestors.
    pub fn render_matrix(&self, entity: Entity) -> Option<Mat4> {
        if self.world.get::<&FixedSize>(entity).is_ok() {
            let local = self.local_transform(entity)?;
            let position = self.world_position(entity)?;
            Some(Mat4::from_scale_rotation_translation(
                local.scale,
                local.rotation,
                position,
            ))
        } else {
            self.world_matrix(entity)
        }
    }

    /// Whether a node's size ignores inherited scale.
    pub fn is_fixed_size(&self, entity: Entity) -> bool {
        self.world.get::<&FixedSize>(entity).is_ok()
    }

    /// Depth-first walk of every node under the attached roots.
    pub fn visible_nodes(&self) -> Vec<Entity> {
        let mut out = Vec::new();
        let mut stack: Vec<Entity> = self.attached.iter().rev().copied().collect();
        while let Some(entity) = stack.pop() {
            out.push(entity);
            stack.extend(self.children(entity).into_iter().rev());
        }
        out
    }

    pub fn world(&self) -> &World {
        &self.world
    }
}
