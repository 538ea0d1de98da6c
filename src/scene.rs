use std::collections::HashSet;

use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::render::SceneLighting;

/// Failure while interpreting a glTF document.
#[derive(Debug, Error)]
pub enum SceneError {
    #[error("scene is not valid glTF JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("glTF asset version {0} is not supported (expected 2.x)")]
    UnsupportedVersion(String),
    #[error("scene references node {0}, but the document defines {1} nodes")]
    NodeOutOfRange(usize, usize),
}

/// Flattened runtime representation of the glTF default scene.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Scene {
    pub name: Option<String>,
    pub objects: Vec<SceneObject>,
    /// Number of mesh definitions in the source document.
    pub mesh_count: usize,
}

/// One node of the default scene with its composed world transform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneObject {
    pub name: String,
    /// Index into the document's mesh array, when the node carries geometry.
    pub mesh: Option<usize>,
    pub transform: Mat4,
}

impl SceneObject {
    pub fn is_mesh_instance(&self) -> bool {
        self.mesh.is_some()
    }

    /// World-space translation component of the node transform.
    pub fn translation(&self) -> Vec3 {
        self.transform.w_axis.truncate()
    }
}

impl Scene {
    /// Parses a glTF 2.0 JSON document into the flat object list.
    ///
    /// Only the scene graph is interpreted here; buffers, images and
    /// materials stay with the host asset pipeline.
    pub fn from_gltf_json(json: &str) -> Result<Self, SceneError> {
        let document: GltfDocument = serde_json::from_str(json)?;
        if !is_supported_version(&document.asset.version) {
            return Err(SceneError::UnsupportedVersion(document.asset.version));
        }

        let selected = document.scene.unwrap_or(0);
        let Some(scene) = document.scenes.get(selected) else {
            // A document with no scenes is legal glTF; nothing to show.
            return Ok(Self {
                name: None,
                objects: Vec::new(),
                mesh_count: document.meshes.len(),
            });
        };

        let mut objects = Vec::new();
        let mut visited = HashSet::new();
        for &root in &scene.nodes {
            flatten_node(&document, root, Mat4::IDENTITY, &mut visited, &mut objects)?;
        }

        Ok(Self {
            name: scene.name.clone(),
            objects,
            mesh_count: document.meshes.len(),
        })
    }

    /// Loads and parses a `.gltf` file from disk.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn from_file<P: AsRef<std::path::Path>>(path: P) -> anyhow::Result<Self> {
        use anyhow::Context;
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("unable to read {}", path.display()))?;
        let scene = Self::from_gltf_json(&json)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        Ok(scene)
    }

    pub fn mesh_instances(&self) -> usize {
        self.objects.iter().filter(|o| o.is_mesh_instance()).count()
    }
}

/// Fixed lighting of the viewer: a soft ambient term plus one white
/// directional light placed at (100, 100, -100) aimed at the origin.
pub fn default_lighting() -> SceneLighting {
    SceneLighting {
        ambient: Vec3::splat(170.0 / 255.0),
        sun_direction: Vec3::new(100.0, 100.0, -100.0).normalize(),
        sun_color: Vec3::ONE,
    }
}

fn is_supported_version(version: &str) -> bool {
    version == "2" || version.starts_with("2.")
}

fn flatten_node(
    document: &GltfDocument,
    index: usize,
    parent: Mat4,
    visited: &mut HashSet<usize>,
    out: &mut Vec<SceneObject>,
) -> Result<(), SceneError> {
    let Some(node) = document.nodes.get(index) else {
        return Err(SceneError::NodeOutOfRange(index, document.nodes.len()));
    };
    // glTF forbids cycles; guard anyway so malformed input cannot recurse
    // forever.
    if !visited.insert(index) {
        return Ok(());
    }

    let world = parent * node.local_transform();
    let name = node
        .name
        .clone()
        .unwrap_or_else(|| format!("node-{index}"));
    out.push(SceneObject {
        name,
        mesh: node.mesh,
        transform: world,
    });

    for &child in &node.children {
        flatten_node(document, child, world, visited, out)?;
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
struct GltfDocument {
    asset: GltfAsset,
    #[serde(default)]
    scene: Option<usize>,
    #[serde(default)]
    scenes: Vec<GltfScene>,
    #[serde(default)]
    nodes: Vec<GltfNode>,
    #[serde(default)]
    meshes: Vec<GltfMesh>,
}

#[derive(Debug, Deserialize)]
struct GltfAsset {
    version: String,
}

#[derive(Debug, Deserialize)]
struct GltfScene {
    name: Option<String>,
    #[serde(default)]
    nodes: Vec<usize>,
}

#[derive(Debug, Deserialize)]
struct GltfNode {
    name: Option<String>,
    mesh: Option<usize>,
    #[serde(default)]
    children: Vec<usize>,
    matrix: Option<[f32; 16]>,
    translation: Option<[f32; 3]>,
    rotation: Option<[f32; 4]>,
    scale: Option<[f32; 3]>,
}

#[derive(Debug, Deserialize)]
struct GltfMesh {
    #[allow(dead_code)]
    name: Option<String>,
}

impl GltfNode {
    /// Local transform per the glTF node rules: an explicit column-major
    /// matrix wins over the TRS fields.
    fn local_transform(&self) -> Mat4 {
        if let Some(matrix) = self.matrix {
            return Mat4::from_cols_array(&matrix);
        }
        let translation = self.translation.map(Vec3::from).unwrap_or(Vec3::ZERO);
        let rotation = self
            .rotation
            .map(|[x, y, z, w]| Quat::from_xyzw(x, y, z, w))
            .unwrap_or(Quat::IDENTITY);
        let scale = self.scale.map(Vec3::from).unwrap_or(Vec3::ONE);
        Mat4::from_scale_rotation_translation(scale, rotation, translation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "asset": {"version": "2.0"},
        "scene": 0,
        "scenes": [{"name": "Panorama", "nodes": [0]}],
        "nodes": [
            {"name": "rig", "translation": [0, 10, 0], "children": [1, 2]},
            {"name": "Box", "mesh": 0, "translation": [5, 0, 0]},
            {"translation": [0, 0, -3]}
        ],
        "meshes": [{"name": "BoxMesh"}]
    }"#;

    #[test]
    fn parse_flattens_nodes_with_world_transforms() {
        let scene = Scene::from_gltf_json(SAMPLE).unwrap();
        assert_eq!(scene.name.as_deref(), Some("Panorama"));
        assert_eq!(scene.objects.len(), 3);
        assert_eq!(scene.mesh_count, 1);
        assert_eq!(scene.mesh_instances(), 1);

        let rig = &scene.objects[0];
        assert_eq!(rig.name, "rig");
        assert!(!rig.is_mesh_instance());

        let cube = &scene.objects[1];
        assert_eq!(cube.name, "Box");
        assert_eq!(cube.mesh, Some(0));
        // Parent translation composes into the child.
        assert_eq!(cube.translation(), Vec3::new(5.0, 10.0, 0.0));
    }

    #[test]
    fn unnamed_nodes_get_positional_fallbacks() {
        let scene = Scene::from_gltf_json(SAMPLE).unwrap();
        assert_eq!(scene.objects[2].name, "node-2");
    }

    #[test]
    fn node_matrix_wins_over_trs() {
        let json = r#"{
            "asset": {"version": "2.0"},
            "scenes": [{"nodes": [0]}],
            "nodes": [{
                "name": "m",
                "matrix": [1,0,0,0, 0,1,0,0, 0,0,1,0, 7,8,9,1],
                "translation": [100, 100, 100]
            }]
        }"#;
        let scene = Scene::from_gltf_json(json).unwrap();
        assert_eq!(scene.objects[0].translation(), Vec3::new(7.0, 8.0, 9.0));
    }

    #[test]
    fn version_one_is_rejected() {
        let json = r#"{"asset": {"version": "1.0"}, "scenes": [], "nodes": []}"#;
        assert!(matches!(
            Scene::from_gltf_json(json),
            Err(SceneError::UnsupportedVersion(_))
        ));
    }

    #[test]
    fn malformed_json_is_a_typed_error() {
        assert!(matches!(
            Scene::from_gltf_json("{not json"),
            Err(SceneError::Json(_))
        ));
    }

    #[test]
    fn dangling_node_reference_is_rejected() {
        let json = r#"{
            "asset": {"version": "2.0"},
            "scenes": [{"nodes": [4]}],
            "nodes": [{"name": "only"}]
        }"#;
        assert!(matches!(
            Scene::from_gltf_json(json),
            Err(SceneError::NodeOutOfRange(4, 1))
        ));
    }

    #[test]
    fn document_without_scenes_is_empty() {
        let json = r#"{"asset": {"version": "2.0"}}"#;
        let scene = Scene::from_gltf_json(json).unwrap();
        assert!(scene.objects.is_empty());
    }

    #[test]
    fn lighting_matches_the_viewer_defaults() {
        let lighting = default_lighting();
        assert!((lighting.ambient.x - 170.0 / 255.0).abs() < f32::EPSILON);
        assert!((lighting.sun_direction.length() - 1.0).abs() < 1e-6);
        assert!(lighting.sun_direction.x > 0.0 && lighting.sun_direction.z < 0.0);
    }
}
