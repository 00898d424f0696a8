//! # Resource Boundary
//!
//! The pipeline never inspects resource internals: meshes, materials,
//! textures, programs and framebuffers are opaque numeric ids resolved by
//! an external resource manager behind [`ResourceProvider`].
//!
//! [`StaticResources`] is a table-backed implementation for tests and
//! headless runs.

use std::collections::HashMap;

/// Built-in uniforms the pipeline binds by semantic, resolved to concrete
/// locations per program by the resource manager.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BuiltinUniform {
    /// Per-mesh model matrix.
    Model,
    /// Per-camera view matrix.
    View,
    /// Per-camera projection matrix.
    Projection,
    /// Directional light direction.
    LightDirection,
    /// Directional light diffuse term.
    LightDiffuse,
    /// Directional light specular term.
    LightSpecular,
}

impl BuiltinUniform {
    /// Stable fallback location for providers without explicit tables.
    #[must_use]
    pub const fn default_location(self) -> i32 {
        match self {
            Self::Model => 0,
            Self::View => 1,
            Self::Projection => 2,
            Self::LightDirection => 3,
            Self::LightDiffuse => 4,
            Self::LightSpecular => 5,
        }
    }
}

/// A texture a material wants bound before its draws.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TextureBinding {
    /// Opaque texture id.
    pub texture: u32,
    /// Texture unit index.
    pub unit: u32,
    /// Sampler uniform location.
    pub location: i32,
}

/// Resolves opaque resource ids to the metadata the pipeline needs.
///
/// The only contract with the external resource manager; the pipeline
/// never looks past these answers.
pub trait ResourceProvider {
    /// The shader program a material renders with.
    fn program_for_material(&self, material: u32) -> u32;

    /// The location of a built-in uniform in a program.
    ///
    /// A location of `-1` means the program does not use the uniform;
    /// the pipeline still emits the bind and the backend ignores it.
    fn uniform_location(&self, program: u32, uniform: BuiltinUniform) -> i32;

    /// Number of indices in a mesh.
    fn mesh_index_count(&self, mesh: u32) -> u32;

    /// The textures a material wants bound.
    fn texture_bindings(&self, material: u32) -> &[TextureBinding];
}

/// Table-backed resource provider for tests and headless runs.
///
/// Lookups that were never registered fall back to deterministic
/// defaults: a material's program is its own id, uniform locations come
/// from [`BuiltinUniform::default_location`], meshes report
/// `default_index_count` indices and no textures.
#[derive(Default)]
pub struct StaticResources {
    programs: HashMap<u32, u32>,
    locations: HashMap<(u32, BuiltinUniform), i32>,
    index_counts: HashMap<u32, u32>,
    bindings: HashMap<u32, Vec<TextureBinding>>,
    no_bindings: Vec<TextureBinding>,
    default_index_count: u32,
}

impl StaticResources {
    /// Default index count reported for unregistered meshes (two
    /// triangles, e.g. a fullscreen quad).
    pub const DEFAULT_INDEX_COUNT: u32 = 6;

    /// Creates an empty provider with default fallbacks.
    #[must_use]
    pub fn new() -> Self {
        Self {
            default_index_count: Self::DEFAULT_INDEX_COUNT,
            ..Self::default()
        }
    }

    /// Registers a material's program.
    pub fn set_program(&mut self, material: u32, program: u32) -> &mut Self {
        self.programs.insert(material, program);
        self
    }

    /// Registers a uniform location for a program.
    pub fn set_location(&mut self, program: u32, uniform: BuiltinUniform, location: i32) -> &mut Self {
        self.locations.insert((program, uniform), location);
        self
    }

    /// Registers a mesh's index count.
    pub fn set_index_count(&mut self, mesh: u32, count: u32) -> &mut Self {
        self.index_counts.insert(mesh, count);
        self
    }

    /// Registers a material's texture bindings.
    pub fn set_textures(&mut self, material: u32, textures: Vec<TextureBinding>) -> &mut Self {
        self.bindings.insert(material, textures);
        self
    }
}

impl ResourceProvider for StaticResources {
    fn program_for_material(&self, material: u32) -> u32 {
        self.programs.get(&material).copied().unwrap_or(material)
    }

    fn uniform_location(&self, program: u32, uniform: BuiltinUniform) -> i32 {
        self.locations
            .get(&(program, uniform))
            .copied()
            .unwrap_or_else(|| uniform.default_location())
    }

    fn mesh_index_count(&self, mesh: u32) -> u32 {
        self.index_counts
            .get(&mesh)
            .copied()
            .unwrap_or(self.default_index_count)
    }

    fn texture_bindings(&self, material: u32) -> &[TextureBinding] {
        self.bindings
            .get(&material)
            .map_or(&self.no_bindings, Vec::as_slice)
    }
}
