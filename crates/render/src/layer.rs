use crate::RenderError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A handle referencing a model asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModelRef(pub u64);

/// A handle referencing a texture asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextureRef(pub u64);

/// A handle referencing a shader asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShaderRef(pub u64);

/// Per-command overlay selector (e.g. hurt flash), packed by the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OverlayTag(pub u32);

/// An immutable bundle of GPU state describing how a geometry batch is
/// drawn. Compared and hashed by value so equal layers share one batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RenderLayer {
    pub texture: TextureRef,
    pub shader: ShaderRef,
    pub translucent: bool,
    pub depth_test: bool,
    pub cull_back_face: bool,
}

impl RenderLayer {
    /// Opaque defaults: depth tested, back faces culled.
    pub fn solid(texture: TextureRef, shader: ShaderRef) -> Self {
        Self {
            texture,
            shader,
            translucent: false,
            depth_test: true,
            cull_back_face: true,
        }
    }

    pub fn translucent(texture: TextureRef, shader: ShaderRef) -> Self {
        Self {
            translucent: true,
            ..Self::solid(texture, shader)
        }
    }
}

/// Vertex accumulation buffer with an explicit build bracket.
///
/// `begin`/`end` make the build window explicit so interleaved builds are
/// caught as contract violations instead of producing silently mixed
/// geometry.
#[derive(Debug, Default)]
pub struct GeometryBuffer {
    vertices: Vec<[f32; 3]>,
    building: bool,
}

impl GeometryBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open the build window. Fails if a build is already open.
    pub fn begin(&mut self) -> Result<(), RenderError> {
        if self.building {
            return Err(RenderError::BufferAlreadyBuilding);
        }
        self.building = true;
        Ok(())
    }

    /// Append one vertex. Fails outside a build window.
    pub fn vertex(&mut self, position: [f32; 3]) -> Result<(), RenderError> {
        if !self.building {
            return Err(RenderError::BufferNotBuilding);
        }
        self.vertices.push(position);
        Ok(())
    }

    /// Close the build window. Fails if none is open.
    pub fn end(&mut self) -> Result<(), RenderError> {
        if !self.building {
            return Err(RenderError::BufferNotBuilding);
        }
        self.building = false;
        Ok(())
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn vertices(&self) -> &[[f32; 3]] {
        &self.vertices
    }

    /// Drop accumulated geometry, keeping the allocation.
    pub fn clear(&mut self) {
        self.vertices.clear();
    }
}

/// Per-layer geometry accumulation, keyed by value-equal [`RenderLayer`].
/// This is the geometry sink handed to the GPU submission collaborator.
#[derive(Debug, Default)]
pub struct LayerBatches {
    batches: HashMap<RenderLayer, GeometryBuffer>,
}

impl LayerBatches {
    pub fn new() -> Self {
        Self::default()
    }

    /// The buffer accumulating geometry for `layer`, created on first use.
    pub fn sink(&mut self, layer: RenderLayer) -> &mut GeometryBuffer {
        self.batches.entry(layer).or_default()
    }

    pub fn get(&self, layer: &RenderLayer) -> Option<&GeometryBuffer> {
        self.batches.get(layer)
    }

    pub fn layer_count(&self) -> usize {
        self.batches.len()
    }

    /// Iterate batches for submission.
    pub fn iter(&self) -> impl Iterator<Item = (&RenderLayer, &GeometryBuffer)> {
        self.batches.iter()
    }

    /// Clear every batch's geometry, keeping layers and allocations for the
    /// next frame.
    pub fn clear(&mut self) {
        for buffer in self.batches.values_mut() {
            buffer.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layer(texture: u64) -> RenderLayer {
        RenderLayer::solid(TextureRef(texture), ShaderRef(1))
    }

    #[test]
    fn layers_compare_by_value() {
        assert_eq!(layer(1), layer(1));
        assert_ne!(layer(1), layer(2));
        assert_ne!(layer(1), RenderLayer::translucent(TextureRef(1), ShaderRef(1)));
    }

    #[test]
    fn equal_layers_share_one_batch() {
        let mut batches = LayerBatches::new();
        batches.sink(layer(1)).begin().unwrap();
        batches.sink(layer(1)).vertex([0.0, 0.0, 0.0]).unwrap();
        batches.sink(layer(1)).end().unwrap();
        batches.sink(layer(2));
        assert_eq!(batches.layer_count(), 2);
        assert_eq!(batches.get(&layer(1)).unwrap().vertex_count(), 1);
    }

    #[test]
    fn double_begin_is_a_contract_violation() {
        let mut buffer = GeometryBuffer::new();
        buffer.begin().unwrap();
        assert!(matches!(
            buffer.begin(),
            Err(RenderError::BufferAlreadyBuilding)
        ));
    }

    #[test]
    fn vertex_and_end_require_open_build() {
        let mut buffer = GeometryBuffer::new();
        assert!(matches!(
            buffer.vertex([0.0; 3]),
            Err(RenderError::BufferNotBuilding)
        ));
        assert!(matches!(buffer.end(), Err(RenderError::BufferNotBuilding)));
    }

    #[test]
    fn build_cycle_accumulates_vertices() {
        let mut buffer = GeometryBuffer::new();
        buffer.begin().unwrap();
        buffer.vertex([0.0, 0.0, 0.0]).unwrap();
        buffer.vertex([1.0, 0.0, 0.0]).unwrap();
        buffer.end().unwrap();
        assert_eq!(buffer.vertex_count(), 2);

        // A new build appends; clear resets.
        buffer.begin().unwrap();
        buffer.vertex([2.0, 0.0, 0.0]).unwrap();
        buffer.end().unwrap();
        assert_eq!(buffer.vertex_count(), 3);
        buffer.clear();
        assert_eq!(buffer.vertex_count(), 0);
    }

    #[test]
    fn clear_keeps_layers() {
        let mut batches = LayerBatches::new();
        let sink = batches.sink(layer(1));
        sink.begin().unwrap();
        sink.vertex([0.0; 3]).unwrap();
        sink.end().unwrap();

        batches.clear();
        assert_eq!(batches.layer_count(), 1);
        assert_eq!(batches.get(&layer(1)).unwrap().vertex_count(), 0);
    }
}
