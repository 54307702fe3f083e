/// Tests for the backend-agnostic vocabulary

use super::*;

#[test]
fn test_depth_format_classification() {
    assert!(PixelFormat::D32_FLOAT.is_depth());
    assert!(PixelFormat::D24_UNORM_S8_UINT.is_depth());
    assert!(!PixelFormat::R8G8B8A8_UNORM.is_depth());
    assert!(!PixelFormat::B8G8R8A8_SRGB.is_depth());
}

#[test]
fn test_stencil_format_classification() {
    assert!(PixelFormat::D24_UNORM_S8_UINT.has_stencil());
    assert!(PixelFormat::D32_FLOAT_S8_UINT.has_stencil());
    assert!(!PixelFormat::D32_FLOAT.has_stencil());
}

#[test]
fn test_index_type_sizes() {
    assert_eq!(IndexType::U16.size_bytes(), 2);
    assert_eq!(IndexType::U32.size_bytes(), 4);
}

#[test]
fn test_descriptor_slot_indices() {
    assert_eq!(DescriptorSlot::Global.index(), 0);
    assert_eq!(DescriptorSlot::PerPass.index(), 1);
    assert_eq!(DescriptorSlot::PerDraw.index(), 2);
}

#[test]
fn test_buffer_usage_flags_combine() {
    let usage = BufferUsage::STORAGE | BufferUsage::INDIRECT;
    assert!(usage.contains(BufferUsage::STORAGE));
    assert!(usage.contains(BufferUsage::INDIRECT));
    assert!(!usage.contains(BufferUsage::VERTEX));
}

#[test]
fn test_compute_to_compute_barrier_scopes() {
    let scopes = PipelineBarrierKind::ComputeWriteToComputeRead.scopes();
    assert_eq!(scopes.src_stages, StageFlags::COMPUTE_SHADER);
    assert_eq!(scopes.dst_stages, StageFlags::COMPUTE_SHADER);
    assert_eq!(scopes.src_access, AccessFlags::SHADER_WRITE);
    assert_eq!(scopes.dst_access, AccessFlags::SHADER_READ);
}

#[test]
fn test_compute_to_indirect_barrier_scopes() {
    let scopes = PipelineBarrierKind::ComputeWriteToIndirectRead.scopes();
    assert_eq!(scopes.dst_stages, StageFlags::DRAW_INDIRECT);
    assert_eq!(scopes.dst_access, AccessFlags::INDIRECT_COMMAND_READ);
}

#[test]
fn test_transfer_to_vertex_input_covers_index_reads() {
    let scopes = PipelineBarrierKind::TransferWriteToVertexInput.scopes();
    assert!(scopes.dst_access.contains(AccessFlags::VERTEX_ATTRIBUTE_READ));
    assert!(scopes.dst_access.contains(AccessFlags::INDEX_READ));
}

#[test]
fn test_every_barrier_kind_has_nonempty_scopes() {
    let kinds = [
        PipelineBarrierKind::ComputeWriteToComputeRead,
        PipelineBarrierKind::ComputeWriteToIndirectRead,
        PipelineBarrierKind::ComputeWriteToVertexRead,
        PipelineBarrierKind::ComputeWriteToPixelRead,
        PipelineBarrierKind::ComputeWriteToTransferRead,
        PipelineBarrierKind::TransferWriteToComputeRead,
        PipelineBarrierKind::TransferWriteToVertexInput,
    ];
    for kind in kinds {
        let scopes = kind.scopes();
        assert!(!scopes.src_stages.is_empty(), "{:?}", kind);
        assert!(!scopes.dst_stages.is_empty(), "{:?}", kind);
        assert!(!scopes.src_access.is_empty(), "{:?}", kind);
        assert!(!scopes.dst_access.is_empty(), "{:?}", kind);
    }
}

#[test]
fn test_texture_info_is_array() {
    let info = TextureInfo {
        width: 64,
        height: 64,
        format: PixelFormat::R8G8B8A8_UNORM,
        array_layers: 6,
        mip_levels: 1,
    };
    assert!(info.is_array());

    let simple = TextureInfo { array_layers: 1, ..info };
    assert!(!simple.is_array());
}

#[test]
fn test_model_vertex_is_tightly_packed() {
    assert_eq!(std::mem::size_of::<ModelVertex>(), 32);
}

#[test]
fn test_indirect_args_layouts() {
    assert_eq!(std::mem::size_of::<DrawIndirectArgs>(), 16);
    assert_eq!(std::mem::size_of::<DispatchIndirectArgs>(), 12);
}

#[test]
fn test_default_sampler_is_linear_repeat() {
    let desc = SamplerDesc::default();
    assert_eq!(desc.mag_filter, FilterMode::Linear);
    assert_eq!(desc.address_mode, AddressMode::Repeat);
    assert!(desc.compare.is_none());
}
