//! Recorded commands
//!
//! `Command` is the closed set of operations a command list can record.
//! Payloads are backend-agnostic plain data (resource IDs, closed enums,
//! literal counts); nothing here touches the backend until dispatch.
//!
//! `Command::dispatch` is the visitor that translates exactly one command
//! kind into exactly one backend call, resolving IDs into backend objects
//! on the way. That keeps the recorded data free of pointers and lets any
//! backend replay the same stream.

use crate::backend::types::{
    DescriptorLifetime, DescriptorSlot, IndexType, PipelineBarrierKind, Rect2D, Viewport,
};
use crate::descriptor_set::Descriptor;
use crate::error::{Error, Result};
use crate::handle::{BufferId, ComputePipelineId, GraphicsPipelineId};
use crate::pipeline::cache::resolve_attachments;
use crate::pipeline::{attach_resources, resolve_descriptor_set};

use super::ExecuteContext;

/// A graphics or compute pipeline reference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineHandle {
    Graphics(GraphicsPipelineId),
    Compute(ComputePipelineId),
}

impl From<GraphicsPipelineId> for PipelineHandle {
    fn from(id: GraphicsPipelineId) -> Self {
        PipelineHandle::Graphics(id)
    }
}

impl From<ComputePipelineId> for PipelineHandle {
    fn from(id: ComputePipelineId) -> Self {
        PipelineHandle::Compute(id)
    }
}

/// One recorded operation
///
/// Immutable once recorded, exclusively owned by its command list, and
/// alive for one frame.
#[derive(Debug, Clone)]
pub enum Command {
    PushMarker {
        label: String,
    },
    PopMarker,
    BeginPipeline {
        pipeline: PipelineHandle,
    },
    EndPipeline,
    BindDescriptorSet {
        slot: DescriptorSlot,
        /// Snapshot of the set's bindings at record time
        descriptors: Vec<Descriptor>,
        lifetime: DescriptorLifetime,
        frame_index: usize,
    },
    BindVertexBuffer {
        buffer: BufferId,
        offset: u64,
    },
    BindIndexBuffer {
        buffer: BufferId,
        offset: u64,
        index_type: IndexType,
    },
    PushConstants {
        offset: u32,
        data: Vec<u8>,
    },
    SetViewport {
        viewport: Viewport,
    },
    SetScissor {
        scissor: Rect2D,
    },
    Draw {
        vertex_count: u32,
        instance_count: u32,
        first_vertex: u32,
        first_instance: u32,
    },
    DrawBindless {
        vertex_count: u32,
        instance_count: u32,
        first_vertex: u32,
        first_instance: u32,
    },
    DrawIndexed {
        index_count: u32,
        instance_count: u32,
        first_index: u32,
        vertex_offset: i32,
        first_instance: u32,
    },
    DrawIndirect {
        buffer: BufferId,
        offset: u64,
        draw_count: u32,
        stride: u32,
    },
    DrawIndirectCount {
        buffer: BufferId,
        offset: u64,
        count_buffer: BufferId,
        count_offset: u64,
        max_draw_count: u32,
        stride: u32,
    },
    Dispatch {
        group_count: [u32; 3],
    },
    DispatchIndirect {
        buffer: BufferId,
        offset: u64,
    },
    CopyBuffer {
        src: BufferId,
        dst: BufferId,
        src_offset: u64,
        dst_offset: u64,
        size: u64,
    },
    PipelineBarrier {
        barrier: PipelineBarrierKind,
        buffer: BufferId,
    },
}

impl Command {
    /// Translate this command into its backend call
    pub(crate) fn dispatch(&self, ctx: &mut ExecuteContext<'_>) -> Result<()> {
        match self {
            Command::PushMarker { label } => {
                ctx.backend.cmd_push_marker(label);
                Ok(())
            }
            Command::PopMarker => {
                ctx.backend.cmd_pop_marker();
                Ok(())
            }
            Command::BeginPipeline { pipeline } => {
                match *pipeline {
                    PipelineHandle::Graphics(id) => {
                        let desc = ctx.pipelines.graphics_desc(id)?;
                        let attachments = resolve_attachments(ctx.resources, desc)?;
                        let gpu = ctx.pipelines.graphics_pipeline(id)?;
                        ctx.backend.cmd_begin_pipeline(gpu, Some(&attachments))?;
                    }
                    PipelineHandle::Compute(id) => {
                        let gpu = ctx.pipelines.compute_pipeline(id)?;
                        ctx.backend.cmd_begin_pipeline(gpu, None)?;
                    }
                }
                ctx.current_pipeline = Some(*pipeline);
                Ok(())
            }
            Command::EndPipeline => {
                ctx.backend.cmd_end_pipeline()?;
                ctx.current_pipeline = None;
                Ok(())
            }
            Command::BindDescriptorSet {
                slot,
                descriptors,
                lifetime,
                frame_index,
            } => {
                let pipeline = ctx.current_pipeline.ok_or_else(|| {
                    Error::InvalidOperation(
                        "descriptor set bound outside a pipeline scope".to_string(),
                    )
                })?;
                let (gpu, reflection) = match pipeline {
                    PipelineHandle::Graphics(id) => (
                        ctx.pipelines.graphics_pipeline(id)?,
                        ctx.pipelines.graphics_reflection(id)?,
                    ),
                    PipelineHandle::Compute(id) => (
                        ctx.pipelines.compute_pipeline(id)?,
                        ctx.pipelines.compute_reflection(id)?,
                    ),
                };
                let resolved = resolve_descriptor_set(*slot, descriptors, reflection)?;
                let attached = attach_resources(&resolved, ctx.resources)?;
                ctx.backend.cmd_bind_descriptor_set(
                    gpu,
                    *slot,
                    &attached,
                    *lifetime,
                    *frame_index,
                )
            }
            Command::BindVertexBuffer { buffer, offset } => {
                let gpu = ctx.resources.buffers.get(*buffer)?;
                ctx.backend.cmd_bind_vertex_buffer(gpu, *offset)
            }
            Command::BindIndexBuffer {
                buffer,
                offset,
                index_type,
            } => {
                let gpu = ctx.resources.buffers.get(*buffer)?;
                ctx.backend.cmd_bind_index_buffer(gpu, *offset, *index_type)
            }
            Command::PushConstants { offset, data } => {
                let pipeline = ctx.current_pipeline.ok_or_else(|| {
                    Error::InvalidOperation(
                        "push constants outside a pipeline scope".to_string(),
                    )
                })?;
                let gpu = match pipeline {
                    PipelineHandle::Graphics(id) => ctx.pipelines.graphics_pipeline(id)?,
                    PipelineHandle::Compute(id) => ctx.pipelines.compute_pipeline(id)?,
                };
                ctx.backend.cmd_push_constants(gpu, *offset, data)
            }
            Command::SetViewport { viewport } => ctx.backend.cmd_set_viewport(*viewport),
            Command::SetScissor { scissor } => ctx.backend.cmd_set_scissor(*scissor),
            Command::Draw {
                vertex_count,
                instance_count,
                first_vertex,
                first_instance,
            } => {
                ctx.stats.draw_calls += 1;
                ctx.backend
                    .cmd_draw(*vertex_count, *instance_count, *first_vertex, *first_instance)
            }
            Command::DrawBindless {
                vertex_count,
                instance_count,
                first_vertex,
                first_instance,
            } => {
                ctx.stats.draw_calls += 1;
                ctx.backend.cmd_draw_bindless(
                    *vertex_count,
                    *instance_count,
                    *first_vertex,
                    *first_instance,
                )
            }
            Command::DrawIndexed {
                index_count,
                instance_count,
                first_index,
                vertex_offset,
                first_instance,
            } => {
                ctx.stats.draw_calls += 1;
                ctx.backend.cmd_draw_indexed(
                    *index_count,
                    *instance_count,
                    *first_index,
                    *vertex_offset,
                    *first_instance,
                )
            }
            Command::DrawIndirect {
                buffer,
                offset,
                draw_count,
                stride,
            } => {
                ctx.stats.draw_calls += 1;
                let gpu = ctx.resources.buffers.get(*buffer)?;
                ctx.backend
                    .cmd_draw_indirect(gpu, *offset, *draw_count, *stride)
            }
            Command::DrawIndirectCount {
                buffer,
                offset,
                count_buffer,
                count_offset,
                max_draw_count,
                stride,
            } => {
                ctx.stats.draw_calls += 1;
                let gpu = ctx.resources.buffers.get(*buffer)?;
                let count_gpu = ctx.resources.buffers.get(*count_buffer)?;
                ctx.backend.cmd_draw_indirect_count(
                    gpu,
                    *offset,
                    count_gpu,
                    *count_offset,
                    *max_draw_count,
                    *stride,
                )
            }
            Command::Dispatch { group_count } => {
                ctx.stats.dispatches += 1;
                ctx.backend.cmd_dispatch(*group_count)
            }
            Command::DispatchIndirect { buffer, offset } => {
                ctx.stats.dispatches += 1;
                let gpu = ctx.resources.buffers.get(*buffer)?;
                ctx.backend.cmd_dispatch_indirect(gpu, *offset)
            }
            Command::CopyBuffer {
                src,
                dst,
                src_offset,
                dst_offset,
                size,
            } => {
                let src_gpu = ctx.resources.buffers.get(*src)?;
                let dst_gpu = ctx.resources.buffers.get(*dst)?;
                ctx.backend
                    .cmd_copy_buffer(src_gpu, dst_gpu, *src_offset, *dst_offset, *size)
            }
            Command::PipelineBarrier { barrier, buffer } => {
                let gpu = ctx.resources.buffers.get(*buffer)?;
                ctx.backend.cmd_pipeline_barrier(*barrier, gpu)
            }
        }
    }
}
