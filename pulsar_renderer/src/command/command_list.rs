//! Command list
//!
//! Accepts a strictly ordered sequence of draw/state/copy/barrier/marker
//! operations from arbitrary call sites during one frame, without touching
//! the backend, then replays them exactly once in recorded order through
//! the dispatch visitor.
//!
//! Recording is single-threaded per list. Lists are pool-allocated by
//! `CommandListId` so per-pass recording into separate lists, merged in
//! graph order, stays an incremental change.
//! TODO: parallel per-pass recording needs per-list arenas merged in graph
//! order before replay.

use slotmap::SlotMap;

use crate::backend::types::{
    DescriptorLifetime, DescriptorSlot, IndexType, PipelineBarrierKind, Rect2D, Viewport,
};
use crate::descriptor_set::DescriptorSet;
use crate::engine_error;
use crate::error::{Error, Result};
use crate::handle::{BufferId, CommandListId};
use crate::resources::Model;

use super::command::{Command, PipelineHandle};
use super::ExecuteContext;

/// Deferred, replayable sequence of rendering/compute operations
#[derive(Debug, Default)]
pub struct CommandList {
    name: String,
    commands: Vec<Command>,
    /// Currently open marker scopes
    marker_depth: u32,
    /// Whether a pipeline scope is open
    pipeline_open: bool,
}

impl CommandList {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            commands: Vec::new(),
            marker_depth: 0,
            pipeline_open: false,
        }
    }

    /// Name this list was created with
    pub fn name(&self) -> &str {
        &self.name
    }

    // ===== Markers =====

    /// Open a debug marker scope
    pub fn push_marker(&mut self, label: &str) {
        self.marker_depth += 1;
        self.commands.push(Command::PushMarker {
            label: label.to_string(),
        });
    }

    /// Close the innermost marker scope
    ///
    /// Popping with no open scope is fatal.
    pub fn pop_marker(&mut self) -> Result<()> {
        if self.marker_depth == 0 {
            engine_error!(
                "pulsar::CommandList",
                "'{}': pop_marker with no open marker scope",
                self.name
            );
            return Err(Error::InvalidOperation(format!(
                "'{}': pop_marker with no open marker scope",
                self.name
            )));
        }
        self.marker_depth -= 1;
        self.commands.push(Command::PopMarker);
        Ok(())
    }

    // ===== Pipeline scope =====

    /// Open a pipeline scope
    ///
    /// Exactly one pipeline may be active; nesting is fatal.
    pub fn begin_pipeline(&mut self, pipeline: impl Into<PipelineHandle>) -> Result<()> {
        if self.pipeline_open {
            engine_error!(
                "pulsar::CommandList",
                "'{}': begin_pipeline inside an open pipeline scope",
                self.name
            );
            return Err(Error::InvalidOperation(format!(
                "'{}': begin_pipeline inside an open pipeline scope",
                self.name
            )));
        }
        self.pipeline_open = true;
        self.commands.push(Command::BeginPipeline {
            pipeline: pipeline.into(),
        });
        Ok(())
    }

    /// Close the open pipeline scope
    pub fn end_pipeline(&mut self) -> Result<()> {
        if !self.pipeline_open {
            engine_error!(
                "pulsar::CommandList",
                "'{}': end_pipeline with no open pipeline scope",
                self.name
            );
            return Err(Error::InvalidOperation(format!(
                "'{}': end_pipeline with no open pipeline scope",
                self.name
            )));
        }
        self.pipeline_open = false;
        self.commands.push(Command::EndPipeline);
        Ok(())
    }

    // ===== Bindings =====

    /// Bind a descriptor set at a slot
    ///
    /// Captures a copy of the set's current bindings; mutating the caller's
    /// set afterwards does not affect this command.
    pub fn bind_descriptor_set(
        &mut self,
        slot: DescriptorSlot,
        set: &DescriptorSet,
        lifetime: DescriptorLifetime,
        frame_index: usize,
    ) {
        self.commands.push(Command::BindDescriptorSet {
            slot,
            descriptors: set.descriptors().to_vec(),
            lifetime,
            frame_index,
        });
    }

    pub fn bind_vertex_buffer(&mut self, buffer: BufferId, offset: u64) {
        self.commands.push(Command::BindVertexBuffer { buffer, offset });
    }

    pub fn bind_index_buffer(&mut self, buffer: BufferId, offset: u64, index_type: IndexType) {
        self.commands.push(Command::BindIndexBuffer {
            buffer,
            offset,
            index_type,
        });
    }

    /// Bind a model's vertex and index buffers
    pub fn bind_model(&mut self, model: &Model) {
        self.bind_vertex_buffer(model.vertex_buffer, 0);
        self.bind_index_buffer(model.index_buffer, 0, model.index_type);
    }

    pub fn push_constants(&mut self, offset: u32, data: &[u8]) {
        self.commands.push(Command::PushConstants {
            offset,
            data: data.to_vec(),
        });
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.commands.push(Command::SetViewport { viewport });
    }

    pub fn set_scissor(&mut self, scissor: Rect2D) {
        self.commands.push(Command::SetScissor { scissor });
    }

    // ===== Draws / dispatches =====

    pub fn draw(
        &mut self,
        vertex_count: u32,
        instance_count: u32,
        first_vertex: u32,
        first_instance: u32,
    ) {
        debug_assert!(vertex_count > 0, "draw with zero vertices");
        debug_assert!(instance_count > 0, "draw with zero instances");
        self.commands.push(Command::Draw {
            vertex_count,
            instance_count,
            first_vertex,
            first_instance,
        });
    }

    /// Draw without vertex input; the shader fetches vertex data itself
    pub fn draw_bindless(
        &mut self,
        vertex_count: u32,
        instance_count: u32,
        first_vertex: u32,
        first_instance: u32,
    ) {
        debug_assert!(vertex_count > 0, "draw_bindless with zero vertices");
        debug_assert!(instance_count > 0, "draw_bindless with zero instances");
        self.commands.push(Command::DrawBindless {
            vertex_count,
            instance_count,
            first_vertex,
            first_instance,
        });
    }

    pub fn draw_indexed(
        &mut self,
        index_count: u32,
        instance_count: u32,
        first_index: u32,
        vertex_offset: i32,
        first_instance: u32,
    ) {
        debug_assert!(index_count > 0, "draw_indexed with zero indices");
        debug_assert!(instance_count > 0, "draw_indexed with zero instances");
        self.commands.push(Command::DrawIndexed {
            index_count,
            instance_count,
            first_index,
            vertex_offset,
            first_instance,
        });
    }

    pub fn draw_indirect(&mut self, buffer: BufferId, offset: u64, draw_count: u32, stride: u32) {
        debug_assert!(draw_count > 0, "draw_indirect with zero draws");
        self.commands.push(Command::DrawIndirect {
            buffer,
            offset,
            draw_count,
            stride,
        });
    }

    pub fn draw_indirect_count(
        &mut self,
        buffer: BufferId,
        offset: u64,
        count_buffer: BufferId,
        count_offset: u64,
        max_draw_count: u32,
        stride: u32,
    ) {
        debug_assert!(max_draw_count > 0, "draw_indirect_count with zero max draws");
        self.commands.push(Command::DrawIndirectCount {
            buffer,
            offset,
            count_buffer,
            count_offset,
            max_draw_count,
            stride,
        });
    }

    pub fn dispatch(&mut self, group_count: [u32; 3]) {
        debug_assert!(
            group_count.iter().all(|&c| c > 0),
            "dispatch with zero thread groups"
        );
        self.commands.push(Command::Dispatch { group_count });
    }

    pub fn dispatch_indirect(&mut self, buffer: BufferId, offset: u64) {
        self.commands.push(Command::DispatchIndirect { buffer, offset });
    }

    // ===== Transfers / barriers =====

    pub fn copy_buffer(
        &mut self,
        src: BufferId,
        dst: BufferId,
        src_offset: u64,
        dst_offset: u64,
        size: u64,
    ) {
        debug_assert!(size > 0, "copy_buffer with zero size");
        self.commands.push(Command::CopyBuffer {
            src,
            dst,
            src_offset,
            dst_offset,
            size,
        });
    }

    pub fn pipeline_barrier(&mut self, barrier: PipelineBarrierKind, buffer: BufferId) {
        self.commands.push(Command::PipelineBarrier { barrier, buffer });
    }

    // ===== Replay =====

    /// Replay every recorded command exactly once, in recorded order
    ///
    /// Opens the backend command buffer, dispatches, then submits. An
    /// unbalanced marker scope or an unclosed pipeline scope is fatal.
    pub fn execute(&self, ctx: &mut ExecuteContext<'_>) -> Result<()> {
        if self.marker_depth != 0 {
            engine_error!(
                "pulsar::CommandList",
                "'{}': execute with {} unmatched marker push(es)",
                self.name,
                self.marker_depth
            );
            return Err(Error::InvalidOperation(format!(
                "'{}': execute with {} unmatched marker push(es)",
                self.name, self.marker_depth
            )));
        }
        if self.pipeline_open {
            engine_error!(
                "pulsar::CommandList",
                "'{}': execute with an open pipeline scope",
                self.name
            );
            return Err(Error::InvalidOperation(format!(
                "'{}': execute with an open pipeline scope",
                self.name
            )));
        }

        ctx.backend.begin_commands(ctx.frame_index)?;
        for command in &self.commands {
            command.dispatch(ctx)?;
        }
        ctx.backend.submit_commands(ctx.frame_index, ctx.signal)
    }

    /// Clear all recorded commands for reuse in a later frame
    pub fn reset(&mut self) {
        self.commands.clear();
        self.marker_depth = 0;
        self.pipeline_open = false;
    }

    /// Number of recorded commands
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Whether nothing has been recorded
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// The recorded commands, in order
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }
}

// ============================================================================
// Command list pool
// ============================================================================

/// Pool of reusable command lists addressed by `CommandListId`
#[derive(Default)]
pub struct CommandListPool {
    lists: SlotMap<CommandListId, CommandList>,
}

impl CommandListPool {
    pub fn new() -> Self {
        Self {
            lists: SlotMap::with_key(),
        }
    }

    /// Allocate a fresh command list
    pub fn acquire(&mut self, name: &str) -> CommandListId {
        self.lists.insert(CommandList::new(name))
    }

    /// Return a command list to the pool, recycling its ID
    pub fn release(&mut self, id: CommandListId) -> bool {
        self.lists.remove(id).is_some()
    }

    /// Resolve a command list ID
    pub fn get(&self, id: CommandListId) -> Result<&CommandList> {
        self.lists.get(id).ok_or_else(|| {
            Error::InvalidResource(format!("stale or invalid command list id {:?}", id))
        })
    }

    /// Mutably resolve a command list ID
    pub fn get_mut(&mut self, id: CommandListId) -> Result<&mut CommandList> {
        self.lists.get_mut(id).ok_or_else(|| {
            Error::InvalidResource(format!("stale or invalid command list id {:?}", id))
        })
    }

    /// Number of live command lists
    pub fn len(&self) -> usize {
        self.lists.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lists.is_empty()
    }
}

#[cfg(test)]
#[path = "command_list_tests.rs"]
mod tests;
