//! Render graph
//!
//! A per-frame declarative description of rendering work as named passes
//! with declared resource reads/writes. The graph is a strict two-phase
//! state machine: `setup` runs every pass's setup callback against the
//! builder in registration order, `execute` runs the surviving passes'
//! execute callbacks into one shared command list inside a single outer
//! marker scope and replays it exactly once.
//!
//! Passes execute strictly in registration order. The read/write
//! declarations feed resource tracking and token resolution; they do not
//! reorder anything.

use crate::command::ExecuteContext;
use crate::engine_warn;
use crate::error::Result;
use crate::renderer::RenderContext;

use super::builder::{GraphBuilder, TrackedResource};
use super::resources::GraphResources;

/// Phase of the per-frame graph state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GraphPhase {
    /// Passes may be registered
    Recording,
    /// Setup ran; the execute list is fixed
    SetupDone,
    /// Execute ran; the graph is spent
    Executed,
}

/// Internal pass storage: the caller's PassData plus its two callbacks
trait GraphPass {
    fn name(&self) -> &str;
    fn setup(&mut self, builder: &mut GraphBuilder<'_>) -> bool;
    fn execute(
        &mut self,
        resources: &mut GraphResources<'_>,
        cmd: &mut crate::command::CommandList,
    ) -> Result<()>;
}

struct CallbackPass<D, S, E> {
    name: String,
    data: D,
    setup_fn: S,
    execute_fn: E,
}

impl<D, S, E> GraphPass for CallbackPass<D, S, E>
where
    S: FnMut(&mut D, &mut GraphBuilder<'_>) -> bool,
    E: FnMut(&mut D, &mut GraphResources<'_>, &mut crate::command::CommandList) -> Result<()>,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn setup(&mut self, builder: &mut GraphBuilder<'_>) -> bool {
        (self.setup_fn)(&mut self.data, builder)
    }

    fn execute(
        &mut self,
        resources: &mut GraphResources<'_>,
        cmd: &mut crate::command::CommandList,
    ) -> Result<()> {
        (self.execute_fn)(&mut self.data, resources, cmd)
    }
}

/// A per-frame render graph
///
/// Created once per frame, spent after `execute`.
pub struct RenderGraph {
    name: String,
    passes: Vec<Box<dyn GraphPass>>,
    tracked: Vec<TrackedResource>,
    /// Indices of passes whose setup returned true, in registration order
    run_list: Vec<usize>,
    phase: GraphPhase,
}

impl RenderGraph {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            passes: Vec::new(),
            tracked: Vec::new(),
            run_list: Vec::new(),
            phase: GraphPhase::Recording,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Register a pass
    ///
    /// `data` is the pass's own state, carried from setup to execute
    /// (typically holding the tokens setup collects). The setup callback
    /// returns whether the pass should run this frame.
    ///
    /// Returns false without registering when a pass with this name already
    /// exists or the graph already left its recording phase.
    pub fn add_pass<D, S, E>(&mut self, name: &str, data: D, setup: S, execute: E) -> bool
    where
        D: 'static,
        S: FnMut(&mut D, &mut GraphBuilder<'_>) -> bool + 'static,
        E: FnMut(&mut D, &mut GraphResources<'_>, &mut crate::command::CommandList) -> Result<()>
            + 'static,
    {
        if self.phase != GraphPhase::Recording {
            engine_warn!(
                "pulsar::RenderGraph",
                "'{}': add_pass('{}') after setup; ignored",
                self.name,
                name
            );
            return false;
        }
        if self.passes.iter().any(|p| p.name() == name) {
            engine_warn!(
                "pulsar::RenderGraph",
                "'{}': pass '{}' already registered; ignored",
                self.name,
                name
            );
            return false;
        }
        self.passes.push(Box::new(CallbackPass {
            name: name.to_string(),
            data,
            setup_fn: setup,
            execute_fn: execute,
        }));
        true
    }

    /// Number of registered passes
    pub fn pass_count(&self) -> usize {
        self.passes.len()
    }

    /// Number of passes that will run this frame (valid after setup)
    pub fn executing_pass_count(&self) -> usize {
        self.run_list.len()
    }

    /// Run every pass's setup callback in registration order
    ///
    /// A pass whose setup returns false is excluded from this frame's
    /// execute list.
    pub fn setup(&mut self, ctx: &mut RenderContext<'_>) -> Result<()> {
        if self.phase != GraphPhase::Recording {
            return Err(crate::error::Error::InvalidOperation(format!(
                "render graph '{}': setup called twice",
                self.name
            )));
        }

        for (index, pass) in self.passes.iter_mut().enumerate() {
            let mut builder = GraphBuilder {
                backend: &mut *ctx.backend,
                resources: &mut *ctx.resources,
                frame_index: ctx.frame_index,
                tracked: &mut self.tracked,
            };
            if pass.setup(&mut builder) {
                self.run_list.push(index);
            }
        }

        self.phase = GraphPhase::SetupDone;
        Ok(())
    }

    /// Run the surviving passes in registration order into one shared
    /// command list, then replay it exactly once
    pub fn execute(&mut self, ctx: &mut RenderContext<'_>) -> Result<()> {
        if self.phase != GraphPhase::SetupDone {
            return Err(crate::error::Error::InvalidOperation(format!(
                "render graph '{}': execute without setup",
                self.name
            )));
        }

        let list_id = ctx.command_lists.acquire(&self.name);

        // Record: one outer marker scope around every pass
        {
            let cmd = ctx.command_lists.get_mut(list_id)?;
            cmd.push_marker(&self.name);

            let mut resources = GraphResources {
                backend: &mut *ctx.backend,
                resources: &*ctx.resources,
                pipelines: &mut *ctx.pipelines,
                frame_index: ctx.frame_index,
                tracked: &self.tracked,
            };
            for &index in &self.run_list {
                self.passes[index].execute(&mut resources, cmd)?;
            }

            cmd.pop_marker()?;
        }

        // Replay: one frame, one submission
        {
            let cmd = ctx.command_lists.get(list_id)?;
            let signal = ctx
                .signal
                .and_then(|id| ctx.resources.semaphores.get(id).ok());
            let mut exec = ExecuteContext::new(
                &mut *ctx.backend,
                &*ctx.resources,
                &*ctx.pipelines,
                ctx.frame_index,
                signal,
                &mut *ctx.stats,
            );
            cmd.execute(&mut exec)?;
        }

        ctx.command_lists.release(list_id);
        self.phase = GraphPhase::Executed;
        Ok(())
    }
}

#[cfg(test)]
#[path = "render_graph_tests.rs"]
mod tests;
