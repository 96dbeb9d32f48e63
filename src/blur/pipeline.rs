//! CPU frame pipeline: scene → horizontal pass → vertical pass

use super::{BlurParams, BufferId, FramePlan, PointerParams, TiledBlur};
use crate::frame::FrameBuffer;
use crate::scene::Scene;

/// Owns the scene buffer and both working buffers for a fixed frame size
pub struct CpuBlurPipeline {
    kernel: TiledBlur,
    plan: FramePlan,
    scene: FrameBuffer,
    working_a: FrameBuffer,
    working_b: FrameBuffer,
}

impl CpuBlurPipeline {
    pub fn new(width: u32, height: u32, params: BlurParams, scene: &Scene) -> Self {
        log::info!(
            "CPU pipeline {}x{}: filter {} block {}",
            width,
            height,
            params.filter_dim,
            params.block_dim
        );
        Self {
            kernel: TiledBlur::new(params),
            plan: FramePlan::standard(),
            // The scene is time-independent, so it is rasterized once
            scene: scene.rasterize(width, height),
            working_a: FrameBuffer::new(width, height),
            working_b: FrameBuffer::new(width, height),
        }
    }

    /// Run both passes for the given pointer and return the presented buffer
    pub fn render(&mut self, pointer: &PointerParams) -> &FrameBuffer {
        let plan = self.plan;
        let kernel = self.kernel;
        for pass in plan.passes() {
            let (input, output) = self.split(pass.input, pass.output);
            kernel.run_pass(input, output, pointer, pass.direction);
        }
        self.buffer(plan.presented())
    }

    pub fn buffer(&self, id: BufferId) -> &FrameBuffer {
        match id {
            BufferId::Scene => &self.scene,
            BufferId::WorkingA => &self.working_a,
            BufferId::WorkingB => &self.working_b,
        }
    }

    pub fn dims(&self) -> (u32, u32) {
        self.scene.dims()
    }

    /// Borrow a pass's input and output together.
    ///
    /// `FramePlan` guarantees they differ and that the scene is never an output.
    fn split(&mut self, input: BufferId, output: BufferId) -> (&FrameBuffer, &mut FrameBuffer) {
        match (input, output) {
            (BufferId::Scene, BufferId::WorkingA) => (&self.scene, &mut self.working_a),
            (BufferId::Scene, BufferId::WorkingB) => (&self.scene, &mut self.working_b),
            (BufferId::WorkingA, BufferId::WorkingB) => (&self.working_a, &mut self.working_b),
            (BufferId::WorkingB, BufferId::WorkingA) => (&self.working_b, &mut self.working_a),
            (input, output) => unreachable!("plan binds {input:?} -> {output:?}"),
        }
    }
}
