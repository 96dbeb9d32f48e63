//! Buffer ping-pong between the two blur passes
//!
//! Pass 1 reads the scene and writes working buffer B along the horizontal
//! axis; pass 2 reads B and writes working buffer A along the vertical axis.
//! A is what the compositor presents. `FramePlan::new` accepts only that
//! schedule and names the first way a candidate departs from it.

use super::{group_count, BlurParams, PassDirection, BATCH};
use crate::error::PlanError;

/// The three frame buffers owned by a pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferId {
    Scene,
    WorkingA,
    WorkingB,
}

/// One kernel dispatch: which buffers it binds and along which axis it filters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassBinding {
    pub direction: PassDirection,
    pub input: BufferId,
    pub output: BufferId,
}

impl PassBinding {
    pub const fn new(direction: PassDirection, input: BufferId, output: BufferId) -> Self {
        Self {
            direction,
            input,
            output,
        }
    }

    /// Workgroup grid for this pass over an image of `dims`.
    ///
    /// Along the filter axis each group produces `block_dim` texels; across
    /// it each group covers `BATCH` rows.
    pub fn workgroups(&self, dims: (u32, u32), params: &BlurParams) -> (u32, u32) {
        dispatch_size(self.direction, dims, params)
    }
}

/// Workgroup grid for a pass along `direction` over an image of `dims`
pub fn dispatch_size(direction: PassDirection, dims: (u32, u32), params: &BlurParams) -> (u32, u32) {
    let (along, across) = match direction {
        PassDirection::Horizontal => (dims.0, dims.1),
        PassDirection::Vertical => (dims.1, dims.0),
    };
    (group_count(along, params.block_dim), group_count(across, BATCH))
}

/// Validated two-pass schedule for one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FramePlan {
    passes: [PassBinding; 2],
}

impl FramePlan {
    pub fn new(passes: [PassBinding; 2]) -> Result<Self, PlanError> {
        for (pass, binding) in passes.iter().enumerate() {
            if binding.input == binding.output {
                return Err(PlanError::AliasedBuffers {
                    pass: pass + 1,
                    buffer: binding.input,
                });
            }
            if binding.output == BufferId::Scene {
                return Err(PlanError::WritesScene { pass: pass + 1 });
            }
        }

        let [first, second] = passes;
        if first.input != BufferId::Scene {
            return Err(PlanError::SceneNotFirst(first.input));
        }
        if second.input != first.output {
            return Err(PlanError::BrokenChain {
                expected: first.output,
                found: second.input,
            });
        }
        if first.direction == second.direction {
            return Err(PlanError::SameDirection(first.direction));
        }

        // Pass 1 is always horizontal scene -> B, pass 2 vertical B -> A
        let standard = Self::standard();
        for (pass, (expected, found)) in standard.passes.iter().zip(passes.iter()).enumerate() {
            if expected != found {
                return Err(PlanError::NotStandard {
                    pass: pass + 1,
                    expected: *expected,
                    found: *found,
                });
            }
        }

        Ok(Self { passes })
    }

    /// scene → B (horizontal), B → A (vertical)
    pub fn standard() -> Self {
        Self {
            passes: [
                PassBinding::new(PassDirection::Horizontal, BufferId::Scene, BufferId::WorkingB),
                PassBinding::new(PassDirection::Vertical, BufferId::WorkingB, BufferId::WorkingA),
            ],
        }
    }

    pub fn passes(&self) -> &[PassBinding; 2] {
        &self.passes
    }

    /// Buffer holding the finished frame
    pub fn presented(&self) -> BufferId {
        self.passes[1].output
    }
}

impl Default for FramePlan {
    fn default() -> Self {
        Self::standard()
    }
}
