//! Quantity value object for drawing from item stacks

/// How much of a single stack a draw of `wanted` units takes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackDraw {
    /// The whole stack is consumed (wanted covers every unit in it)
    Whole,
    /// Only this many units are split off; the rest of the stack stays put
    Partial(u32),
}

impl StackDraw {
    /// Plan a draw of `wanted` units from a stack holding `stack` units
    pub fn plan(stack: u32, wanted: u32) -> Self {
        if wanted >= stack {
            Self::Whole
        } else {
            Self::Partial(wanted)
        }
    }

    /// Check if this draw removes the stack from its pocket
    pub fn takes_whole_stack(&self) -> bool {
        matches!(self, Self::Whole)
    }

    /// Number of units this draw takes from a stack of `stack` units
    pub fn taken(&self, stack: u32) -> u32 {
        match self {
            Self::Whole => stack,
            Self::Partial(units) => *units,
        }
    }
}
