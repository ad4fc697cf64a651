//! Text inlining strategies.

/// Strategy governing how raw text inside a scope is post-processed before
/// output. Scoped like a variable: deeper levels shadow shallower ones, and
/// an explicit "no inliner" at a deep level shadows an inliner set below.
pub trait Inliner {
    fn name(&self) -> &str;

    fn inline(&self, text: &str) -> String;
}

/// Inliner that leaves text untouched.
pub struct NoOpInliner;

impl Inliner for NoOpInliner {
    fn name(&self) -> &str {
        "none"
    }

    fn inline(&self, text: &str) -> String {
        text.to_string()
    }
}
