// Cross-cutting prompt fragments. Each service that needs LLM calls
// defines its own prompts alongside it; this file holds shared pieces.

/// Instruction that keeps generated content grounded in employer input.
pub const GROUNDING_INSTRUCTION: &str = "\
    Use ONLY the facts provided in the job data. \
    Do NOT invent benefits, salary figures, team sizes, or company claims \
    that are not present in the input. If a detail is missing, omit it.";
