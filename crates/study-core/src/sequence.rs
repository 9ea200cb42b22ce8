//! Ordered progression through the staged allocation frames.

/// Successor of `current` in `stages`. `None` marks the end of the sequence.
/// An id that is not in the sequence resets to the first stage instead of
/// erroring, so a stale client resumes from the top.
pub fn next_stage<'a>(current: &str, stages: &'a [String]) -> Option<&'a str> {
    match stages.iter().position(|stage| stage == current) {
        Some(index) if index + 1 < stages.len() => Some(stages[index + 1].as_str()),
        Some(_) => None,
        None => stages.first().map(String::as_str),
    }
}

/// Zero-based position of `current` in `stages`, with the same
/// reset-to-first rule for unknown ids.
pub fn stage_index(current: &str, stages: &[String]) -> usize {
    stages.iter().position(|stage| stage == current).unwrap_or(0)
}
