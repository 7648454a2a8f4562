/// Read configuration carried by every source and propagated to clones.
#[derive(Clone, Debug)]
pub struct ReadOptions {
    /// Cross-check the descriptor against the stored page payloads when a
    /// source attaches. Catches images whose cluster ranges disagree with
    /// the bytes actually stored, at the cost of one pass over the
    /// metadata. On by default.
    pub validate_on_attach: bool,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            validate_on_attach: true,
        }
    }
}
