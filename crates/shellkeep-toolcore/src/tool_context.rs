use std::path::PathBuf;

/// Tool execution context
///
/// What a caller knows about the surrounding conversation: the directory it
/// considers current and an identifier used to correlate diagnostics.
#[derive(Debug, Clone)]
pub struct ToolContext {
    pub work_dir: PathBuf,
    pub session_id: String,
}

impl ToolContext {
    pub fn new(work_dir: PathBuf, session_id: String) -> Self {
        Self {
            work_dir,
            session_id,
        }
    }
}
