//! Agent instructions from `.prompty` files.

use std::path::Path;

use tracing::{info, warn};

/// Extract the system block of a prompty document.
///
/// The block is every non-blank line after the first `system:` line up to the
/// next `user:` line, joined with newlines and trimmed. Returns `None` when
/// there is no `system:` line or the block is empty.
pub fn parse_prompty_system(content: &str) -> Option<String> {
    let block: Vec<&str> = content
        .lines()
        .filter(|line| !line.is_empty())
        .skip_while(|line| !line.trim().starts_with("system:"))
        .skip(1)
        .take_while(|line| !line.trim().starts_with("user:"))
        .collect();

    if block.is_empty() {
        return None;
    }
    let joined = block.join("\n").trim().to_string();
    (!joined.is_empty()).then_some(joined)
}

/// Read agent instructions from a prompty file.
///
/// Instructions are optional: an unreadable file or a missing `system:` block
/// logs a warning and yields an empty string.
pub fn load_instructions_file(path: &Path) -> String {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to read instructions file, creating agent without instructions");
            return String::new();
        }
    };
    match parse_prompty_system(&content) {
        Some(instructions) => {
            info!(path = %path.display(), "loaded system instructions");
            instructions
        }
        None => {
            warn!(path = %path.display(), "no 'system:' block in instructions file, creating agent without instructions");
            String::new()
        }
    }
}
