//! Built-in action catalog

mod format;
mod math;
mod text;

pub use format::Markdown;
pub use math::{Double, Square};
pub use text::WordCount;

use crate::action::{ActionRegistry, RegistryError};

/// Registry holding every built-in action
pub fn builtin_registry() -> Result<ActionRegistry, RegistryError> {
    let mut registry = ActionRegistry::new();
    registry.register(Double)?;
    registry.register(Square)?;
    registry.register(Markdown)?;
    registry.register(WordCount)?;
    Ok(registry)
}
