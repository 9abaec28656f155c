//! Environment source: CONTACTLINK__STORE__BACKEND=memory and friends.

use config::builder::DefaultState;
use config::{ConfigBuilder, Environment};

/// Add `CONTACTLINK__SECTION__KEY` variables as the highest-precedence source.
pub fn add_to_builder(builder: ConfigBuilder<DefaultState>) -> ConfigBuilder<DefaultState> {
    builder.add_source(
        Environment::with_prefix("CONTACTLINK")
            .prefix_separator("__")
            .separator("__"),
    )
}
