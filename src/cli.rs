//! CLI domain: parse, route, output, and presentation only.
//! No identity logic; the route table dispatches to the identity service.

mod output;
mod parse;
mod presentation;
mod route;

pub use output::{exit_code, map_error};
pub use parse::{Cli, Commands, ConfigCommands};
pub use presentation::{format_contact_list, format_identify_response};
pub use route::RunContext;
