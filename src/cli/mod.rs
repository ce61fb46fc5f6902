//! CLI command implementations.
//!
//! Thin commands over a JSON role directory file. Each returns a serializable
//! report; the binary prints it as JSON.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `preview` | Preview a clone: resulting permissions, diff, level, conflicts |
//! | `validate` | Validate a clone configuration |
//! | `lineage` | Show a role's ancestors, siblings, children and tree |
//!
//! # Example Usage
//!
//! ```bash
//! roleforge preview -d roles.json -s front-desk -t hierarchy --level 40 --name "Desk Agent"
//! roleforge validate -d roles.json -s front-desk -t partial --select p1
//! roleforge lineage -d roles.json night-audit --depth 3
//! ```

mod args;
mod lineage;
mod preview;

pub use args::CloneArgs;
pub use lineage::{LineageReport, cmd_lineage};
pub use preview::{PreviewReport, ValidateReport, cmd_preview, cmd_validate};
