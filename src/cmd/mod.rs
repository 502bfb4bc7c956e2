//! CLI command implementations.
//!
//! | Module   | Commands handled |
//! |----------|------------------|
//! | `run`    | `Run`            |
//! | `assess` | `Assess`         |
//! | `decide` | `Decide`         |

pub mod assess;
pub mod decide;
pub mod run;

pub use assess::cmd_assess;
pub use decide::cmd_decide;
pub use run::cmd_run;
