//! An executor is responsible for opening runs, handing them to a runner and
//! collecting the outcomes.

mod command;
mod context;
mod mode;
mod results;

pub use command::{CommandRunner, Invocation, Runner};
pub use context::Context;
pub use mode::{include_set, start_run, Profile, RunMode, RunRequest};
pub use results::{Location, MessageText, Outcome, TestMessage, TestRun};
