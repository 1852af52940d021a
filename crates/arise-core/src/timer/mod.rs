mod deadline;
mod session;
mod ticker;

pub use deadline::{format_hms, remaining_ms, DeadlineClock, TimeRemaining};
pub use session::{TimerSession, DEFAULT_TICK_PERIOD};
pub use ticker::{IntervalTicks, NoTicks, Tick, TickGuard, TickProbe, TickSource};
