mod countdown;

pub use countdown::{QuestionTimer, TimerTick, Urgency};
