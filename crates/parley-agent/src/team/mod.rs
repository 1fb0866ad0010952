mod round_robin;
pub mod termination;

pub use round_robin::{RoundRobinGroupChat, RoundRobinGroupChatBuilder};
pub use termination::{
    AndTermination, MaxMessageTermination, OrTermination, StopMessage, TerminationCondition,
    TextMentionTermination,
};
