pub mod ballot;
pub mod rule;

pub use ballot::{Ballot, ranked_by_score};
pub use rule::VotingRule;
