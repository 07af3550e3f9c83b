use std::{fmt::Display, str::FromStr};

use fixedbitset::FixedBitSet;
use rand::{Rng, seq::IndexedRandom};
use serde::{Deserialize, Serialize};

use super::ballot::Ballot;

/// The social-choice rules used to turn per-voter rankings into a single
/// winner. Ties on the deciding score are structurally common (symmetric
/// travel times, equal utilities) and are always broken uniformly at random,
/// never by candidate order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VotingRule {
    BordaCount,
    Popularity,
    Harmonic,
    InstantRunoff,
}

impl FromStr for VotingRule {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "borda_count" => Ok(VotingRule::BordaCount),
            "popularity" => Ok(VotingRule::Popularity),
            "harmonic" => Ok(VotingRule::Harmonic),
            "instant_runoff" => Ok(VotingRule::InstantRunoff),
            _ => Err(format!("unknown voting rule {s:?}")),
        }
    }
}

impl Display for VotingRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VotingRule::BordaCount => write!(f, "borda_count"),
            VotingRule::Popularity => write!(f, "popularity"),
            VotingRule::Harmonic => write!(f, "harmonic"),
            VotingRule::InstantRunoff => write!(f, "instant_runoff"),
        }
    }
}

impl VotingRule {
    /// Elects one of `num_candidates` candidates from the given ballots.
    /// Every ballot must rank all candidates. Returns `None` only for an
    /// empty candidate set.
    pub fn elect<R: Rng>(
        &self,
        num_candidates: usize,
        ballots: &[Ballot],
        rng: &mut R,
    ) -> Option<usize> {
        if num_candidates == 0 {
            return None;
        }

        match self {
            VotingRule::BordaCount => pick_max_tied(
                &positional_scores(num_candidates, ballots, |rank| {
                    (num_candidates - 1 - rank) as f64
                }),
                rng,
            ),
            VotingRule::Popularity => {
                pick_max_tied(&top_choice_scores(num_candidates, ballots), rng)
            }
            VotingRule::Harmonic => pick_max_tied(
                &positional_scores(num_candidates, ballots, |rank| 1.0 / (rank as f64 + 1.0)),
                rng,
            ),
            VotingRule::InstantRunoff => instant_runoff(num_candidates, ballots, rng),
        }
    }
}

fn positional_scores(
    num_candidates: usize,
    ballots: &[Ballot],
    points: impl Fn(usize) -> f64,
) -> Vec<f64> {
    let mut scores = vec![0.0; num_candidates];

    for ballot in ballots {
        for (rank, &candidate) in ballot.ranking().iter().enumerate() {
            scores[candidate] += ballot.weight() * points(rank);
        }
    }

    scores
}

fn top_choice_scores(num_candidates: usize, ballots: &[Ballot]) -> Vec<f64> {
    let mut scores = vec![0.0; num_candidates];

    for ballot in ballots {
        if let Some(&top) = ballot.ranking().first() {
            scores[top] += ballot.weight();
        }
    }

    scores
}

fn pick_max_tied<R: Rng>(scores: &[f64], rng: &mut R) -> Option<usize> {
    let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let tied: Vec<usize> = (0..scores.len())
        .filter(|&candidate| scores[candidate] == max)
        .collect();

    tied.choose(rng).copied()
}

/// Repeated plurality over the non-eliminated candidates, eliminating the
/// lowest scorer (ties broken at random) one at a time until one remains.
/// Unweighted by design.
fn instant_runoff<R: Rng>(
    num_candidates: usize,
    ballots: &[Ballot],
    rng: &mut R,
) -> Option<usize> {
    let mut active = FixedBitSet::with_capacity(num_candidates);
    active.insert_range(..);

    while active.count_ones(..) > 1 {
        let mut counts = vec![0.0; num_candidates];
        for ballot in ballots {
            if let Some(&choice) = ballot
                .ranking()
                .iter()
                .find(|&&candidate| active.contains(candidate))
            {
                counts[choice] += 1.0;
            }
        }

        let min = active
            .ones()
            .map(|candidate| counts[candidate])
            .fold(f64::INFINITY, f64::min);
        let tied: Vec<usize> = active
            .ones()
            .filter(|&candidate| counts[candidate] == min)
            .collect();

        let eliminated = tied.choose(rng).copied()?;
        active.set(eliminated, false);
    }

    active.ones().next()
}
