use rand::{Rng, seq::SliceRandom};

/// One voter's total order over the candidate set, most-preferred first,
/// with an optional weight multiplier applied to its score contribution.
#[derive(Debug, Clone)]
pub struct Ballot {
    ranking: Vec<usize>,
    weight: f64,
}

impl Ballot {
    pub fn new(ranking: Vec<usize>) -> Self {
        Ballot {
            ranking,
            weight: 1.0,
        }
    }

    pub fn weighted(ranking: Vec<usize>, weight: f64) -> Self {
        Ballot { ranking, weight }
    }

    pub fn ranking(&self) -> &[usize] {
        &self.ranking
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }
}

/// Ranks candidate indices by descending score. Indices are shuffled before
/// the stable sort so that exact score ties do not systematically favour
/// lower-numbered candidates.
pub fn ranked_by_score<R: Rng>(scores: &[f64], rng: &mut R) -> Vec<usize> {
    let mut ranking: Vec<usize> = (0..scores.len()).collect();
    ranking.shuffle(rng);
    ranking.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));
    ranking
}
