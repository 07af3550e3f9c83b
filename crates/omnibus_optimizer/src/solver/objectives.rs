use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

/// The scalar a restart optimiser run can be asked to optimise. Every key is
/// maximised except the Gini index, which measures inequality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectiveKey {
    Utilitarian,
    Egalitarian,
    GiniIndex,
    AvgUtility,
    Proportionality,
    Percentile,
}

impl ObjectiveKey {
    pub fn maximise(&self) -> bool {
        !matches!(self, ObjectiveKey::GiniIndex)
    }

    /// Whether `candidate` beats `incumbent` under this key.
    pub fn better(&self, candidate: f64, incumbent: f64) -> bool {
        if self.maximise() {
            candidate > incumbent
        } else {
            candidate < incumbent
        }
    }
}

impl FromStr for ObjectiveKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "utilitarian" => Ok(ObjectiveKey::Utilitarian),
            "egalitarian" => Ok(ObjectiveKey::Egalitarian),
            "gini_index" => Ok(ObjectiveKey::GiniIndex),
            "avg_utility" => Ok(ObjectiveKey::AvgUtility),
            "proportionality" => Ok(ObjectiveKey::Proportionality),
            "percentile" => Ok(ObjectiveKey::Percentile),
            _ => Err(format!("unknown objective {s:?}")),
        }
    }
}

impl Display for ObjectiveKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ObjectiveKey::Utilitarian => write!(f, "utilitarian"),
            ObjectiveKey::Egalitarian => write!(f, "egalitarian"),
            ObjectiveKey::GiniIndex => write!(f, "gini_index"),
            ObjectiveKey::AvgUtility => write!(f, "avg_utility"),
            ObjectiveKey::Proportionality => write!(f, "proportionality"),
            ObjectiveKey::Percentile => write!(f, "percentile"),
        }
    }
}

/// Read-only welfare summary over the realized rider utilities of a finished
/// tour. Computed once per completed construction attempt.
#[derive(Debug, Clone, Serialize)]
pub struct Objectives {
    pub utilitarian: f64,
    pub egalitarian: f64,
    pub proportionality: f64,
    pub avg_utility: f64,
    pub std_dev: f64,
    pub gini_index: f64,
    pub percentile_20: f64,
}

impl Objectives {
    pub fn from_utilities(utilities: &[f64]) -> Self {
        let n = utilities.len();
        if n == 0 {
            return Objectives {
                utilitarian: 0.0,
                egalitarian: 0.0,
                proportionality: 0.0,
                avg_utility: 0.0,
                std_dev: 0.0,
                gini_index: 0.0,
                percentile_20: 0.0,
            };
        }

        let total: f64 = utilities.iter().sum();
        let avg = total / n as f64;
        let min = utilities.iter().copied().fold(f64::INFINITY, f64::min);

        let variance = utilities
            .iter()
            .map(|utility| (utility - avg).powi(2))
            .sum::<f64>()
            / n as f64;

        // Worst-off rider's share of a perfectly proportional share: 1.0 when
        // everyone holds exactly 1/n of the total welfare.
        let proportionality = if total > 0.0 { n as f64 * min / total } else { 0.0 };

        Objectives {
            utilitarian: total,
            egalitarian: min,
            proportionality,
            avg_utility: avg,
            std_dev: variance.sqrt(),
            gini_index: gini_index(utilities, total),
            percentile_20: percentile(utilities, 0.2),
        }
    }

    pub fn get(&self, key: ObjectiveKey) -> f64 {
        match key {
            ObjectiveKey::Utilitarian => self.utilitarian,
            ObjectiveKey::Egalitarian => self.egalitarian,
            ObjectiveKey::GiniIndex => self.gini_index,
            ObjectiveKey::AvgUtility => self.avg_utility,
            ObjectiveKey::Proportionality => self.proportionality,
            ObjectiveKey::Percentile => self.percentile_20,
        }
    }
}

/// Mean absolute difference over all ordered pairs, normalized by twice the
/// mean: `sum_ij |u_i - u_j| / (2 n sum_k u_k)`. Zero for a uniform vector
/// (and for an all-zero one).
fn gini_index(utilities: &[f64], total: f64) -> f64 {
    if total <= 0.0 {
        return 0.0;
    }

    let n = utilities.len() as f64;
    let pairwise: f64 = utilities
        .iter()
        .flat_map(|a| utilities.iter().map(move |b| (a - b).abs()))
        .sum();

    pairwise / (2.0 * n * total)
}

/// Nearest-rank percentile on the ascending utility vector.
fn percentile(utilities: &[f64], fraction: f64) -> f64 {
    let mut sorted = utilities.to_vec();
    sorted.sort_by(f64::total_cmp);

    let rank = (fraction * sorted.len() as f64).ceil().max(1.0) as usize;
    sorted[rank - 1]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_objective_set_values() {
        let objectives = Objectives::from_utilities(&[1.0, 0.5, 0.25, 0.25]);

        assert_eq!(objectives.utilitarian, 2.0);
        assert_eq!(objectives.egalitarian, 0.25);
        assert_eq!(objectives.avg_utility, 0.5);
        assert_eq!(objectives.percentile_20, 0.25);
        // 4 * 0.25 / 2.0
        assert_eq!(objectives.proportionality, 0.5);
        // Pairwise absolute differences sum to 5.0
        assert_eq!(objectives.gini_index, 5.0 / (2.0 * 4.0 * 2.0));
        assert!((objectives.std_dev - 0.3061862).abs() < 1e-6);
    }

    #[test]
    fn test_uniform_utilities_have_zero_inequality() {
        let objectives = Objectives::from_utilities(&[0.75, 0.75, 0.75]);

        assert_eq!(objectives.gini_index, 0.0);
        assert_eq!(objectives.proportionality, 1.0);
        assert_eq!(objectives.std_dev, 0.0);
        assert_eq!(objectives.egalitarian, 0.75);
    }

    #[test]
    fn test_empty_and_zero_utilities() {
        let empty = Objectives::from_utilities(&[]);
        assert_eq!(empty.utilitarian, 0.0);
        assert_eq!(empty.gini_index, 0.0);

        let zeros = Objectives::from_utilities(&[0.0, 0.0]);
        assert_eq!(zeros.gini_index, 0.0);
        assert_eq!(zeros.proportionality, 0.0);
    }

    #[test]
    fn test_percentile_nearest_rank() {
        // ceil(0.2 * 10) = 2nd smallest
        let utilities: Vec<f64> = (1..=10).map(|i| i as f64 / 10.0).collect();
        assert_eq!(percentile(&utilities, 0.2), 0.2);

        // A single rider is their own percentile
        assert_eq!(percentile(&[0.4], 0.2), 0.4);
    }

    #[test]
    fn test_key_direction_and_lookup() {
        let objectives = Objectives::from_utilities(&[1.0, 0.5]);

        assert!(ObjectiveKey::Utilitarian.maximise());
        assert!(!ObjectiveKey::GiniIndex.maximise());
        assert!(ObjectiveKey::Utilitarian.better(2.0, 1.5));
        assert!(ObjectiveKey::GiniIndex.better(0.1, 0.2));
        assert_eq!(objectives.get(ObjectiveKey::Utilitarian), 1.5);
        assert_eq!(objectives.get(ObjectiveKey::Egalitarian), 0.5);
    }

    #[test]
    fn test_parse_round_trip() {
        for key in [
            ObjectiveKey::Utilitarian,
            ObjectiveKey::Egalitarian,
            ObjectiveKey::GiniIndex,
            ObjectiveKey::AvgUtility,
            ObjectiveKey::Proportionality,
            ObjectiveKey::Percentile,
        ] {
            assert_eq!(key.to_string().parse::<ObjectiveKey>(), Ok(key));
        }

        assert!("nash_welfare".parse::<ObjectiveKey>().is_err());
    }
}
