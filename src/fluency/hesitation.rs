use crate::config::PauseConfig;
use crate::types::PauseEvaluation;

/// Amplifies the penalties of pauses that follow each other closely.
///
/// Pauses are visited in start order; a pause joins the current group when
/// its start lies within `cluster_window` after the previous pause's end (or
/// start, when the end is unknown). Each member of a group of `k > 1` pauses
/// has its penalty multiplied by `1 + cluster_step * (k - 1)`, capped at 1.0.
/// Pauses without a start time carry no timing and are never grouped.
pub fn apply_hesitation_clustering(pauses: &mut [PauseEvaluation], config: &PauseConfig) {
    let mut order: Vec<usize> = (0..pauses.len())
        .filter(|&idx| pauses[idx].start.is_some())
        .collect();
    order.sort_by(|&a, &b| {
        let sa = pauses[a].start.unwrap_or_default();
        let sb = pauses[b].start.unwrap_or_default();
        sa.total_cmp(&sb).then(a.cmp(&b))
    });

    let mut clusters: Vec<Vec<usize>> = Vec::new();
    let mut current: Vec<usize> = Vec::new();
    for idx in order {
        if let Some(&prev) = current.last() {
            let prev_pause = &pauses[prev];
            let prev_edge = prev_pause.end.or(prev_pause.start).unwrap_or_default();
            let gap = pauses[idx].start.unwrap_or_default() - prev_edge;
            if !(0.0..=config.cluster_window).contains(&gap) {
                clusters.push(std::mem::take(&mut current));
            }
        }
        current.push(idx);
    }
    clusters.push(current);

    for cluster in clusters.into_iter().filter(|c| c.len() > 1) {
        let size = cluster.len();
        let amplification = 1.0 + config.cluster_step * (size - 1) as f64;
        tracing::debug!(size, amplification, "hesitation cluster");
        for idx in cluster {
            let pause = &mut pauses[idx];
            pause.penalty = (pause.penalty * amplification).min(1.0);
            pause.cluster_size = Some(size);
        }
    }
}

/// Mean pause penalty, capped at `max_aggregate_penalty`. No pauses gives 0.
pub fn aggregate_pause_penalty(pauses: &[PauseEvaluation], config: &PauseConfig) -> f64 {
    if pauses.is_empty() {
        return 0.0;
    }
    let mean = pauses.iter().map(|p| p.penalty).sum::<f64>() / pauses.len() as f64;
    mean.min(config.max_aggregate_penalty)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PauseStatus;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn pause(start: Option<f64>, end: Option<f64>, penalty: f64) -> PauseEvaluation {
        PauseEvaluation {
            token_index: 0,
            punctuation: ",".to_string(),
            duration: None,
            status: PauseStatus::Short,
            penalty,
            expected_range: (0.3, 0.5),
            start,
            end,
            cluster_size: None,
        }
    }

    #[test]
    fn three_close_pauses_are_amplified() {
        let config = PauseConfig::default();
        let mut pauses = vec![
            pause(Some(1.0), Some(1.2), 0.1),
            pause(Some(2.0), Some(2.2), 0.1),
            pause(Some(3.0), Some(3.2), 0.1),
        ];
        apply_hesitation_clustering(&mut pauses, &config);
        for p in &pauses {
            assert!((p.penalty - 0.14).abs() < 1e-12);
            assert_eq!(p.cluster_size, Some(3));
        }
    }

    #[test]
    fn distant_pauses_are_untouched() {
        let config = PauseConfig::default();
        let mut pauses = vec![
            pause(Some(1.0), Some(1.2), 0.1),
            pause(Some(5.0), Some(5.2), 0.1),
        ];
        apply_hesitation_clustering(&mut pauses, &config);
        assert!(pauses.iter().all(|p| p.penalty == 0.1 && p.cluster_size.is_none()));
    }

    #[test]
    fn clustering_follows_start_order_not_input_order() {
        let config = PauseConfig::default();
        let mut pauses = vec![
            pause(Some(10.0), Some(10.5), 0.2),
            pause(Some(1.0), Some(1.5), 0.2),
            pause(Some(2.0), Some(2.5), 0.2),
        ];
        apply_hesitation_clustering(&mut pauses, &config);
        assert_eq!(pauses[0].cluster_size, None);
        assert_eq!(pauses[1].cluster_size, Some(2));
        assert!((pauses[2].penalty - 0.24).abs() < 1e-12);
    }

    #[test]
    fn missing_end_falls_back_to_start() {
        let config = PauseConfig::default();
        let mut pauses = vec![pause(Some(1.0), None, 0.3), pause(Some(2.5), None, 0.3)];
        apply_hesitation_clustering(&mut pauses, &config);
        assert_eq!(pauses[1].cluster_size, Some(2));
    }

    #[test]
    fn untimed_pauses_are_not_clustered() {
        let config = PauseConfig::default();
        let mut pauses = vec![pause(None, None, 0.3), pause(None, None, 0.3)];
        apply_hesitation_clustering(&mut pauses, &config);
        assert!(pauses.iter().all(|p| p.penalty == 0.3));
    }

    #[test]
    fn clustering_never_exceeds_one() {
        let config = PauseConfig::default();
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..100 {
            let count = rng.gen_range(1..12);
            let mut t = 0.0;
            let mut pauses: Vec<PauseEvaluation> = (0..count)
                .map(|_| {
                    t += rng.gen_range(0.0..3.0);
                    let start = t;
                    t += rng.gen_range(0.0..1.0);
                    pause(Some(start), Some(t), rng.gen_range(0.0..=1.0))
                })
                .collect();
            apply_hesitation_clustering(&mut pauses, &config);
            assert!(pauses.iter().all(|p| (0.0..=1.0).contains(&p.penalty)));
        }
    }

    #[test]
    fn aggregate_is_capped_mean() {
        let config = PauseConfig::default();
        assert_eq!(aggregate_pause_penalty(&[], &config), 0.0);
        let low = [pause(None, None, 0.1), pause(None, None, 0.2)];
        assert!((aggregate_pause_penalty(&low, &config) - 0.15).abs() < 1e-12);
        let high = [pause(None, None, 1.0), pause(None, None, 0.6)];
        assert_eq!(aggregate_pause_penalty(&high, &config), 0.3);
    }
}
