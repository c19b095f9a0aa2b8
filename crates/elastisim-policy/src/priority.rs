use elastisim_core::Job;

/// `(|assigned| − adjust − min) / (max − min)`: a job's position within its
/// elastic range, biased by `adjust` nodes already earmarked for it in the
/// plan under construction. Shrink planners pass a negative `adjust` (nodes
/// tentatively collected from the job still count as assigned); the
/// average-anchored expand planner passes a positive one (nodes tentatively
/// handed to the job count against it, so the next pick favors a less-full
/// job). Only called once a job is known to have a nonzero elastic range.
pub fn avg_priority(job: &Job, adjust: i64) -> f64 {
    let range = (job.num_nodes_max - job.num_nodes_min) as i64;
    let current = job.assigned_nodes.len() as i64 - adjust;
    (current - job.num_nodes_min as i64) as f64 / range as f64
}

/// `|assigned| − min`: how far above its floor a job currently sits. Used by
/// the min-anchored planners to pick shrink/expand order.
pub fn min_priority(job: &Job) -> i64 {
    job.assigned_nodes.len() as i64 - job.num_nodes_min as i64
}

/// `|assigned| − pref`: how far above its preferred size a job currently
/// sits. Used by the pref-anchored planners to pick shrink/expand order.
pub fn pref_priority(job: &Job, pref: u32) -> i64 {
    job.assigned_nodes.len() as i64 - pref as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use elastisim_core::{JobArguments, JobId, JobType};

    fn job(assigned: usize, min: u32, max: u32) -> Job {
        let mut j = Job::new_elastic(JobId(1), JobType::Malleable, min, max, None, 1, 0.0, JobArguments::new(1.0));
        j.assigned_nodes = (0..assigned).map(|i| elastisim_core::NodeId(i as u64)).collect();
        j
    }

    #[test]
    fn avg_priority_is_zero_at_the_floor() {
        assert_eq!(avg_priority(&job(2, 2, 6), 0), 0.0);
    }

    #[test]
    fn avg_priority_is_one_at_the_ceiling() {
        assert_eq!(avg_priority(&job(6, 2, 6), 0), 1.0);
    }

    #[test]
    fn min_priority_counts_nodes_above_the_floor() {
        assert_eq!(min_priority(&job(5, 2, 6)), 3);
    }
}
