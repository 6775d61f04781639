use hgp_core::Gain;

/// Random walk model of the gains seen since the last improvement.
///
/// The search stops once the observed mean gain is non-positive and the
/// number of steps makes a later improvement unlikely:
/// `steps * mean^2 > alpha * variance + beta`, with `beta = ln(n)`.
#[derive(Debug, Clone)]
pub(crate) struct AdaptiveStop {
    steps: u64,
    mean: f64,
    m2: f64,
    beta: f64,
}

impl AdaptiveStop {
    pub(crate) fn new(num_nodes: usize) -> Self {
        Self {
            steps: 0,
            mean: 0.0,
            m2: 0.0,
            beta: (num_nodes.max(2) as f64).ln(),
        }
    }

    pub(crate) fn push(&mut self, gain: Gain) {
        self.steps += 1;
        let value = gain as f64;
        let delta = value - self.mean;
        self.mean += delta / self.steps as f64;
        self.m2 += delta * (value - self.mean);
    }

    pub(crate) fn reset(&mut self) {
        self.steps = 0;
        self.mean = 0.0;
        self.m2 = 0.0;
    }

    pub(crate) fn should_stop(&self, alpha: f64) -> bool {
        if (self.steps as f64) <= self.beta || self.mean > 0.0 {
            return false;
        }
        let variance = if self.steps > 1 {
            self.m2 / (self.steps - 1) as f64
        } else {
            0.0
        };
        self.steps as f64 * self.mean * self.mean > alpha * variance + self.beta
    }
}

#[cfg(test)]
mod tests {
    use super::AdaptiveStop;

    #[test]
    fn positive_walks_keep_going() {
        let mut stop = AdaptiveStop::new(1000);
        for _ in 0..500 {
            stop.push(1);
        }
        assert!(!stop.should_stop(1.0));
    }

    #[test]
    fn steadily_negative_walks_stop() {
        let mut stop = AdaptiveStop::new(1000);
        for _ in 0..20 {
            stop.push(-1);
        }
        assert!(stop.should_stop(1.0));
        stop.reset();
        assert!(!stop.should_stop(1.0));
    }
}
