/// Ordinary least squares line over `(i + 1, price_i)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
    pub samples: usize,
}

impl LinearFit {
    /// Returns `None` for an empty series. A degenerate denominator (a single
    /// sample) yields a flat line through the mean instead of NaN.
    pub fn fit(prices: &[f64]) -> Option<Self> {
        if prices.is_empty() {
            return None;
        }

        let n = prices.len() as f64;
        let (mut sum_x, mut sum_y, mut sum_xy, mut sum_x2) = (0.0, 0.0, 0.0, 0.0);
        for (index, price) in prices.iter().enumerate() {
            let x = (index + 1) as f64;
            sum_x += x;
            sum_y += price;
            sum_xy += x * price;
            sum_x2 += x * x;
        }

        let denominator = n * sum_x2 - sum_x * sum_x;
        let slope =
            if denominator.abs() < f64::EPSILON { 0.0 } else { (n * sum_xy - sum_x * sum_y) / denominator };
        let intercept = (sum_y - slope * sum_x) / n;

        Some(Self { slope, intercept, samples: prices.len() })
    }

    pub fn at(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }

    /// Value `steps` positions past the last sample.
    pub fn extrapolate(&self, steps: usize) -> f64 {
        self.at((self.samples + steps) as f64)
    }
}

pub fn moving_average(prices: &[f64]) -> f64 {
    if prices.is_empty() {
        return 0.0;
    }
    prices.iter().sum::<f64>() / prices.len() as f64
}
