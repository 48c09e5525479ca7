use fruitlink_core::forecast::ForecastEngine;

use crate::commands::CommandResult;

pub fn run(fruit: &str) -> CommandResult {
    let fruit = fruit.trim();
    if fruit.is_empty() {
        return CommandResult::failure("forecast", "invalid_input", "fruit name is required", 2);
    }

    let prediction = ForecastEngine::default().predict(fruit);
    let message = format!(
        "{}: current {:.2}, predicted {:.2} over {} forecast months",
        prediction.fruit,
        prediction.current,
        prediction.predicted,
        prediction.forecast.len()
    );
    CommandResult::with_data("forecast", message, prediction)
}
