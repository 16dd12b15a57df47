//! Named scenarios

use std::time::Duration;

use super::{ProbeMutation, StepSpec, DEFAULT_BASE_AMOUNT};

pub const PRESET_NAMES: [&str; 4] = ["switch-device", "change-location", "increase-amount", "escalation"];

/// Steps of a named preset; `delay` is the pause between dependent probes
pub fn preset(name: &str, delay: Duration) -> Option<Vec<StepSpec>> {
    let steps = match name {
        "switch-device" => vec![switch_device()],
        "change-location" => vec![change_location()],
        "increase-amount" => vec![increase_amount()],
        "escalation" => vec![
            StepSpec::probe("baseline", Vec::new()).then_wait(delay),
            change_location().then_wait(delay),
            increase_amount().then_wait(delay),
            switch_device(),
        ],
        _ => return None,
    };
    Some(steps)
}

pub fn switch_device() -> StepSpec {
    StepSpec::probe("switch-device", vec![ProbeMutation::RandomDeviceId])
}

pub fn change_location() -> StepSpec {
    StepSpec::probe("change-location", vec![ProbeMutation::RandomLocation])
}

pub fn increase_amount() -> StepSpec {
    StepSpec::probe(
        "increase-amount",
        vec![ProbeMutation::ScaleAmount { factor: 10.0, default: DEFAULT_BASE_AMOUNT }],
    )
}
