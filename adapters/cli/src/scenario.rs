use std::{fs, path::Path};

use anyhow::{bail, Context, Result};
use log::warn;
use serde::Deserialize;

use laser_tank_core::Direction;
use laser_tank_session::{MoveOutcome, Session};

/// Largest number of shots a single scenario step may request.
const MAX_SHOTS_PER_STEP: u32 = 64;

/// Queued plan described by a TOML scenario file.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct Scenario {
    /// Executes the plan on the master board once it is projected.
    #[serde(default)]
    pub(crate) commit: bool,
    /// Moves queued in order.
    #[serde(default, rename = "step")]
    pub(crate) steps: Vec<ScenarioStep>,
}

/// One queued move and the shots fired after it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct ScenarioStep {
    pub(crate) direction: Direction,
    #[serde(default)]
    pub(crate) shots: u32,
}

impl Scenario {
    /// Reads and parses a scenario file.
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read scenario at {}", path.display()))?;
        Self::from_toml(&contents)
            .with_context(|| format!("invalid scenario in {}", path.display()))
    }

    pub(crate) fn from_toml(contents: &str) -> Result<Self> {
        let scenario: Self =
            toml::from_str(contents).context("failed to parse scenario toml contents")?;
        for (index, step) in scenario.steps.iter().enumerate() {
            if step.shots > MAX_SHOTS_PER_STEP {
                bail!(
                    "step {} requests {} shots; at most {} are allowed",
                    index + 1,
                    step.shots,
                    MAX_SHOTS_PER_STEP
                );
            }
        }
        Ok(scenario)
    }

    /// Queues every step on the session, skipping moves that are blocked.
    ///
    /// Returns the number of steps that were queued.
    pub(crate) fn queue(&self, session: &mut Session) -> usize {
        let mut queued = 0;
        for (index, step) in self.steps.iter().enumerate() {
            if session.queue_move(step.direction) == MoveOutcome::Blocked {
                warn!(
                    "scenario step {} ({:?}) is blocked; skipping it",
                    index + 1,
                    step.direction
                );
                continue;
            }
            queued += 1;
            if step.shots > 0 {
                let _ = session.set_queued_shots(session.plan_len() - 1, step.shots);
            }
        }
        queued
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use laser_tank_world::parse;

    #[test]
    fn parses_steps_in_order() {
        let scenario = Scenario::from_toml(
            r#"
commit = true

[[step]]
direction = "right"
shots = 2

[[step]]
direction = "down"
"#,
        )
        .expect("scenario parses");

        assert!(scenario.commit);
        assert_eq!(
            scenario.steps,
            vec![
                ScenarioStep {
                    direction: Direction::Right,
                    shots: 2
                },
                ScenarioStep {
                    direction: Direction::Down,
                    shots: 0
                },
            ]
        );
    }

    #[test]
    fn empty_scenario_is_valid() {
        assert_eq!(Scenario::from_toml("").expect("parses"), Scenario::default());
    }

    #[test]
    fn rejects_unknown_directions_and_fields() {
        assert!(Scenario::from_toml("[[step]]\ndirection = \"north\"\n").is_err());
        assert!(Scenario::from_toml("[[step]]\ndirection = \"up\"\nspeed = 2\n").is_err());
    }

    #[test]
    fn rejects_excessive_shot_counts() {
        let error = Scenario::from_toml("[[step]]\ndirection = \"up\"\nshots = 1000\n")
            .expect_err("too many shots");
        assert!(error.to_string().contains("1000"), "{error}");
    }

    #[test]
    fn blocked_steps_are_skipped() {
        let mut session = Session::new(parse("T>S\n..\n").expect("layout parses"));
        let scenario = Scenario::from_toml(
            "[[step]]\ndirection = \"right\"\nshots = 1\n\n[[step]]\ndirection = \"down\"\n",
        )
        .expect("scenario parses");

        assert_eq!(scenario.queue(&mut session), 1);
        assert_eq!(session.plan_len(), 1);
    }
}
