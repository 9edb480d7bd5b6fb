use core_model::{RuntimeError, RuntimeResult, ScenarioConfig, ScriptLocation};
use core_script::Instruction;
use std::collections::BTreeMap;

/// Read-only access to the compiled bytecode archive.
///
/// The archive decoder is a collaborator; the core only ever navigates
/// locations and asks for the instruction at one.
pub trait Scriptor {
    /// Location at `offset` within a scenario.
    fn load(&self, scenario: i32, offset: usize) -> RuntimeResult<ScriptLocation>;
    /// Location of a scenario's beginning.
    fn load_begin(&self, scenario: i32) -> RuntimeResult<ScriptLocation>;
    /// Location of a named entry point within a scenario.
    fn load_entry(&self, scenario: i32, entry: i32) -> RuntimeResult<ScriptLocation>;

    fn has_next(&self, location: ScriptLocation) -> bool;
    fn next(&self, location: ScriptLocation) -> RuntimeResult<ScriptLocation>;
    fn resolve_instruction(&self, location: ScriptLocation) -> RuntimeResult<Instruction>;

    fn scenario_config(&self, scenario: i32) -> ScenarioConfig;
}

/// An in-memory scriptor: scenarios are instruction vectors, offsets are
/// indices. The test and tooling backend.
#[derive(Default)]
pub struct MemoryScriptor {
    scenarios: BTreeMap<i32, Scenario>,
}

struct Scenario {
    instructions: Vec<Instruction>,
    entry_points: BTreeMap<i32, usize>,
    config: ScenarioConfig,
}

impl MemoryScriptor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_scenario(&mut self, number: i32, instructions: Vec<Instruction>) -> &mut Self {
        self.add_scenario_with_config(number, instructions, ScenarioConfig::default())
    }

    pub fn add_scenario_with_config(
        &mut self,
        number: i32,
        instructions: Vec<Instruction>,
        config: ScenarioConfig,
    ) -> &mut Self {
        self.scenarios.insert(
            number,
            Scenario {
                instructions,
                entry_points: BTreeMap::new(),
                config,
            },
        );
        self
    }

    pub fn add_entry_point(&mut self, scenario: i32, entry: i32, offset: usize) -> &mut Self {
        if let Some(s) = self.scenarios.get_mut(&scenario) {
            s.entry_points.insert(entry, offset);
        }
        self
    }

    fn scenario(&self, number: i32) -> RuntimeResult<&Scenario> {
        self.scenarios.get(&number).ok_or_else(|| {
            RuntimeError::BadFormat(format!("unknown scenario {number}"))
        })
    }
}

impl Scriptor for MemoryScriptor {
    fn load(&self, scenario: i32, offset: usize) -> RuntimeResult<ScriptLocation> {
        let s = self.scenario(scenario)?;
        if offset >= s.instructions.len() {
            return Err(RuntimeError::BadFormat(format!(
                "offset {offset} outside scenario {scenario}"
            )));
        }
        Ok(ScriptLocation::new(scenario, offset))
    }

    fn load_begin(&self, scenario: i32) -> RuntimeResult<ScriptLocation> {
        self.load(scenario, 0)
    }

    fn load_entry(&self, scenario: i32, entry: i32) -> RuntimeResult<ScriptLocation> {
        let s = self.scenario(scenario)?;
        let offset = *s.entry_points.get(&entry).ok_or_else(|| {
            RuntimeError::BadFormat(format!("unknown entry {entry} in scenario {scenario}"))
        })?;
        Ok(ScriptLocation::new(scenario, offset))
    }

    fn has_next(&self, location: ScriptLocation) -> bool {
        self.scenario(location.scenario)
            .map(|s| location.offset < s.instructions.len())
            .unwrap_or(false)
    }

    fn next(&self, location: ScriptLocation) -> RuntimeResult<ScriptLocation> {
        Ok(ScriptLocation::new(location.scenario, location.offset + 1))
    }

    fn resolve_instruction(&self, location: ScriptLocation) -> RuntimeResult<Instruction> {
        let s = self.scenario(location.scenario)?;
        s.instructions
            .get(location.offset)
            .cloned()
            .ok_or_else(|| {
                RuntimeError::BadFormat(format!(
                    "no instruction at {}:{}",
                    location.scenario, location.offset
                ))
            })
    }

    fn scenario_config(&self, scenario: i32) -> ScenarioConfig {
        self.scenarios
            .get(&scenario)
            .map(|s| s.config)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn navigation_walks_instruction_indices() {
        let mut scriptor = MemoryScriptor::new();
        scriptor.add_scenario(0, vec![Instruction::Line(1), Instruction::End]);

        let start = scriptor.load_begin(0).unwrap();
        assert_eq!(
            scriptor.resolve_instruction(start).unwrap(),
            Instruction::Line(1)
        );
        let next = scriptor.next(start).unwrap();
        assert!(scriptor.has_next(next));
        assert_eq!(scriptor.resolve_instruction(next).unwrap(), Instruction::End);
        let past = scriptor.next(next).unwrap();
        assert!(!scriptor.has_next(past));
    }

    #[test]
    fn entry_points_resolve_to_offsets() {
        let mut scriptor = MemoryScriptor::new();
        scriptor.add_scenario(5, vec![Instruction::Line(1), Instruction::Line(2)]);
        scriptor.add_entry_point(5, 1, 1);
        let loc = scriptor.load_entry(5, 1).unwrap();
        assert_eq!(loc, ScriptLocation::new(5, 1));
        assert!(scriptor.load_entry(5, 9).is_err());
    }
}
