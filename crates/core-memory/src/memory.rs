use crate::bank::MemoryBank;
use crate::location::{IntBank, IntMemoryLocation, StrBank, StrMemoryLocation};
use core_model::RuntimeResult;
use serde::{Deserialize, Serialize};

/// Default cell count of every regular bank.
pub const INT_BANK_SIZE: usize = 2000;
pub const STR_BANK_SIZE: usize = 2000;
/// Per-frame stack bank sizes (parameter passing storage).
pub const INT_L_SIZE: usize = 40;
pub const STR_K_SIZE: usize = 3;

/// Initial sizes and seed values, fed from the configuration collaborator.
#[derive(Debug, Clone)]
pub struct MemoryConfig {
    pub int_bank_size: usize,
    pub str_bank_size: usize,
    /// (bank, index, value) seeds applied after allocation.
    pub int_seeds: Vec<(IntBank, usize, i32)>,
    pub str_seeds: Vec<(StrBank, usize, String)>,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            int_bank_size: INT_BANK_SIZE,
            str_bank_size: STR_BANK_SIZE,
            int_seeds: Vec::new(),
            str_seeds: Vec::new(),
        }
    }
}

/// Globally persistent banks. These survive `Reset` and are written to the
/// per-game global file, never to individual save slots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalMemory {
    pub int_g: MemoryBank<i32>,
    pub int_z: MemoryBank<i32>,
    pub str_m: MemoryBank<String>,
    pub global_names: Vec<String>,
}

impl GlobalMemory {
    pub fn with_size(ints: usize, strs: usize) -> Self {
        Self {
            int_g: MemoryBank::new("intG", ints),
            int_z: MemoryBank::new("intZ", ints),
            str_m: MemoryBank::new("strM", strs),
            global_names: Vec::new(),
        }
    }
}

impl Default for GlobalMemory {
    fn default() -> Self {
        Self::with_size(INT_BANK_SIZE, STR_BANK_SIZE)
    }
}

/// Scenario-local banks, captured by save slots and cleared by
/// `LocalReset`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalMemory {
    pub int_a: MemoryBank<i32>,
    pub int_b: MemoryBank<i32>,
    pub int_c: MemoryBank<i32>,
    pub int_d: MemoryBank<i32>,
    pub int_e: MemoryBank<i32>,
    pub int_f: MemoryBank<i32>,
    pub str_s: MemoryBank<String>,
    pub local_names: Vec<String>,
}

impl LocalMemory {
    pub fn with_size(ints: usize, strs: usize) -> Self {
        Self {
            int_a: MemoryBank::new("intA", ints),
            int_b: MemoryBank::new("intB", ints),
            int_c: MemoryBank::new("intC", ints),
            int_d: MemoryBank::new("intD", ints),
            int_e: MemoryBank::new("intE", ints),
            int_f: MemoryBank::new("intF", ints),
            str_s: MemoryBank::new("strS", strs),
            local_names: Vec::new(),
        }
    }
}

impl Default for LocalMemory {
    fn default() -> Self {
        Self::with_size(INT_BANK_SIZE, STR_BANK_SIZE)
    }
}

/// The machine's regular memory: global and local partitions.
///
/// The stack banks (`intL`/`strK`) are *not* stored here; they live in call
/// frames and are reached through a [`MemoryAccess`] implementation that
/// also knows the call stack. `Memory` itself implements the non-stack
/// subset directly.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Memory {
    global: GlobalMemory,
    local: LocalMemory,
}

impl Memory {
    pub fn new(config: &MemoryConfig) -> Self {
        let mut memory = Self {
            global: GlobalMemory::with_size(config.int_bank_size, config.str_bank_size),
            local: LocalMemory::with_size(config.int_bank_size, config.str_bank_size),
        };
        memory.load_from(config);
        memory
    }

    /// Apply seed values from the configuration collaborator.
    pub fn load_from(&mut self, config: &MemoryConfig) {
        for &(bank, index, value) in &config.int_seeds {
            if let Some(cells) = self.int_bank_mut(bank) {
                let _ = cells.set(index, value);
            }
        }
        for (bank, index, value) in &config.str_seeds {
            if let Some(cells) = self.str_bank_mut(*bank) {
                let _ = cells.set(*index, value.clone());
            }
        }
    }

    pub fn global(&self) -> &GlobalMemory {
        &self.global
    }

    pub fn global_mut(&mut self) -> &mut GlobalMemory {
        &mut self.global
    }

    pub fn local(&self) -> &LocalMemory {
        &self.local
    }

    pub fn local_mut(&mut self) -> &mut LocalMemory {
        &mut self.local
    }

    /// Swap in a whole global subtree (global-file load).
    pub fn partial_reset_global(&mut self, global: GlobalMemory) {
        self.global = global;
    }

    /// Swap in a whole local subtree (slot load / `LocalReset`).
    pub fn partial_reset_local(&mut self, local: LocalMemory) {
        self.local = local;
    }

    pub fn partial_reset_names(&mut self, local_names: Vec<String>, global_names: Vec<String>) {
        self.local.local_names = local_names;
        self.global.global_names = global_names;
    }

    pub fn int_bank(&self, bank: IntBank) -> Option<&MemoryBank<i32>> {
        match bank {
            IntBank::A => Some(&self.local.int_a),
            IntBank::B => Some(&self.local.int_b),
            IntBank::C => Some(&self.local.int_c),
            IntBank::D => Some(&self.local.int_d),
            IntBank::E => Some(&self.local.int_e),
            IntBank::F => Some(&self.local.int_f),
            IntBank::G => Some(&self.global.int_g),
            IntBank::Z => Some(&self.global.int_z),
            IntBank::L => None,
        }
    }

    pub fn int_bank_mut(&mut self, bank: IntBank) -> Option<&mut MemoryBank<i32>> {
        match bank {
            IntBank::A => Some(&mut self.local.int_a),
            IntBank::B => Some(&mut self.local.int_b),
            IntBank::C => Some(&mut self.local.int_c),
            IntBank::D => Some(&mut self.local.int_d),
            IntBank::E => Some(&mut self.local.int_e),
            IntBank::F => Some(&mut self.local.int_f),
            IntBank::G => Some(&mut self.global.int_g),
            IntBank::Z => Some(&mut self.global.int_z),
            IntBank::L => None,
        }
    }

    pub fn str_bank(&self, bank: StrBank) -> Option<&MemoryBank<String>> {
        match bank {
            StrBank::S => Some(&self.local.str_s),
            StrBank::M => Some(&self.global.str_m),
            StrBank::K => None,
        }
    }

    pub fn str_bank_mut(&mut self, bank: StrBank) -> Option<&mut MemoryBank<String>> {
        match bank {
            StrBank::S => Some(&mut self.local.str_s),
            StrBank::M => Some(&mut self.global.str_m),
            StrBank::K => None,
        }
    }
}

/// Uniform access to every addressable cell the expression engine can
/// reach: regular banks, the stack banks, and the store register.
///
/// The machine supplies the canonical implementation that routes `intL` and
/// `strK` to the topmost real call frame. A routing-free implementation
/// over bare [`Memory`] exists for tests and for contexts with no stack
/// (stack reads yield the neutral value; stack writes fail with
/// `NoStackFrame`).
pub trait MemoryAccess {
    fn read_int(&self, loc: IntMemoryLocation) -> RuntimeResult<i32>;
    fn write_int(&mut self, loc: IntMemoryLocation, value: i32) -> RuntimeResult<()>;
    fn read_str(&self, loc: StrMemoryLocation) -> RuntimeResult<String>;
    fn write_str(&mut self, loc: StrMemoryLocation, value: String) -> RuntimeResult<()>;
    fn store_register(&self) -> i32;
    fn set_store_register(&mut self, value: i32);
}

/// Frameless access over bare memory. Stack banks read as neutral values
/// and refuse writes; the store register is a scratch cell.
pub struct FramelessMemory<'a> {
    pub memory: &'a mut Memory,
    pub store_register: i32,
}

impl MemoryAccess for FramelessMemory<'_> {
    fn read_int(&self, loc: IntMemoryLocation) -> RuntimeResult<i32> {
        match self.memory.int_bank(loc.bank) {
            Some(bank) => bank.get_bits(loc.bitwidth, loc.index),
            None => Ok(0),
        }
    }

    fn write_int(&mut self, loc: IntMemoryLocation, value: i32) -> RuntimeResult<()> {
        match self.memory.int_bank_mut(loc.bank) {
            Some(bank) => bank.set_bits(loc.bitwidth, loc.index, value),
            None => Err(core_model::RuntimeError::NoStackFrame),
        }
    }

    fn read_str(&self, loc: StrMemoryLocation) -> RuntimeResult<String> {
        match self.memory.str_bank(loc.bank) {
            Some(bank) => bank.get(loc.index).cloned(),
            None => Ok(String::new()),
        }
    }

    fn write_str(&mut self, loc: StrMemoryLocation, value: String) -> RuntimeResult<()> {
        match self.memory.str_bank_mut(loc.bank) {
            Some(bank) => bank.set(loc.index, value),
            None => Err(core_model::RuntimeError::NoStackFrame),
        }
    }

    fn store_register(&self) -> i32 {
        self.store_register
    }

    fn set_store_register(&mut self, value: i32) {
        self.store_register = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_banks_survive_local_reset() {
        let mut memory = Memory::default();
        memory
            .int_bank_mut(IntBank::G)
            .unwrap()
            .set(0, 42)
            .unwrap();
        memory
            .int_bank_mut(IntBank::A)
            .unwrap()
            .set(0, 7)
            .unwrap();

        memory.partial_reset_local(LocalMemory::default());

        assert_eq!(memory.int_bank(IntBank::G).unwrap().get(0).unwrap(), &42);
        assert_eq!(memory.int_bank(IntBank::A).unwrap().get(0).unwrap(), &0);
    }

    #[test]
    fn wraparound_write_reads_back_wrapped() {
        // i32::MAX + 3 computed in u64 wraps to i32::MIN + 2.
        let mut memory = Memory::default();
        let wrapped = ((i32::MAX as u64 + 3) & 0xFFFF_FFFF) as u32 as i32;
        memory
            .int_bank_mut(IntBank::B)
            .unwrap()
            .set(5, wrapped)
            .unwrap();
        assert_eq!(
            memory.int_bank(IntBank::B).unwrap().get(5).unwrap(),
            &(i32::MIN + 2)
        );
    }

    #[test]
    fn frameless_stack_banks_are_empty_readable() {
        let mut memory = Memory::default();
        let mut access = FramelessMemory {
            memory: &mut memory,
            store_register: 0,
        };
        assert_eq!(
            access
                .read_int(IntMemoryLocation::full(IntBank::L, 0))
                .unwrap(),
            0
        );
        assert_eq!(
            access
                .read_str(StrMemoryLocation::new(StrBank::K, 0))
                .unwrap(),
            ""
        );
        assert!(matches!(
            access.write_int(IntMemoryLocation::full(IntBank::L, 0), 1),
            Err(core_model::RuntimeError::NoStackFrame)
        ));
    }

    #[test]
    fn seeds_apply_on_construction() {
        let config = MemoryConfig {
            int_seeds: vec![(IntBank::A, 3, 99)],
            str_seeds: vec![(StrBank::S, 1, "name".into())],
            ..MemoryConfig::default()
        };
        let memory = Memory::new(&config);
        assert_eq!(memory.int_bank(IntBank::A).unwrap().get(3).unwrap(), &99);
        assert_eq!(memory.str_bank(StrBank::S).unwrap().get(1).unwrap(), "name");
    }
}
