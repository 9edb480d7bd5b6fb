//! Typed memory banks for the scripting runtime.
//!
//! Memory is a set of fixed-size banks, partitioned three ways:
//!
//! * *Global* banks (`intG`, `intZ`, `strM`, global names) survive a reset
//!   and persist outside of save slots.
//! * *Local* banks (`intA`..`intF`, `strS`, local names) belong to the
//!   running scenario and are captured by save slots.
//! * *Stack* banks (`intL`, `strK`) are virtual: accesses route to the
//!   topmost real call frame's per-frame storage, so recursion sees fresh
//!   cells. Routing lives behind [`MemoryAccess`]; this crate only defines
//!   the per-frame storage shape.
//!
//! Integer banks expose logical bit-width views (1/2/4/8/16/32) over the
//! same underlying 32-bit cells; writes at one width are visible at every
//! overlapping width.

mod bank;
mod kidoku;
mod location;
mod memory;

pub use bank::MemoryBank;
pub use kidoku::KidokuTable;
pub use location::{bank_code_is_string, IntBank, IntMemoryLocation, StrBank, StrMemoryLocation};
pub use memory::{
    FramelessMemory, GlobalMemory, LocalMemory, Memory, MemoryAccess, MemoryConfig,
    INT_BANK_SIZE, INT_L_SIZE, STR_BANK_SIZE, STR_K_SIZE,
};
