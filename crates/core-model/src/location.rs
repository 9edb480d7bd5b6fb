use serde::{Deserialize, Serialize};

/// A position inside the bytecode archive: (scenario, byte offset).
///
/// Equality is structural; two locations are the same instruction if and
/// only if both fields match. Offsets are opaque to the core — only the
/// scriptor collaborator can interpret or advance them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ScriptLocation {
    pub scenario: i32,
    pub offset: usize,
}

impl ScriptLocation {
    pub fn new(scenario: i32, offset: usize) -> Self {
        Self { scenario, offset }
    }
}

/// Text encoding tag for scenarios compiled with an alternate codepage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TextEncoding {
    /// CP932 (the default for scenarios without an encoding tag).
    #[default]
    Cp932,
    /// CP936 mapped into the CP932 codespace.
    Cp936,
    /// CP1252 mapped into the CP932 codespace.
    Cp1252,
    /// CP949 mapped into the CP932 codespace.
    Cp949,
}

impl TextEncoding {
    pub fn from_tag(tag: i32) -> Self {
        match tag {
            1 => TextEncoding::Cp936,
            2 => TextEncoding::Cp1252,
            3 => TextEncoding::Cp949,
            _ => TextEncoding::Cp932,
        }
    }

    pub fn tag(self) -> i32 {
        match self {
            TextEncoding::Cp932 => 0,
            TextEncoding::Cp936 => 1,
            TextEncoding::Cp1252 => 2,
            TextEncoding::Cp949 => 3,
        }
    }
}

/// Per-scenario flags read from the archive header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScenarioConfig {
    pub text_encoding: TextEncoding,
    pub enable_message_savepoint: bool,
    pub enable_selcom_savepoint: bool,
    pub enable_seentop_savepoint: bool,
}
