//! Opcode numbering.

use std::fmt;

/// Numeric opcode of an instruction, as written to the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Opcode {
    PushNil = 1,
    PushTrue = 2,
    PushFalse = 3,
    PushInt = 4,
    PushString = 5,
    PushSymbol = 6,
    PushSelf = 7,
    CreateArray = 8,
    CreateHash = 9,
    VariableGet = 10,
    VariableSet = 11,
    InstanceVariableGet = 12,
    InstanceVariableSet = 13,
    GlobalVariableGet = 14,
    GlobalVariableSet = 15,
    Dup = 16,
    Pop = 17,
    // 18 and 19 are unassigned.
    ArrayShift = 20,
    ArrayPop = 21,
    ArrayIsEmpty = 22,
    ToArray = 23,
    StageKeywordHash = 24,
    HashHasKey = 25,
    HashDelete = 26,
    CheckExtraKeywords = 27,
    PushArgc = 28,
    Send = 29,
    If = 30,
    Else = 31,
    End = 32,
}

impl Opcode {
    pub const ALL: [Opcode; 30] = [
        Opcode::PushNil,
        Opcode::PushTrue,
        Opcode::PushFalse,
        Opcode::PushInt,
        Opcode::PushString,
        Opcode::PushSymbol,
        Opcode::PushSelf,
        Opcode::CreateArray,
        Opcode::CreateHash,
        Opcode::VariableGet,
        Opcode::VariableSet,
        Opcode::InstanceVariableGet,
        Opcode::InstanceVariableSet,
        Opcode::GlobalVariableGet,
        Opcode::GlobalVariableSet,
        Opcode::Dup,
        Opcode::Pop,
        Opcode::ArrayShift,
        Opcode::ArrayPop,
        Opcode::ArrayIsEmpty,
        Opcode::ToArray,
        Opcode::StageKeywordHash,
        Opcode::HashHasKey,
        Opcode::HashDelete,
        Opcode::CheckExtraKeywords,
        Opcode::PushArgc,
        Opcode::Send,
        Opcode::If,
        Opcode::Else,
        Opcode::End,
    ];

    #[inline]
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn from_u8(byte: u8) -> Option<Opcode> {
        Some(match byte {
            1 => Opcode::PushNil,
            2 => Opcode::PushTrue,
            3 => Opcode::PushFalse,
            4 => Opcode::PushInt,
            5 => Opcode::PushString,
            6 => Opcode::PushSymbol,
            7 => Opcode::PushSelf,
            8 => Opcode::CreateArray,
            9 => Opcode::CreateHash,
            10 => Opcode::VariableGet,
            11 => Opcode::VariableSet,
            12 => Opcode::InstanceVariableGet,
            13 => Opcode::InstanceVariableSet,
            14 => Opcode::GlobalVariableGet,
            15 => Opcode::GlobalVariableSet,
            16 => Opcode::Dup,
            17 => Opcode::Pop,
            20 => Opcode::ArrayShift,
            21 => Opcode::ArrayPop,
            22 => Opcode::ArrayIsEmpty,
            23 => Opcode::ToArray,
            24 => Opcode::StageKeywordHash,
            25 => Opcode::HashHasKey,
            26 => Opcode::HashDelete,
            27 => Opcode::CheckExtraKeywords,
            28 => Opcode::PushArgc,
            29 => Opcode::Send,
            30 => Opcode::If,
            31 => Opcode::Else,
            32 => Opcode::End,
            _ => return None,
        })
    }

    /// The disassembly mnemonic.
    pub fn mnemonic(self) -> &'static str {
        match self {
            Opcode::PushNil => "push_nil",
            Opcode::PushTrue => "push_true",
            Opcode::PushFalse => "push_false",
            Opcode::PushInt => "push_int",
            Opcode::PushString => "push_string",
            Opcode::PushSymbol => "push_symbol",
            Opcode::PushSelf => "push_self",
            Opcode::CreateArray => "create_array",
            Opcode::CreateHash => "create_hash",
            Opcode::VariableGet => "variable_get",
            Opcode::VariableSet => "variable_set",
            Opcode::InstanceVariableGet => "instance_variable_get",
            Opcode::InstanceVariableSet => "instance_variable_set",
            Opcode::GlobalVariableGet => "global_variable_get",
            Opcode::GlobalVariableSet => "global_variable_set",
            Opcode::Dup => "dup",
            Opcode::Pop => "pop",
            Opcode::ArrayShift => "array_shift",
            Opcode::ArrayPop => "array_pop",
            Opcode::ArrayIsEmpty => "array_is_empty",
            Opcode::ToArray => "to_array",
            Opcode::StageKeywordHash => "stage_keyword_hash",
            Opcode::HashHasKey => "hash_has_key",
            Opcode::HashDelete => "hash_delete",
            Opcode::CheckExtraKeywords => "check_extra_keywords",
            Opcode::PushArgc => "push_argc",
            Opcode::Send => "send",
            Opcode::If => "if",
            Opcode::Else => "else",
            Opcode::End => "end",
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_u8_inverts_as_u8() {
        for op in Opcode::ALL {
            assert_eq!(Opcode::from_u8(op.as_u8()), Some(op));
        }
    }

    #[test]
    fn test_unassigned_numbers() {
        assert_eq!(Opcode::from_u8(0), None);
        assert_eq!(Opcode::from_u8(18), None);
        assert_eq!(Opcode::from_u8(19), None);
        assert_eq!(Opcode::from_u8(33), None);
    }

    #[test]
    fn test_numbers_are_stable() {
        // Cached entries depend on these exact values.
        assert_eq!(Opcode::ArrayShift.as_u8(), 20);
        assert_eq!(Opcode::StageKeywordHash.as_u8(), 24);
        assert_eq!(Opcode::Send.as_u8(), 29);
        assert_eq!(Opcode::End.as_u8(), 32);
    }
}
