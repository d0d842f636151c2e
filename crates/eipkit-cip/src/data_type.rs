//! Tag data type words.
//!
//! A symbol's type word packs three things: bit 15 marks a structure, bits
//! 13-14 hold the array dimension count, and the low 12 bits the elementary
//! type (or the structure template handle).

use std::fmt;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TypeCode(pub u16);

impl TypeCode {
    pub const NULL: TypeCode = TypeCode(0x00);
    pub const BOOL: TypeCode = TypeCode(0xC1);
    pub const SINT: TypeCode = TypeCode(0xC2);
    pub const INT: TypeCode = TypeCode(0xC3);
    pub const DINT: TypeCode = TypeCode(0xC4);
    pub const LINT: TypeCode = TypeCode(0xC5);
    pub const USINT: TypeCode = TypeCode(0xC6);
    pub const UINT: TypeCode = TypeCode(0xC7);
    pub const UDINT: TypeCode = TypeCode(0xC8);
    pub const ULINT: TypeCode = TypeCode(0xC9);
    pub const REAL: TypeCode = TypeCode(0xCA);
    pub const LREAL: TypeCode = TypeCode(0xCB);
    pub const STIME: TypeCode = TypeCode(0xCC);
    pub const DATE: TypeCode = TypeCode(0xCD);
    pub const TIME_OF_DAY: TypeCode = TypeCode(0xCE);
    pub const DATE_AND_TIME: TypeCode = TypeCode(0xCF);
    pub const STRING: TypeCode = TypeCode(0xD0);
    pub const BYTE: TypeCode = TypeCode(0xD1);
    pub const WORD: TypeCode = TypeCode(0xD2);
    pub const DWORD: TypeCode = TypeCode(0xD3);
    pub const LWORD: TypeCode = TypeCode(0xD4);
    pub const STRING2: TypeCode = TypeCode(0xD5);
    pub const FTIME: TypeCode = TypeCode(0xD6);
    pub const LTIME: TypeCode = TypeCode(0xD7);
    pub const ITIME: TypeCode = TypeCode(0xD8);
    pub const STRINGN: TypeCode = TypeCode(0xD9);
    pub const SHORT_STRING: TypeCode = TypeCode(0xDA);
    pub const TIME: TypeCode = TypeCode(0xDB);
    pub const EPATH: TypeCode = TypeCode(0xDC);
    pub const ENGUNIT: TypeCode = TypeCode(0xDD);
    pub const STRINGI: TypeCode = TypeCode(0xDE);

    /// Type word that prefixes structured read replies, followed by the
    /// structure handle.
    pub const STRUCT_MARKER: u16 = 0x02A0;

    const STRUCT_BIT: u16 = 0x8000;
    const DIMS_MASK: u16 = 0x6000;
    const BASE_MASK: u16 = 0x0FFF;

    pub fn is_struct(self) -> bool {
        self.0 & Self::STRUCT_BIT != 0
    }

    /// Array dimension count, 0-3.
    pub fn dims(self) -> u8 {
        ((self.0 & Self::DIMS_MASK) >> 13) as u8
    }

    /// The elementary type (or template handle) without the flag bits.
    pub fn base(self) -> TypeCode {
        TypeCode(self.0 & Self::BASE_MASK)
    }

    /// Name of the elementary type, `None` for template handles and
    /// unrecognized codes.
    pub fn name(self) -> Option<&'static str> {
        let name = match self.base() {
            TypeCode::NULL => "NULL",
            TypeCode::BOOL => "BOOL",
            TypeCode::SINT => "SINT",
            TypeCode::INT => "INT",
            TypeCode::DINT => "DINT",
            TypeCode::LINT => "LINT",
            TypeCode::USINT => "USINT",
            TypeCode::UINT => "UINT",
            TypeCode::UDINT => "UDINT",
            TypeCode::ULINT => "ULINT",
            TypeCode::REAL => "REAL",
            TypeCode::LREAL => "LREAL",
            TypeCode::STIME => "STIME",
            TypeCode::DATE => "DATE",
            TypeCode::TIME_OF_DAY => "TOD",
            TypeCode::DATE_AND_TIME => "DT",
            TypeCode::STRING => "STRING",
            TypeCode::BYTE => "BYTE",
            TypeCode::WORD => "WORD",
            TypeCode::DWORD => "DWORD",
            TypeCode::LWORD => "LWORD",
            TypeCode::STRING2 => "STR2",
            TypeCode::FTIME => "FTIME",
            TypeCode::LTIME => "LTIME",
            TypeCode::ITIME => "ITIME",
            TypeCode::STRINGN => "STRN",
            TypeCode::SHORT_STRING => "SSTR",
            TypeCode::TIME => "TIME",
            TypeCode::EPATH => "EPATH",
            TypeCode::ENGUNIT => "ENGU",
            TypeCode::STRINGI => "STRI",
            _ => return None,
        };
        Some(name)
    }

    /// One-line summary, e.g. `0x00c4(  DINT) | atomic | 0 dims`.
    pub fn describe(self) -> String {
        format!(
            "{:#06x}({:>6}) | {} | {} dims",
            self.0,
            self.name().unwrap_or(""),
            if self.is_struct() { "struct" } else { "atomic" },
            self.dims()
        )
    }
}

impl From<u16> for TypeCode {
    fn from(code: u16) -> Self {
        TypeCode(code)
    }
}

impl fmt::Debug for TypeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) if !self.is_struct() => write!(f, "{name}({:#06x})", self.0),
            _ => write!(f, "TypeCode({:#06x})", self.0),
        }
    }
}
