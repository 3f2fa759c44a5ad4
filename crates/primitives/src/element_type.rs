use thiserror::Error;

/// The scalar element type of a dataspace. See `spec.md` §6 "Type map".
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum ElementType {
    I8,
    I16,
    I32,
    I64,
    F32,
    F64,
}

#[derive(Error, Debug, PartialEq, Eq)]
#[error("unknown element type code `{0}`")]
pub struct UnknownElementType(pub i32);

impl ElementType {
    /// Size in bytes of one element, per `spec.md` §6.
    pub const fn size_of(self) -> usize {
        match self {
            ElementType::I8 => 1,
            ElementType::I16 => 2,
            ElementType::I32 => 4,
            ElementType::I64 => 8,
            ElementType::F32 => 4,
            ElementType::F64 => 8,
        }
    }

    pub const fn code(self) -> i32 {
        match self {
            ElementType::I8 => 0,
            ElementType::I16 => 1,
            ElementType::I32 => 2,
            ElementType::I64 => 3,
            ElementType::F32 => 4,
            ElementType::F64 => 5,
        }
    }

    pub const fn from_code(code: i32) -> Result<Self, UnknownElementType> {
        match code {
            0 => Ok(ElementType::I8),
            1 => Ok(ElementType::I16),
            2 => Ok(ElementType::I32),
            3 => Ok(ElementType::I64),
            4 => Ok(ElementType::F32),
            5 => Ok(ElementType::F64),
            other => Err(UnknownElementType(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_of_matches_type_map() {
        assert_eq!(ElementType::I8.size_of(), 1);
        assert_eq!(ElementType::I16.size_of(), 2);
        assert_eq!(ElementType::I32.size_of(), 4);
        assert_eq!(ElementType::I64.size_of(), 8);
        assert_eq!(ElementType::F32.size_of(), 4);
        assert_eq!(ElementType::F64.size_of(), 8);
    }

    #[test]
    fn code_round_trips() {
        for t in [
            ElementType::I8,
            ElementType::I16,
            ElementType::I32,
            ElementType::I64,
            ElementType::F32,
            ElementType::F64,
        ] {
            assert_eq!(ElementType::from_code(t.code()).unwrap(), t);
        }
    }

    #[test]
    fn unknown_code_errors() {
        assert_eq!(ElementType::from_code(99), Err(UnknownElementType(99)));
    }
}
