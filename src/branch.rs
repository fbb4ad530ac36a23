//! Types for representing branches and branch outcomes.

use thiserror::Error;

/// A branch outcome.
#[repr(u32)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Outcome {
    /// Not taken
    N = 0,
    /// Taken
    T = 1
}

impl Outcome {
    pub fn from_bool(b: bool) -> Self {
        match b {
            true => Self::T,
            false => Self::N,
        }
    }

    pub fn is_taken(self) -> bool {
        matches!(self, Self::T)
    }
}

impl std::fmt::Debug for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let s = match self {
            Self::T => "t",
            Self::N => "n",
        };
        write!(f, "{}", s)
    }
}

impl std::ops::Not for Outcome {
    type Output = Self;
    fn not(self) -> Self {
        match self {
            Self::N => Self::T,
            Self::T => Self::N,
        }
    }
}

impl From<bool> for Outcome {
    fn from(x: bool) -> Self {
        Self::from_bool(x)
    }
}
impl From<Outcome> for bool {
    fn from(x: Outcome) -> Self {
        x.is_taken()
    }
}

/// Returned when a set of [`BranchFlags`] doesn't name a known [`BranchKind`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[error("invalid branch flags ({0:#07b})")]
pub struct InvalidBranchFlags(pub u32);

/// Representing different kinds of branch/control-flow instructions.
///
/// The direction predictor accepts this from the host but doesn't use it.
#[repr(u32)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum BranchKind {
    /// A direct conditional branch instruction.
    DirectBranch = BranchFlags::BRN_FLAG,

    /// A direct unconditional jump instruction.
    DirectJump   = BranchFlags::JMP_FLAG,

    /// An indirect unconditional jump instruction.
    IndirectJump = BranchFlags::JMP_FLAG | BranchFlags::IND_FLAG,

    /// A direct procedure call instruction.
    DirectCall   = BranchFlags::CALL_FLAG,

    /// An indirect procedure call instruction.
    IndirectCall = BranchFlags::CALL_FLAG | BranchFlags::IND_FLAG,

    /// A return instruction.
    Return       = BranchFlags::RET_FLAG | BranchFlags::IND_FLAG,
}
impl BranchKind {
    const DIRECT_BRANCH: u32 = BranchFlags::BRN_FLAG;
    const DIRECT_JUMP: u32 = BranchFlags::JMP_FLAG;
    const DIRECT_CALL: u32 = BranchFlags::CALL_FLAG;
    const INDIRECT_CALL: u32 = BranchFlags::CALL_FLAG | BranchFlags::IND_FLAG;
    const INDIRECT_JUMP: u32 = BranchFlags::JMP_FLAG | BranchFlags::IND_FLAG;
    const RETURN: u32 = BranchFlags::RET_FLAG | BranchFlags::IND_FLAG;

    /// Returns 'true' for conditional branches.
    pub fn is_conditional(self) -> bool {
        matches!(self, Self::DirectBranch)
    }
}
impl TryFrom<u32> for BranchKind {
    type Error = InvalidBranchFlags;
    fn try_from(x: u32) -> Result<Self, Self::Error> {
        match x & BranchFlags::KIND_MASK {
            Self::DIRECT_BRANCH => Ok(Self::DirectBranch),
            Self::DIRECT_JUMP   => Ok(Self::DirectJump),
            Self::DIRECT_CALL   => Ok(Self::DirectCall),
            Self::INDIRECT_JUMP => Ok(Self::IndirectJump),
            Self::INDIRECT_CALL => Ok(Self::IndirectCall),
            Self::RETURN        => Ok(Self::Return),
            bits => Err(InvalidBranchFlags(bits)),
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct BranchFlags(pub u32);
impl BranchFlags {
    const BRN_FLAG: u32   = 1 << 0;
    const JMP_FLAG: u32   = 1 << 1;
    const CALL_FLAG: u32  = 1 << 2;
    const RET_FLAG: u32   = 1 << 3;
    const IND_FLAG: u32   = 1 << 4;
    const TAKEN_FLAG: u32 = 1 << 5;

    const KIND_MASK: u32  = 0b01_1111;

    pub fn is_brn(&self) -> bool { self.0 & Self::BRN_FLAG != 0 }
    pub fn is_indirect(&self) -> bool { self.0 & Self::IND_FLAG != 0 }
    pub fn is_taken(&self) -> bool { self.0 & Self::TAKEN_FLAG != 0 }

    pub fn kind(&self) -> Result<BranchKind, InvalidBranchFlags> {
        BranchKind::try_from(self.0)
    }

    pub fn new(kind: BranchKind, outcome: Outcome) -> Self {
        let tbits = if outcome.is_taken() { Self::TAKEN_FLAG } else { 0 };
        Self(kind as u32 | tbits)
    }
}


/// A record of branch execution.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct BranchRecord {
    /// The program counter value for this branch
    pub pc: u64,

    /// The target address evaluated for this branch
    pub tgt: u64,

    /// The type/kind of branch
    pub kind: BranchKind,

    /// The outcome evaluated for this branch
    pub outcome: Outcome,
}
impl BranchRecord {
    pub fn new(pc: u64, tgt: u64, flags: BranchFlags)
        -> Result<Self, InvalidBranchFlags>
    {
        Ok(Self {
            pc,
            tgt,
            kind: flags.kind()?,
            outcome: Outcome::from_bool(flags.is_taken()),
        })
    }

    /// Returns 'true' if this is a conditional instruction.
    pub fn is_conditional(&self) -> bool {
        self.kind.is_conditional()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn flags_roundtrip_kind_and_outcome() {
        let flags = BranchFlags::new(BranchKind::IndirectCall, Outcome::T);
        assert!(flags.is_taken());
        assert!(flags.is_indirect());
        assert!(!flags.is_brn());
        assert_eq!(flags.kind(), Ok(BranchKind::IndirectCall));

        let rec = BranchRecord::new(0x1000, 0x2000, flags).unwrap();
        assert_eq!(rec.outcome, Outcome::T);
        assert!(!rec.is_conditional());
    }

    #[test]
    fn unknown_flags_are_rejected() {
        // Both 'branch' and 'jump' set
        let flags = BranchFlags(0b00_0011);
        assert_eq!(flags.kind(), Err(InvalidBranchFlags(0b00_0011)));
    }

    #[test]
    fn outcome_conversions() {
        assert_eq!(Outcome::from(true), Outcome::T);
        assert!(!bool::from(Outcome::N));
        assert_eq!(!Outcome::N, Outcome::T);
    }
}
