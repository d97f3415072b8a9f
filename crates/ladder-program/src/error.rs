use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ProgramError {
    #[error(transparent)]
    Instr(#[from] ladder_instr::InstrError),
    #[error("unknown subroutine {0:?}")]
    UnknownSubroutine(String),
    #[error("duplicate subroutine name {0:?}")]
    DuplicateSubroutine(String),
    #[error("subroutines may not call other subroutines (found in {0:?})")]
    NestedSubroutineCall(String),
    #[error("for-loops may not be nested")]
    NestedForLoop,
    #[error("strict mode forbids host control flow inside a rung: {0}")]
    BuildGuard(String),
}
