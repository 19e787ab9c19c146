//! Binary operator kinds.
//!
//! The variant order is load-bearing: the AST printer indexes a parallel
//! token table by `op as usize`, so new operators must be appended and the
//! table updated in lock-step.

/// Binary operator.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
#[repr(u8)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
    IDiv,
    Mod,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    AndAlso,
    OrElse,
    And,
    Or,
}

impl BinaryOp {
    /// Surface tokens, indexed by operator ordinal.
    pub const TOKENS: [&'static str; 17] = [
        "+", "-", "*", "/", "^", "\\", "MOD", "=", "<>", "<", "<=", ">", ">=", "ANDALSO", "ORELSE",
        "AND", "OR",
    ];

    /// The BASIC surface token for this operator.
    #[inline]
    pub const fn token(self) -> &'static str {
        Self::TOKENS[self as usize]
    }

    /// Whether this operator compares its operands.
    #[inline]
    pub const fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge
        )
    }

    /// Whether this operator is a logical connective (eager or short-circuit).
    #[inline]
    pub const fn is_logical(self) -> bool {
        matches!(
            self,
            BinaryOp::And | BinaryOp::Or | BinaryOp::AndAlso | BinaryOp::OrElse
        )
    }

    /// Whether this operator short-circuits its right-hand operand.
    #[inline]
    pub const fn is_short_circuit(self) -> bool {
        matches!(self, BinaryOp::AndAlso | BinaryOp::OrElse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_table_tracks_enum_order() {
        assert_eq!(BinaryOp::Add.token(), "+");
        assert_eq!(BinaryOp::Pow.token(), "^");
        assert_eq!(BinaryOp::IDiv.token(), "\\");
        assert_eq!(BinaryOp::Mod.token(), "MOD");
        assert_eq!(BinaryOp::Ne.token(), "<>");
        assert_eq!(BinaryOp::AndAlso.token(), "ANDALSO");
        assert_eq!(BinaryOp::Or.token(), "OR");
    }
}
