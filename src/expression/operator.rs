//! Operator definitions for expressions.
//!
//! Every operator carries a stable one-byte wire tag; the numbering must not
//! change once released.

/// Arithmetic operators
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArithmeticOperator {
    Add = 1,
    Sub = 2,
    Mul = 3,
    Div = 4,
    Mod = 5,
}

impl ArithmeticOperator {
    pub const ALL: [Self; 5] = [Self::Add, Self::Sub, Self::Mul, Self::Div, Self::Mod];

    pub fn from_u8(tag: u8) -> Option<Self> {
        match tag {
            1 => Some(Self::Add),
            2 => Some(Self::Sub),
            3 => Some(Self::Mul),
            4 => Some(Self::Div),
            5 => Some(Self::Mod),
            _ => None,
        }
    }

    /// Get the display string for this operator
    pub fn as_str(&self) -> &'static str {
        match self {
            ArithmeticOperator::Add => "+",
            ArithmeticOperator::Sub => "-",
            ArithmeticOperator::Mul => "*",
            ArithmeticOperator::Div => "/",
            ArithmeticOperator::Mod => "%",
        }
    }
}

/// Comparison operators
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationalOperator {
    Eq = 1,
    Ne = 2,
    Lt = 3,
    Le = 4,
    Gt = 5,
    Ge = 6,
    In = 7,
}

impl RelationalOperator {
    pub const ALL: [Self; 7] = [
        Self::Eq,
        Self::Ne,
        Self::Lt,
        Self::Le,
        Self::Gt,
        Self::Ge,
        Self::In,
    ];

    pub fn from_u8(tag: u8) -> Option<Self> {
        match tag {
            1 => Some(Self::Eq),
            2 => Some(Self::Ne),
            3 => Some(Self::Lt),
            4 => Some(Self::Le),
            5 => Some(Self::Gt),
            6 => Some(Self::Ge),
            7 => Some(Self::In),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RelationalOperator::Eq => "==",
            RelationalOperator::Ne => "!=",
            RelationalOperator::Lt => "<",
            RelationalOperator::Le => "<=",
            RelationalOperator::Gt => ">",
            RelationalOperator::Ge => ">=",
            RelationalOperator::In => " IN ",
        }
    }
}

/// N-ary logical operators
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalOperator {
    And = 1,
    Or = 2,
    Xor = 3,
}

impl LogicalOperator {
    pub const ALL: [Self; 3] = [Self::And, Self::Or, Self::Xor];

    pub fn from_u8(tag: u8) -> Option<Self> {
        match tag {
            1 => Some(Self::And),
            2 => Some(Self::Or),
            3 => Some(Self::Xor),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LogicalOperator::And => "AND",
            LogicalOperator::Or => "OR",
            LogicalOperator::Xor => "XOR",
        }
    }
}

/// Unary operators
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOperator {
    Not = 1,
    Plus = 2,
    Minus = 3,
    IsNull = 4,
    IsNotNull = 5,
    IsEmpty = 6,
    IsNotEmpty = 7,
}

impl UnaryOperator {
    pub const ALL: [Self; 7] = [
        Self::Not,
        Self::Plus,
        Self::Minus,
        Self::IsNull,
        Self::IsNotNull,
        Self::IsEmpty,
        Self::IsNotEmpty,
    ];

    pub fn from_u8(tag: u8) -> Option<Self> {
        match tag {
            1 => Some(Self::Not),
            2 => Some(Self::Plus),
            3 => Some(Self::Minus),
            4 => Some(Self::IsNull),
            5 => Some(Self::IsNotNull),
            6 => Some(Self::IsEmpty),
            7 => Some(Self::IsNotEmpty),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UnaryOperator::Not => "!",
            UnaryOperator::Plus => "+",
            UnaryOperator::Minus => "-",
            UnaryOperator::IsNull => "IS NULL",
            UnaryOperator::IsNotNull => "IS NOT NULL",
            UnaryOperator::IsEmpty => "IS EMPTY",
            UnaryOperator::IsNotEmpty => "IS NOT EMPTY",
        }
    }

    /// Whether the operator is written after its operand
    pub fn is_postfix(&self) -> bool {
        matches!(
            self,
            UnaryOperator::IsNull
                | UnaryOperator::IsNotNull
                | UnaryOperator::IsEmpty
                | UnaryOperator::IsNotEmpty
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_tags() {
        for op in ArithmeticOperator::ALL {
            assert_eq!(ArithmeticOperator::from_u8(op as u8), Some(op));
        }
        for op in RelationalOperator::ALL {
            assert_eq!(RelationalOperator::from_u8(op as u8), Some(op));
        }
        for op in LogicalOperator::ALL {
            assert_eq!(LogicalOperator::from_u8(op as u8), Some(op));
        }
        for op in UnaryOperator::ALL {
            assert_eq!(UnaryOperator::from_u8(op as u8), Some(op));
        }
        assert_eq!(RelationalOperator::from_u8(7), Some(RelationalOperator::In));
        assert_eq!(UnaryOperator::from_u8(6), Some(UnaryOperator::IsEmpty));

        assert_eq!(ArithmeticOperator::from_u8(0), None);
        assert_eq!(ArithmeticOperator::from_u8(6), None);
        assert_eq!(RelationalOperator::from_u8(8), None);
        assert_eq!(LogicalOperator::from_u8(4), None);
        assert_eq!(UnaryOperator::from_u8(8), None);
    }

    #[test]
    fn test_operator_display() {
        assert_eq!(ArithmeticOperator::Mod.as_str(), "%");
        assert_eq!(RelationalOperator::Eq.as_str(), "==");
        assert_eq!(LogicalOperator::And.as_str(), "AND");
        assert_eq!(UnaryOperator::IsNotNull.as_str(), "IS NOT NULL");

        assert!(UnaryOperator::IsEmpty.is_postfix());
        assert!(!UnaryOperator::Minus.is_postfix());
    }
}
