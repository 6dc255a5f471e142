use crate::literal::Literal;
use crate::token::Token;

/// A stable identity for an expression node, assigned by the parser from a
/// monotonic counter.
///
/// The resolver records lookup depths keyed by id, and the interpreter reads
/// them back, so two textually identical references to the same variable
/// still resolve independently.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub struct ExprId(pub u32);

/// An expression node.
#[derive(Debug, PartialEq, Clone)]
pub enum Expr {
    Literal(Literal),
    Grouping(GroupingData),
    Unary(UnaryData),
    Binary(BinaryData),
    Logical(LogicalData),
    Variable(VariableData),
    Assign(AssignData),
    Call(CallData),
    Get(GetData),
    Set(SetData),
    This(ThisData),
    Super(SuperData),
}

#[derive(Debug, PartialEq, Clone)]
pub struct GroupingData {
    pub expr: Box<Expr>,
}

#[derive(Debug, PartialEq, Clone)]
pub struct UnaryData {
    pub operator: Token,
    pub expr: Box<Expr>,
}

#[derive(Debug, PartialEq, Clone)]
pub struct BinaryData {
    pub left: Box<Expr>,
    pub operator: Token,
    pub right: Box<Expr>,
}

/// A short-circuiting `and`/`or`.
#[derive(Debug, PartialEq, Clone)]
pub struct LogicalData {
    pub left: Box<Expr>,
    pub operator: Token,
    pub right: Box<Expr>,
}

#[derive(Debug, PartialEq, Clone)]
pub struct VariableData {
    pub id: ExprId,
    pub name: Token,
}

#[derive(Debug, PartialEq, Clone)]
pub struct AssignData {
    pub id: ExprId,
    pub name: Token,
    pub value: Box<Expr>,
}

#[derive(Debug, PartialEq, Clone)]
pub struct CallData {
    pub callee: Box<Expr>,
    /// The closing parenthesis, kept for runtime error locations.
    pub paren: Token,
    pub arguments: Vec<Expr>,
}

/// A property read, `object.name`.
#[derive(Debug, PartialEq, Clone)]
pub struct GetData {
    pub object: Box<Expr>,
    pub name: Token,
}

/// A property write, `object.name = value`.
#[derive(Debug, PartialEq, Clone)]
pub struct SetData {
    pub object: Box<Expr>,
    pub name: Token,
    pub value: Box<Expr>,
}

#[derive(Debug, PartialEq, Clone)]
pub struct ThisData {
    pub id: ExprId,
    pub keyword: Token,
}

#[derive(Debug, PartialEq, Clone)]
pub struct SuperData {
    pub id: ExprId,
    pub keyword: Token,
    pub method: Token,
}
