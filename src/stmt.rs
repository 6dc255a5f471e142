use crate::expr::{Expr, VariableData};
use crate::token::Token;

/// A statement node.
///
/// `for` loops never appear here: the parser desugars them into a block
/// holding the initializer and a `while` loop.
#[derive(Debug, PartialEq, Clone)]
pub enum Stmt {
    Expression(ExpressionData),
    Print(PrintData),
    Var(VarData),
    Block(BlockData),
    If(IfData),
    While(WhileData),
    Function(FunctionData),
    Return(ReturnData),
    Class(ClassData),
}

#[derive(Debug, PartialEq, Clone)]
pub struct ExpressionData {
    pub expr: Expr,
}

#[derive(Debug, PartialEq, Clone)]
pub struct PrintData {
    pub expr: Expr,
}

#[derive(Debug, PartialEq, Clone)]
pub struct VarData {
    pub name: Token,
    pub initializer: Option<Expr>,
}

#[derive(Debug, PartialEq, Clone)]
pub struct BlockData {
    pub statements: Vec<Stmt>,
}

#[derive(Debug, PartialEq, Clone)]
pub struct IfData {
    pub condition: Expr,
    pub then_branch: Box<Stmt>,
    pub else_branch: Option<Box<Stmt>>,
}

#[derive(Debug, PartialEq, Clone)]
pub struct WhileData {
    pub condition: Expr,
    pub body: Box<Stmt>,
}

/// A function declaration. Also the shape of a method inside a class body.
#[derive(Debug, PartialEq, Clone)]
pub struct FunctionData {
    pub name: Token,
    pub params: Vec<Token>,
    pub body: Vec<Stmt>,
}

#[derive(Debug, PartialEq, Clone)]
pub struct ReturnData {
    pub keyword: Token,
    pub value: Option<Expr>,
}

#[derive(Debug, PartialEq, Clone)]
pub struct ClassData {
    pub name: Token,
    /// The superclass reference after `<`, looked up as an ordinary variable.
    pub superclass: Option<VariableData>,
    pub methods: Vec<FunctionData>,
}
