//! A doubly-linked node chain with cursor-style iteration, and an infix expression
//! interpreter that parses text into evaluable expression trees.

pub mod chain;
pub mod interpreter;
