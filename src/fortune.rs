//! Main module for fortune library functionality

pub mod ast;
pub mod compiler;
pub mod config;
pub mod expression;
pub mod formats;
pub mod lexer;
pub mod parser;
pub mod processor;
pub mod testing;
pub mod view;
