mod arith;
mod conv;
