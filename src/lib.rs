pub mod bindings;
pub mod error;
pub mod infer;
pub mod kb;
pub mod metrics;
pub mod statement;
pub mod symbol;
pub mod trace;
pub mod unify;

#[cfg(test)]
pub(crate) mod test_utils;
