pub mod artifact;
pub mod backends;
pub mod inference;
pub mod model_utils;

#[cfg(test)]
pub(crate) mod testing;
