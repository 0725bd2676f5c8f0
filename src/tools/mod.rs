pub mod core;
pub mod impls;

#[cfg(test)]
pub(crate) mod tests;
