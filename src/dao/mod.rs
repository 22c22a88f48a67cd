pub mod backend;
#[cfg(test)]
pub mod fake;
pub mod services;
