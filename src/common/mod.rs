pub mod errors;
pub mod models;

#[cfg(test)]
pub mod test_helpers;
