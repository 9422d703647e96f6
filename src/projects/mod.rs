pub mod models;
#[cfg(test)]
mod tests;
