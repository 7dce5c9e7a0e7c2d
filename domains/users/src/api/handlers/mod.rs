pub mod admin;
pub mod tokens;
pub mod users;

#[cfg(test)]
pub(crate) mod test_support;
