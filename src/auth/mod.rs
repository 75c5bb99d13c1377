pub mod jwt;

#[cfg(test)]
pub use jwt::create_access_token;
pub use jwt::verify_jwt;
