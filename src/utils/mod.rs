pub mod attachments;
pub mod auth;
pub mod logging;
#[cfg(test)]
pub mod test_utils;
pub mod url;
