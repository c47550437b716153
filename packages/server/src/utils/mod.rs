pub mod ban;
pub mod hash;
pub mod jwt;
pub mod rate_limit;
pub mod slug;
pub mod upload;
