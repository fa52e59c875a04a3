pub mod allowed_member;
pub mod gallery_item;
pub mod member;
pub mod session_token;
pub mod sponsor;
pub mod sub_team;
pub mod team;
pub mod video;
