pub mod blog_post;
pub mod certificate;
pub mod coding_profile;
pub mod contact_message;
pub mod hackathon;
pub mod profile;
pub mod project;
pub mod record;
pub mod token;
pub mod user;
pub mod validation;
