pub mod users;
pub mod roles;
pub mod permissions;
pub mod sidebars;
pub mod posts;
pub mod jobs;
pub mod lookup;
