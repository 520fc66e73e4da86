pub mod company;
pub mod location;
pub mod post;
pub mod preferences;
pub mod user;
pub mod user_company;

pub use company::{Company, CompanyMembership, NewCompany};
pub use location::{City, Country};
pub use post::{NewPost, Post, PostChanges};
pub use preferences::{PreferencesPatch, UserPreferences};
pub use user::{NewUser, User};
pub use user_company::{Role, UserCompany};
