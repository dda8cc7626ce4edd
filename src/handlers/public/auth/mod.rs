// Token acquisition and password recovery.
pub mod forget_password;
pub mod login;
pub mod recover;

pub use forget_password::forget_password_post;
pub use login::login_post;
pub use recover::recover_post;
