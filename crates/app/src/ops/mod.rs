pub mod init;
pub mod key;
pub mod ls;
pub mod revoke;
pub mod rm;
pub mod share;
pub mod upload;
pub mod version;
pub mod view;

pub use init::Init;
pub use key::Key;
pub use ls::Ls;
pub use revoke::Revoke;
pub use rm::Rm;
pub use share::Share;
pub use upload::Upload;
pub use version::Version;
pub use view::View;
