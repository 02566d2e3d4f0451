pub mod cat;
pub mod cp;
pub mod info;
pub mod init;
pub mod ls;
pub mod mkdir;
pub mod mv;
pub mod put;
pub mod rm;
pub mod sign;
pub mod touch;
pub mod version;

pub use cat::Cat;
pub use cp::Cp;
pub use info::Info;
pub use init::Init;
pub use ls::Ls;
pub use mkdir::Mkdir;
pub use mv::Mv;
pub use put::Put;
pub use rm::Rm;
pub use sign::Sign;
pub use touch::Touch;
pub use version::Version;
